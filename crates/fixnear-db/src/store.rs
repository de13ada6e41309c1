//! Postgres implementations of the matching core's directory and review-store
//! ports.

use async_trait::async_trait;
use fixnear_core::{ArtisanId, ArtisanRecord, RatingAggregate, ReviewRecord};
use fixnear_matching::{
    ArtisanDirectory, CandidateHint, DirectoryError, ReviewStore, ReviewStoreError,
};
use sqlx::PgPool;

use crate::artisans::{list_artisans, write_rating_aggregate, AggregateWrite};
use crate::reviews::list_reviews_for_artisan;

#[derive(Debug, Clone)]
pub struct PgArtisanDirectory {
    pool: PgPool,
}

impl PgArtisanDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtisanDirectory for PgArtisanDirectory {
    async fn list_candidates(
        &self,
        hint: &CandidateHint,
    ) -> Result<Vec<ArtisanRecord>, DirectoryError> {
        let rows = list_artisans(&self.pool, hint)
            .await
            .map_err(DirectoryError::backend)?;
        rows.into_iter()
            .map(|row| row.into_record().map_err(DirectoryError::backend))
            .collect()
    }

    async fn write_aggregate(
        &self,
        id: ArtisanId,
        aggregate: RatingAggregate,
    ) -> Result<(), DirectoryError> {
        let outcome = write_rating_aggregate(&self.pool, id, aggregate)
            .await
            .map_err(DirectoryError::backend)?;
        match outcome {
            AggregateWrite::Written => Ok(()),
            AggregateWrite::Stale => {
                tracing::debug!(
                    artisan_id = %id,
                    review_count = aggregate.review_count,
                    "skipped stale rating aggregate"
                );
                Ok(())
            }
            AggregateWrite::Missing => Err(DirectoryError::NotFound(id)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_reviews(
        &self,
        artisan_id: ArtisanId,
    ) -> Result<Vec<ReviewRecord>, ReviewStoreError> {
        let rows = list_reviews_for_artisan(&self.pool, artisan_id)
            .await
            .map_err(ReviewStoreError::backend)?;
        rows.into_iter()
            .map(|row| row.into_record().map_err(ReviewStoreError::backend))
            .collect()
    }
}
