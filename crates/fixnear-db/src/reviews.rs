//! Database operations for the `reviews` table.

use chrono::{DateTime, Utc};
use fixnear_core::{ArtisanId, CoreError, Rating, ReviewId, ReviewRecord};
use sqlx::PgPool;
use uuid::Uuid;

/// Input record for inserting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub artisan_id: ArtisanId,
    pub user_id: Uuid,
    pub rating: Rating,
    pub comment: Option<String>,
}

/// A row from the `reviews` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub artisan_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewRow {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRating`] if the stored rating is out of range.
    pub fn into_record(self) -> Result<ReviewRecord, CoreError> {
        Ok(ReviewRecord {
            id: ReviewId::from_uuid(self.id),
            artisan_id: ArtisanId::from_uuid(self.artisan_id),
            user_id: self.user_id,
            rating: Rating::try_new(i64::from(self.rating))?,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

/// Insert a review. Aggregates are not touched here; callers recompute them
/// separately.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the insert fails, including a foreign-key
/// violation when the artisan does not exist.
pub async fn insert_review(pool: &PgPool, review: &NewReview) -> Result<ReviewRow, sqlx::Error> {
    let comment = review
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    sqlx::query_as::<_, ReviewRow>(
        "INSERT INTO reviews (id, artisan_id, user_id, rating, comment) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, artisan_id, user_id, rating, comment, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(review.artisan_id.as_uuid())
    .bind(review.user_id)
    .bind(i16::from(review.rating.value()))
    .bind(comment)
    .fetch_one(pool)
    .await
}

/// All reviews for an artisan, newest first.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_reviews_for_artisan(
    pool: &PgPool,
    artisan_id: ArtisanId,
) -> Result<Vec<ReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, ReviewRow>(
        "SELECT id, artisan_id, user_id, rating, comment, created_at \
         FROM reviews \
         WHERE artisan_id = $1 \
         ORDER BY created_at DESC, id",
    )
    .bind(artisan_id.as_uuid())
    .fetch_all(pool)
    .await
}
