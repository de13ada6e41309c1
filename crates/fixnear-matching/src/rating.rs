//! Full recomputation of an artisan's rating aggregate from its reviews.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use fixnear_core::{ArtisanId, RatingAggregate, ReviewRecord};

use crate::directory::{ArtisanDirectory, CandidateHint, ReviewStore};
use crate::MatchError;

/// Mean rating and count over `reviews`; zero and zero for no reviews.
#[must_use]
pub fn aggregate(reviews: &[ReviewRecord]) -> RatingAggregate {
    if reviews.is_empty() {
        return RatingAggregate::EMPTY;
    }
    let sum: u64 = reviews.iter().map(|r| u64::from(r.rating.value())).sum();
    let count = reviews.len();
    #[allow(clippy::cast_precision_loss)]
    let average_rating = sum as f64 / count as f64;
    RatingAggregate {
        average_rating,
        review_count: u32::try_from(count).unwrap_or(u32::MAX),
    }
}

/// Recomputes and writes back rating aggregates.
///
/// Recomputations for the same artisan are serialized within this process,
/// so the stored count always matches the sample the stored average came
/// from. Across processes the directory's `write_aggregate` contract keeps
/// an older sample from overwriting a newer one.
pub struct RatingAggregator {
    directory: Arc<dyn ArtisanDirectory>,
    reviews: Arc<dyn ReviewStore>,
    locks: Mutex<HashMap<ArtisanId, Arc<tokio::sync::Mutex<()>>>>,
}

impl std::fmt::Debug for RatingAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingAggregator").finish_non_exhaustive()
    }
}

impl RatingAggregator {
    #[must_use]
    pub fn new(directory: Arc<dyn ArtisanDirectory>, reviews: Arc<dyn ReviewStore>) -> Self {
        Self {
            directory,
            reviews,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Recompute `artisan_id`'s aggregate from every stored review and write
    /// it back.
    ///
    /// # Errors
    ///
    /// [`MatchError::ArtisanNotFound`] if the artisan is gone,
    /// [`MatchError::ReviewStoreUnavailable`] or
    /// [`MatchError::DirectoryUnavailable`] on backend failure.
    pub async fn recompute(&self, artisan_id: ArtisanId) -> Result<RatingAggregate, MatchError> {
        let lock = self.lock_for(artisan_id);
        let result = {
            let _guard = lock.lock().await;
            self.recompute_locked(artisan_id).await
        };
        self.release(artisan_id, &lock);

        let aggregate = result?;
        tracing::info!(
            artisan_id = %artisan_id,
            average_rating = aggregate.average_rating,
            review_count = aggregate.review_count,
            "rating recomputed"
        );
        Ok(aggregate)
    }

    /// Recompute every artisan in the directory, in directory order.
    ///
    /// # Errors
    ///
    /// Stops at the first failure.
    pub async fn recompute_all(&self) -> Result<Vec<(ArtisanId, RatingAggregate)>, MatchError> {
        let artisans = self
            .directory
            .list_candidates(&CandidateHint::default())
            .await
            .map_err(MatchError::DirectoryUnavailable)?;

        let mut out = Vec::with_capacity(artisans.len());
        for artisan in artisans {
            let aggregate = self.recompute(artisan.id).await?;
            out.push((artisan.id, aggregate));
        }
        Ok(out)
    }

    async fn recompute_locked(&self, artisan_id: ArtisanId) -> Result<RatingAggregate, MatchError> {
        let reviews = self.reviews.list_reviews(artisan_id).await?;
        let aggregate = aggregate(&reviews);
        self.directory.write_aggregate(artisan_id, aggregate).await?;
        Ok(aggregate)
    }

    fn lock_for(&self, artisan_id: ArtisanId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(artisan_id).or_default())
    }

    /// Drop the per-artisan lock once nobody else holds or waits on it.
    fn release(&self, artisan_id: ArtisanId, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held by the caller.
        if Arc::strong_count(lock) <= 2 {
            locks.remove(&artisan_id);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use fixnear_core::{ArtisanRecord, Rating, ReviewId};
    use uuid::Uuid;

    use super::*;
    use crate::directory::{DirectoryError, ReviewStoreError};
    use crate::memory::{InMemoryDirectory, InMemoryReviewStore};
    use crate::test_support::artisan_at;

    struct UnreachableReviews;

    #[async_trait]
    impl ReviewStore for UnreachableReviews {
        async fn list_reviews(
            &self,
            _artisan_id: ArtisanId,
        ) -> Result<Vec<ReviewRecord>, ReviewStoreError> {
            Err(ReviewStoreError::backend(std::io::Error::other("down")))
        }
    }

    /// Directory whose aggregate writes always fail at the backend.
    #[derive(Default)]
    struct BrokenWrites {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ArtisanDirectory for BrokenWrites {
        async fn list_candidates(
            &self,
            _hint: &CandidateHint,
        ) -> Result<Vec<ArtisanRecord>, DirectoryError> {
            Ok(Vec::new())
        }

        async fn write_aggregate(
            &self,
            _id: ArtisanId,
            _aggregate: RatingAggregate,
        ) -> Result<(), DirectoryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(DirectoryError::backend(std::io::Error::other(
                "connection reset",
            )))
        }
    }

    fn review(artisan_id: ArtisanId, stars: i64) -> ReviewRecord {
        ReviewRecord {
            id: ReviewId::new(),
            artisan_id,
            user_id: Uuid::new_v4(),
            rating: Rating::try_new(stars).unwrap(),
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn aggregate_of_five_three_four_is_four() {
        let id = ArtisanId::new();
        let agg = aggregate(&[review(id, 5), review(id, 3), review(id, 4)]);
        assert!((agg.average_rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(agg.review_count, 3);
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        assert_eq!(aggregate(&[]), RatingAggregate::EMPTY);
    }

    #[tokio::test]
    async fn recompute_writes_back_and_releases_lock() {
        let a = artisan_at(6.5, 3.4);
        let id = a.id;
        let directory = Arc::new(InMemoryDirectory::with_artisans([a]));
        let reviews = Arc::new(InMemoryReviewStore::new());
        reviews.insert(review(id, 5));
        reviews.insert(review(id, 2));

        let aggregator = RatingAggregator::new(directory.clone(), reviews);
        let agg = aggregator.recompute(id).await.unwrap();
        assert!((agg.average_rating - 3.5).abs() < f64::EPSILON);

        let stored = directory.get(id).unwrap();
        assert!((stored.rating - 3.5).abs() < f64::EPSILON);
        assert_eq!(stored.review_count, 2);
        assert_eq!(aggregator.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn recompute_unknown_artisan_is_not_found() {
        let aggregator = RatingAggregator::new(
            Arc::new(InMemoryDirectory::new()),
            Arc::new(InMemoryReviewStore::new()),
        );
        let id = ArtisanId::new();
        let err = aggregator.recompute(id).await.unwrap_err();
        assert!(matches!(err, MatchError::ArtisanNotFound(found) if found == id));
        assert_eq!(aggregator.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn review_store_failure_propagates_without_writing() {
        let a = artisan_at(6.5, 3.4);
        let id = a.id;
        let directory = Arc::new(InMemoryDirectory::with_artisans([a]));
        let before = directory.get(id).unwrap();

        let aggregator = RatingAggregator::new(directory.clone(), Arc::new(UnreachableReviews));
        let err = aggregator.recompute(id).await.unwrap_err();
        assert!(matches!(err, MatchError::ReviewStoreUnavailable(_)), "got {err:?}");

        let after = directory.get(id).unwrap();
        assert_eq!(after.review_count, before.review_count);
        assert!((after.rating - before.rating).abs() < f64::EPSILON);
        assert_eq!(aggregator.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn aggregate_write_failure_is_directory_unavailable() {
        let id = ArtisanId::new();
        let directory = Arc::new(BrokenWrites::default());
        let reviews = Arc::new(InMemoryReviewStore::new());
        reviews.insert(review(id, 4));

        let aggregator = RatingAggregator::new(directory.clone(), reviews);
        let err = aggregator.recompute(id).await.unwrap_err();
        assert!(matches!(err, MatchError::DirectoryUnavailable(_)), "got {err:?}");
        assert!(!matches!(err, MatchError::ArtisanNotFound(_)));
        assert_eq!(directory.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(aggregator.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn concurrent_recomputes_converge() {
        let a = artisan_at(6.5, 3.4);
        let id = a.id;
        let directory = Arc::new(InMemoryDirectory::with_artisans([a]));
        let reviews = Arc::new(InMemoryReviewStore::new());
        let aggregator = Arc::new(RatingAggregator::new(directory.clone(), reviews.clone()));

        let mut handles = Vec::new();
        for stars in [1, 2, 3, 4, 5, 5, 4, 3] {
            let reviews = reviews.clone();
            let aggregator = aggregator.clone();
            handles.push(tokio::spawn(async move {
                reviews.insert(review(id, stars));
                aggregator.recompute(id).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // A recompute after all inserts must see every review.
        let final_agg = aggregator.recompute(id).await.unwrap();
        let stored = directory.get(id).unwrap();
        assert_eq!(stored.review_count, 8);
        assert_eq!(final_agg.review_count, 8);
        assert!((stored.rating - 27.0 / 8.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn recompute_all_covers_every_artisan() {
        let a = artisan_at(6.5, 3.4);
        let b = artisan_at(6.6, 3.5);
        let (a_id, b_id) = (a.id, b.id);
        let directory = Arc::new(InMemoryDirectory::with_artisans([a, b]));
        let reviews = Arc::new(InMemoryReviewStore::new());
        reviews.insert(review(b_id, 4));

        let aggregator = RatingAggregator::new(directory, reviews);
        let all = aggregator.recompute_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], (a_id, RatingAggregate::EMPTY));
        assert_eq!(all[1].1.review_count, 1);
    }
}
