//! In-process directory and review store.
//!
//! The directory keeps a standing [`GeoIndex`] inside an immutable snapshot.
//! Readers clone the current `Arc<Snapshot>` and never block writers for
//! long; writers build a new snapshot aside and swap it in, so a reader sees
//! either the old or the new location of an artisan, never a mix.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use fixnear_core::{ArtisanId, ArtisanRecord, Coordinate, RatingAggregate, ReviewRecord};

use crate::directory::{
    ArtisanDirectory, CandidateHint, DirectoryError, ReviewStore, ReviewStoreError,
};
use crate::index::GeoIndex;

#[derive(Debug, Default)]
struct Snapshot {
    artisans: Vec<ArtisanRecord>,
    index: Arc<GeoIndex>,
    by_id: HashMap<ArtisanId, usize>,
}

impl Snapshot {
    fn build(artisans: Vec<ArtisanRecord>, index: Option<Arc<GeoIndex>>) -> Self {
        let index = index.unwrap_or_else(|| {
            Arc::new(GeoIndex::build(artisans.iter().map(|a| (a.id, a.location))))
        });
        let by_id = artisans
            .iter()
            .enumerate()
            .map(|(pos, a)| (a.id, pos))
            .collect();
        Self {
            artisans,
            index,
            by_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    current: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artisans<I>(artisans: I) -> Self
    where
        I: IntoIterator<Item = ArtisanRecord>,
    {
        let mut records: Vec<ArtisanRecord> = Vec::new();
        let mut seen: HashMap<ArtisanId, usize> = HashMap::new();
        for artisan in artisans {
            match seen.get(&artisan.id) {
                Some(&pos) => records[pos] = artisan,
                None => {
                    seen.insert(artisan.id, records.len());
                    records.push(artisan);
                }
            }
        }
        Self {
            current: RwLock::new(Arc::new(Snapshot::build(records, None))),
            writer: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().artisans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, id: ArtisanId) -> Option<ArtisanRecord> {
        let snap = self.snapshot();
        snap.by_id.get(&id).map(|&pos| snap.artisans[pos].clone())
    }

    /// Insert or replace by id. New artisans go to the end of directory order.
    pub fn upsert(&self, artisan: ArtisanRecord) {
        let outcome = self.publish(true, |artisans| {
            match artisans.iter_mut().find(|a| a.id == artisan.id) {
                Some(existing) => *existing = artisan,
                None => artisans.push(artisan),
            }
            Ok(())
        });
        debug_assert!(outcome.is_ok(), "upsert never misses");
    }

    /// Move an artisan (or clear its location) and republish the index.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] for an unknown id.
    pub fn update_location(
        &self,
        id: ArtisanId,
        location: Option<Coordinate>,
    ) -> Result<(), DirectoryError> {
        self.publish(true, |artisans| {
            find_mut(artisans, id)?.location = location;
            Ok(())
        })
    }

    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] for an unknown id.
    pub fn set_availability(&self, id: ArtisanId, available: bool) -> Result<(), DirectoryError> {
        self.publish(false, |artisans| {
            find_mut(artisans, id)?.available = available;
            Ok(())
        })
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copy, edit, and atomically swap the snapshot. Writers are serialized;
    /// readers only wait for the pointer swap. The index is rebuilt only when
    /// `relocates` is set.
    fn publish<F>(&self, relocates: bool, edit: F) -> Result<(), DirectoryError>
    where
        F: FnOnce(&mut Vec<ArtisanRecord>) -> Result<(), DirectoryError>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.snapshot();
        let mut artisans = base.artisans.clone();
        edit(&mut artisans)?;
        let index = (!relocates).then(|| Arc::clone(&base.index));
        let next = Arc::new(Snapshot::build(artisans, index));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
        Ok(())
    }
}

fn find_mut(
    artisans: &mut [ArtisanRecord],
    id: ArtisanId,
) -> Result<&mut ArtisanRecord, DirectoryError> {
    artisans
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or(DirectoryError::NotFound(id))
}

#[async_trait]
impl ArtisanDirectory for InMemoryDirectory {
    async fn list_candidates(
        &self,
        hint: &CandidateHint,
    ) -> Result<Vec<ArtisanRecord>, DirectoryError> {
        let snap = self.snapshot();
        let candidates = match hint.within {
            Some(within) => {
                let mut hits = snap.index.within_radius(within.origin, within.radius_km);
                hits.sort_unstable_by_key(|h| h.position);
                hits.into_iter()
                    .map(|h| &snap.artisans[h.position])
                    .filter(|a| hint.admits(a))
                    .cloned()
                    .collect()
            }
            None => snap
                .artisans
                .iter()
                .filter(|a| hint.admits(a))
                .cloned()
                .collect(),
        };
        Ok(candidates)
    }

    async fn write_aggregate(
        &self,
        id: ArtisanId,
        aggregate: RatingAggregate,
    ) -> Result<(), DirectoryError> {
        self.publish(false, |artisans| {
            let artisan = find_mut(artisans, id)?;
            artisan.rating = aggregate.average_rating;
            artisan.review_count = aggregate.review_count;
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    reviews: RwLock<Vec<ReviewRecord>>,
}

impl InMemoryReviewStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, review: ReviewRecord) {
        self.reviews
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(review);
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn list_reviews(
        &self,
        artisan_id: ArtisanId,
    ) -> Result<Vec<ReviewRecord>, ReviewStoreError> {
        Ok(self
            .reviews
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.artisan_id == artisan_id)
            .cloned()
            .collect())
    }
}
