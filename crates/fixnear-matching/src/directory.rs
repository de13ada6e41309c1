//! Ports the matching core consumes: the artisan directory and the review
//! store. Backends (Postgres, in-memory) implement these traits.

use async_trait::async_trait;
use fixnear_core::{
    ApprovalStatus, ArtisanId, ArtisanRecord, Coordinate, RatingAggregate, ReviewRecord, TradeType,
};
use thiserror::Error;

use crate::index::BoundingBox;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("artisan not found: {0}")]
    NotFound(ArtisanId),

    #[error("directory backend error: {0}")]
    Backend(#[source] BoxError),
}

impl DirectoryError {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }
}

#[derive(Debug, Error)]
pub enum ReviewStoreError {
    #[error("review store backend error: {0}")]
    Backend(#[source] BoxError),
}

impl ReviewStoreError {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }
}

/// Spatial part of a [`CandidateHint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHint {
    pub origin: Coordinate,
    pub radius_km: f64,
}

impl SpatialHint {
    /// Box a backend can use as a coarse prefilter. `None` means the cap
    /// touches a pole and only "has a location" can be pushed down.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::around(self.origin, self.radius_km)
    }
}

/// Optional narrowing a directory may apply when listing candidates.
///
/// A hint is advisory. Backends may return a superset; the matcher always
/// re-applies the filter and computes exact distances itself. A backend must
/// never return a subset of what the hint admits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateHint {
    pub status: Option<ApprovalStatus>,
    pub trade_type: Option<TradeType>,
    pub require_available: bool,
    pub exclude_suspended: bool,
    /// When set, only artisans with a location near the origin are wanted.
    pub within: Option<SpatialHint>,
}

impl CandidateHint {
    /// Attribute part of the hint (everything except `within`).
    #[must_use]
    pub fn admits(&self, artisan: &ArtisanRecord) -> bool {
        self.status.is_none_or(|s| artisan.approval_status == s)
            && self
                .trade_type
                .as_ref()
                .is_none_or(|t| artisan.trade_type == *t)
            && (!self.require_available || artisan.available)
            && (!self.exclude_suspended || !artisan.suspended)
            && (self.within.is_none() || artisan.location.is_some())
    }
}

#[async_trait]
pub trait ArtisanDirectory: Send + Sync {
    /// Snapshot of artisans that may satisfy `hint`, in stable directory order.
    async fn list_candidates(
        &self,
        hint: &CandidateHint,
    ) -> Result<Vec<ArtisanRecord>, DirectoryError>;

    /// Write `rating` and `review_count` together. Fails with
    /// [`DirectoryError::NotFound`] if the artisan no longer exists.
    ///
    /// The stored pair must never regress to an older review sample. An
    /// implementation shared between processes may discard a write whose
    /// `review_count` no longer matches the stored reviews and still return
    /// `Ok`, since the recompute that read the newer sample will write it.
    async fn write_aggregate(
        &self,
        id: ArtisanId,
        aggregate: RatingAggregate,
    ) -> Result<(), DirectoryError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_reviews(&self, artisan_id: ArtisanId)
        -> Result<Vec<ReviewRecord>, ReviewStoreError>;
}
