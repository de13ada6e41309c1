//! Nearby and emergency search over the artisan directory.

use std::sync::Arc;

use fixnear_core::{ArtisanRecord, Distance};

use crate::directory::ArtisanDirectory;
use crate::filter::{Criterion, MatchFilter};
use crate::index::GeoIndex;
use crate::query::{
    AdminSearchRequest, EmergencyRequest, MatchPolicy, MatchQuery, NearbyRequest, SearchMode,
};
use crate::MatchError;

/// An eligible artisan with its distance from the query origin.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub artisan: ArtisanRecord,
    pub distance: Distance,
}

/// Admin listing: ranked by distance when an origin was given, otherwise in
/// directory order.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminListing {
    Ranked(Vec<MatchResult>),
    Unranked(Vec<ArtisanRecord>),
}

impl AdminListing {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Ranked(results) => results.len(),
            Self::Unranked(artisans) => artisans.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct ArtisanMatcher {
    directory: Arc<dyn ArtisanDirectory>,
    policy: MatchPolicy,
}

impl std::fmt::Debug for ArtisanMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtisanMatcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ArtisanMatcher {
    #[must_use]
    pub fn new(directory: Arc<dyn ArtisanDirectory>, policy: MatchPolicy) -> Self {
        Self { directory, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Every approved artisan within the radius (default from the policy),
    /// nearest first.
    ///
    /// # Errors
    ///
    /// Validation errors before the directory is read; otherwise
    /// [`MatchError::DirectoryUnavailable`].
    pub async fn find_nearby(
        &self,
        request: &NearbyRequest,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let query = self.policy.nearby_query(request)?;
        self.search(&query).await
    }

    /// At most `k` available, approved artisans within the emergency bound,
    /// nearest first.
    ///
    /// # Errors
    ///
    /// As [`ArtisanMatcher::find_nearby`].
    pub async fn find_nearest_k(
        &self,
        request: &EmergencyRequest,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let query = self.policy.emergency_query(request)?;
        self.search(&query).await
    }

    /// Admin search: any status unless one is named, suspended included.
    ///
    /// # Errors
    ///
    /// As [`ArtisanMatcher::find_nearby`].
    pub async fn find_for_admin(
        &self,
        request: &AdminSearchRequest,
    ) -> Result<AdminListing, MatchError> {
        if let Some(query) = self.policy.admin_query(request)? {
            return Ok(AdminListing::Ranked(self.search(&query).await?));
        }

        let hint = MatchPolicy::admin_listing_hint(request);
        let candidates = self
            .directory
            .list_candidates(&hint)
            .await
            .map_err(MatchError::DirectoryUnavailable)?;

        let mut filter = MatchFilter::new();
        if let Some(status) = request.status {
            filter = filter.with(Criterion::Status(status));
        }
        if let Some(trade) = &request.trade_type {
            filter = filter.with(Criterion::TradeType(trade.clone()));
        }
        let artisans: Vec<ArtisanRecord> = candidates
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();

        tracing::debug!(returned = artisans.len(), "admin listing completed");
        Ok(AdminListing::Unranked(artisans))
    }

    /// Run a validated query against a fresh directory snapshot.
    ///
    /// # Errors
    ///
    /// [`MatchError::DirectoryUnavailable`] if candidates cannot be read. No
    /// partial result is returned in that case.
    pub async fn search(&self, query: &MatchQuery) -> Result<Vec<MatchResult>, MatchError> {
        let candidates = self
            .directory
            .list_candidates(&query.hint())
            .await
            .map_err(MatchError::DirectoryUnavailable)?;
        let candidate_count = candidates.len();
        let results = rank(query, candidates);

        tracing::debug!(
            mode = ?query.mode(),
            origin = %query.origin(),
            candidates = candidate_count,
            returned = results.len(),
            "match query completed"
        );
        Ok(results)
    }
}

/// Filter, measure, sort, and (for nearest-K) truncate `candidates`.
///
/// Pure and deterministic: ties keep the order of `candidates`.
#[must_use]
pub fn rank(query: &MatchQuery, candidates: Vec<ArtisanRecord>) -> Vec<MatchResult> {
    let filter = MatchFilter::for_query(query);
    let eligible: Vec<ArtisanRecord> = candidates
        .into_iter()
        .filter(|a| filter.matches(a))
        .collect();

    let index = GeoIndex::build(eligible.iter().map(|a| (a.id, a.location)));
    let origin = query.origin();
    let hits = match query.mode() {
        SearchMode::Radius { radius_km } => {
            let mut hits = index.within_radius(origin, radius_km);
            hits.sort_by(|a, b| a.distance.meters().total_cmp(&b.distance.meters()));
            hits
        }
        SearchMode::NearestK { k, max_radius_km } => index.nearest_within(origin, max_radius_km, k),
    };

    let mut slots: Vec<Option<ArtisanRecord>> = eligible.into_iter().map(Some).collect();
    hits.into_iter()
        .filter_map(|hit| {
            slots[hit.position].take().map(|artisan| MatchResult {
                artisan,
                distance: hit.distance,
            })
        })
        .collect()
}
