//! Attribute predicates applied to every candidate before distance checks.

use fixnear_core::{ApprovalStatus, ArtisanRecord, TradeType};

use crate::query::MatchQuery;

#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Status(ApprovalStatus),
    TradeType(TradeType),
    Available,
    NotSuspended,
}

impl Criterion {
    #[must_use]
    pub fn admits(&self, artisan: &ArtisanRecord) -> bool {
        match self {
            Self::Status(status) => artisan.approval_status == *status,
            Self::TradeType(trade) => artisan.trade_type == *trade,
            Self::Available => artisan.available,
            Self::NotSuspended => !artisan.suspended,
        }
    }
}

/// Conjunction of criteria. An empty filter admits everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilter {
    criteria: Vec<Criterion>,
}

impl MatchFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria for `query`, evaluated as status, trade type, availability,
    /// then suspension.
    #[must_use]
    pub fn for_query(query: &MatchQuery) -> Self {
        let mut filter = Self::new();
        if let Some(status) = query.status().required() {
            filter = filter.with(Criterion::Status(status));
        }
        if let Some(trade) = query.trade_type() {
            filter = filter.with(Criterion::TradeType(trade.clone()));
        }
        if query.requires_available() {
            filter = filter.with(Criterion::Available);
        }
        if query.excludes_suspended() {
            filter = filter.with(Criterion::NotSuspended);
        }
        filter
    }

    #[must_use]
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    #[must_use]
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    #[must_use]
    pub fn matches(&self, artisan: &ArtisanRecord) -> bool {
        self.criteria.iter().all(|c| c.admits(artisan))
    }
}

/// Whether `artisan` passes every attribute constraint of `query`.
#[must_use]
pub fn matches(artisan: &ArtisanRecord, query: &MatchQuery) -> bool {
    MatchFilter::for_query(query).matches(artisan)
}
