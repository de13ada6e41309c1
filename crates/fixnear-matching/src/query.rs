//! Match queries and the named policy that fills in their defaults.
//!
//! A [`MatchQuery`] is validated when it is built, so the matcher never sees
//! a bad origin, radius, or K.

use fixnear_core::{AppConfig, ApprovalStatus, Coordinate, TradeType};

use crate::directory::{CandidateHint, SpatialHint};
use crate::MatchError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMode {
    /// Every eligible artisan within `radius_km`.
    Radius { radius_km: f64 },
    /// The `k` closest eligible artisans within `max_radius_km`.
    NearestK { k: usize, max_radius_km: f64 },
}

impl SearchMode {
    #[must_use]
    pub fn radius_km(&self) -> f64 {
        match *self {
            Self::Radius { radius_km } => radius_km,
            Self::NearestK { max_radius_km, .. } => max_radius_km,
        }
    }
}

/// Which approval status a query admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    Require(ApprovalStatus),
    Any,
}

impl StatusPolicy {
    #[must_use]
    pub fn required(&self) -> Option<ApprovalStatus> {
        match *self {
            Self::Require(status) => Some(status),
            Self::Any => None,
        }
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::Require(ApprovalStatus::Approved)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    origin: Coordinate,
    mode: SearchMode,
    trade_type: Option<TradeType>,
    status: StatusPolicy,
    require_available: bool,
    exclude_suspended: bool,
}

impl MatchQuery {
    /// Bounded-radius query with end-user defaults: approved only,
    /// suspended excluded, availability not required.
    ///
    /// # Errors
    ///
    /// [`MatchError::InvalidCoordinate`] for a bad origin, then
    /// [`MatchError::InvalidQuery`] for a non-positive or non-finite radius.
    pub fn radius(latitude: f64, longitude: f64, radius_km: f64) -> Result<Self, MatchError> {
        let origin = Coordinate::try_new(latitude, longitude)?;
        validate_radius(radius_km)?;
        Ok(Self {
            origin,
            mode: SearchMode::Radius { radius_km },
            trade_type: None,
            status: StatusPolicy::default(),
            require_available: false,
            exclude_suspended: true,
        })
    }

    /// Nearest-K query with emergency defaults: approved, available, and not
    /// suspended.
    ///
    /// # Errors
    ///
    /// [`MatchError::InvalidCoordinate`] for a bad origin, then
    /// [`MatchError::InvalidQuery`] for `k == 0` or a bad radius.
    pub fn nearest_k(
        latitude: f64,
        longitude: f64,
        k: usize,
        max_radius_km: f64,
    ) -> Result<Self, MatchError> {
        let origin = Coordinate::try_new(latitude, longitude)?;
        if k == 0 {
            return Err(MatchError::InvalidQuery(
                "k must be greater than zero".to_string(),
            ));
        }
        validate_radius(max_radius_km)?;
        Ok(Self {
            origin,
            mode: SearchMode::NearestK { k, max_radius_km },
            trade_type: None,
            status: StatusPolicy::default(),
            require_available: true,
            exclude_suspended: true,
        })
    }

    #[must_use]
    pub fn with_trade_type(mut self, trade_type: Option<TradeType>) -> Self {
        self.trade_type = trade_type;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusPolicy) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_required_availability(mut self, required: bool) -> Self {
        self.require_available = required;
        self
    }

    #[must_use]
    pub fn with_suspended_excluded(mut self, excluded: bool) -> Self {
        self.exclude_suspended = excluded;
        self
    }

    #[must_use]
    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    #[must_use]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    #[must_use]
    pub fn trade_type(&self) -> Option<&TradeType> {
        self.trade_type.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> StatusPolicy {
        self.status
    }

    #[must_use]
    pub fn requires_available(&self) -> bool {
        self.require_available
    }

    #[must_use]
    pub fn excludes_suspended(&self) -> bool {
        self.exclude_suspended
    }

    /// Candidate hint handed to the directory for this query.
    #[must_use]
    pub fn hint(&self) -> CandidateHint {
        CandidateHint {
            status: self.status.required(),
            trade_type: self.trade_type.clone(),
            require_available: self.require_available,
            exclude_suspended: self.exclude_suspended,
            within: Some(SpatialHint {
                origin: self.origin,
                radius_km: self.mode.radius_km(),
            }),
        }
    }
}

fn validate_radius(radius_km: f64) -> Result<(), MatchError> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(())
    } else {
        Err(MatchError::InvalidQuery(format!(
            "radius must be a positive number of kilometers, got {radius_km}"
        )))
    }
}

/// Caller-facing input for an ordinary nearby search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NearbyRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub trade_type: Option<TradeType>,
    pub radius_km: Option<f64>,
}

/// Caller-facing input for an emergency nearest-K search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmergencyRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub k: Option<usize>,
    pub max_radius_km: Option<f64>,
}

/// Caller-facing input for the admin listing. Without an origin the
/// listing is not spatial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminSearchRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub status: Option<ApprovalStatus>,
    pub trade_type: Option<TradeType>,
}

/// Default radii and limits applied when a request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    pub nearby_radius_km: f64,
    pub emergency_limit: usize,
    pub emergency_max_radius_km: f64,
    pub admin_radius_km: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            nearby_radius_km: 10.0,
            emergency_limit: 3,
            emergency_max_radius_km: 20.0,
            admin_radius_km: 20.0,
        }
    }
}

impl MatchPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            nearby_radius_km: config.nearby_radius_km,
            emergency_limit: config.emergency_limit,
            emergency_max_radius_km: config.emergency_max_radius_km,
            admin_radius_km: config.admin_radius_km,
        }
    }

    /// # Errors
    ///
    /// See [`MatchQuery::radius`].
    pub fn nearby_query(&self, request: &NearbyRequest) -> Result<MatchQuery, MatchError> {
        let radius_km = request.radius_km.unwrap_or(self.nearby_radius_km);
        Ok(
            MatchQuery::radius(request.latitude, request.longitude, radius_km)?
                .with_trade_type(request.trade_type.clone()),
        )
    }

    /// # Errors
    ///
    /// See [`MatchQuery::nearest_k`].
    pub fn emergency_query(&self, request: &EmergencyRequest) -> Result<MatchQuery, MatchError> {
        MatchQuery::nearest_k(
            request.latitude,
            request.longitude,
            request.k.unwrap_or(self.emergency_limit),
            request.max_radius_km.unwrap_or(self.emergency_max_radius_km),
        )
    }

    /// Admin queries admit every status unless one is named, and include
    /// suspended artisans. Returns `Ok(None)` when no origin was given.
    ///
    /// # Errors
    ///
    /// [`MatchError::InvalidQuery`] when only one of latitude/longitude is
    /// present, otherwise as [`MatchQuery::radius`].
    pub fn admin_query(&self, request: &AdminSearchRequest) -> Result<Option<MatchQuery>, MatchError> {
        let (latitude, longitude) = match (request.latitude, request.longitude) {
            (Some(lat), Some(lng)) => (lat, lng),
            (None, None) => return Ok(None),
            _ => {
                return Err(MatchError::InvalidQuery(
                    "lat and lng must be supplied together".to_string(),
                ))
            }
        };
        let radius_km = request.radius_km.unwrap_or(self.admin_radius_km);
        let status = request.status.map_or(StatusPolicy::Any, StatusPolicy::Require);
        Ok(Some(
            MatchQuery::radius(latitude, longitude, radius_km)?
                .with_trade_type(request.trade_type.clone())
                .with_status(status)
                .with_suspended_excluded(false),
        ))
    }

    /// Non-spatial admin listing hint.
    #[must_use]
    pub fn admin_listing_hint(request: &AdminSearchRequest) -> CandidateHint {
        CandidateHint {
            status: request.status,
            trade_type: request.trade_type.clone(),
            ..CandidateHint::default()
        }
    }
}
