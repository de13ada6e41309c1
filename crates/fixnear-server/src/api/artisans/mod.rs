//! Public artisan routes: nearby and emergency search, profile reads and
//! updates, reviews, and rating recomputation.

mod profile;
mod reviews;
mod search;

pub(super) use profile::{get_artisan, update_artisan};
pub(super) use reviews::{list_reviews, recompute_rating, submit_review};
pub(super) use search::{find_emergency, find_nearby};

use fixnear_core::{ArtisanId, TradeType};

use super::ApiError;

/// Both halves of a coordinate must be present; range checks happen later.
pub(super) fn require_origin(
    request_id: &str,
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<(f64, f64), ApiError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok((lat, lng)),
        _ => Err(ApiError::validation(
            request_id,
            "lat and lng query parameters are required",
        )),
    }
}

pub(super) fn parse_trade(request_id: &str, raw: Option<&str>) -> Result<Option<TradeType>, ApiError> {
    raw.map(TradeType::try_new)
        .transpose()
        .map_err(|e| ApiError::validation(request_id, e.to_string()))
}

pub(super) fn parse_artisan_id(request_id: &str, raw: &str) -> Result<ArtisanId, ApiError> {
    raw.parse::<ArtisanId>()
        .map_err(|e| ApiError::validation(request_id, e.to_string()))
}
