use axum::{
    extract::{Query, State},
    Extension, Json,
};
use fixnear_matching::{project_matches, ArtisanView, Audience, EmergencyRequest, NearbyRequest};
use serde::Deserialize;

use super::{parse_trade, require_origin};
use crate::api::{map_match_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(in crate::api) struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub trade: Option<String>,
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct EmergencyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub k: Option<usize>,
    pub max_radius: Option<f64>,
}

pub(in crate::api) async fn find_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<ArtisanView>>>, ApiError> {
    let (latitude, longitude) = require_origin(&req_id.0, params.lat, params.lng)?;
    let trade_type = parse_trade(&req_id.0, params.trade.as_deref())?;

    let request = NearbyRequest {
        latitude,
        longitude,
        trade_type,
        radius_km: params.radius,
    };

    let results = state
        .matcher
        .find_nearby(&request)
        .await
        .map_err(|e| map_match_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        project_matches(&results, Audience::Public),
    )))
}

pub(in crate::api) async fn find_emergency(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<EmergencyQuery>,
) -> Result<Json<ApiResponse<Vec<ArtisanView>>>, ApiError> {
    let (latitude, longitude) = require_origin(&req_id.0, params.lat, params.lng)?;

    let request = EmergencyRequest {
        latitude,
        longitude,
        k: params.k,
        max_radius_km: params.max_radius,
    };

    let results = state
        .matcher
        .find_nearest_k(&request)
        .await
        .map_err(|e| map_match_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        project_matches(&results, Audience::Public),
    )))
}
