//! Admin artisan routes. Search includes every approval status and
//! suspended artisans unless filtered, and exposes document links. Status
//! changes are how a pending artisan becomes eligible for matching.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use fixnear_core::ApprovalStatus;
use fixnear_matching::{project, project_admin_listing, AdminSearchRequest, ArtisanView, Audience};
use serde::Deserialize;

use super::artisans::{parse_artisan_id, parse_trade};
use super::{map_db_error, map_match_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct AdminSearchQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub status: Option<String>,
    pub trade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusBody {
    pub status: String,
}

pub(super) async fn search_artisans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<AdminSearchQuery>,
) -> Result<Json<ApiResponse<Vec<ArtisanView>>>, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<ApprovalStatus>)
        .transpose()
        .map_err(|e| ApiError::validation(req_id.0.clone(), e.to_string()))?;
    let trade_type = parse_trade(&req_id.0, params.trade.as_deref())?;

    let request = AdminSearchRequest {
        latitude: params.lat,
        longitude: params.lng,
        radius_km: params.radius,
        status,
        trade_type,
    };

    let listing = state
        .matcher
        .find_for_admin(&request)
        .await
        .map_err(|e| map_match_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        project_admin_listing(&listing),
    )))
}

/// `PATCH /api/v1/admin/artisans/{id}/status`. Only `approved` and
/// `suspended` are accepted; artisans never move back to `pending`.
pub(super) async fn update_artisan_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ApiResponse<ArtisanView>>, ApiError> {
    let artisan_id = parse_artisan_id(&req_id.0, &id)?;
    let status = match body.status.parse::<ApprovalStatus>() {
        Ok(status @ (ApprovalStatus::Approved | ApprovalStatus::Suspended)) => status,
        _ => {
            return Err(ApiError::validation(
                req_id.0,
                format!(
                    "status must be 'approved' or 'suspended', got '{}'",
                    body.status
                ),
            ))
        }
    };

    let row = fixnear_db::set_artisan_status(&state.pool, artisan_id, status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("artisan '{artisan_id}' not found"),
            )
        })?;
    let record = row
        .into_record()
        .map_err(|e| map_db_error(req_id.0.clone(), e))?;

    tracing::info!(artisan_id = %artisan_id, status = %status, "artisan status changed");

    Ok(Json(ApiResponse::new(
        req_id.0,
        project(&record, Audience::Admin),
    )))
}
