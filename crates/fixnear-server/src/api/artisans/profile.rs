use axum::{
    extract::{Path, State},
    Extension, Json,
};
use fixnear_core::Coordinate;
use fixnear_db::ArtisanUpdate;
use fixnear_matching::{project, ArtisanView, Audience};
use serde::Deserialize;

use super::parse_artisan_id;
use crate::api::{map_db_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

/// Body for `PATCH /api/v1/artisans/{id}`. A location must carry both halves.
#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateArtisanBody {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_available: Option<bool>,
}

pub(in crate::api) async fn get_artisan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ArtisanView>>, ApiError> {
    let artisan_id = parse_artisan_id(&req_id.0, &id)?;

    let row = fixnear_db::get_artisan(&state.pool, artisan_id)
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

    Ok(Json(ApiResponse::new(
        req_id.0,
        project(&record, Audience::Public),
    )))
}

pub(in crate::api) async fn update_artisan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdateArtisanBody>,
) -> Result<Json<ApiResponse<ArtisanView>>, ApiError> {
    let artisan_id = parse_artisan_id(&req_id.0, &id)?;

    let location = match (body.lat, body.lng) {
        (Some(lat), Some(lng)) => Some(
            Coordinate::try_new(lat, lng)
                .map_err(|e| ApiError::validation(req_id.0.clone(), e.to_string()))?,
        ),
        (None, None) => None,
        _ => {
            return Err(ApiError::validation(
                req_id.0,
                "lat and lng must be provided together",
            ))
        }
    };

    let update = ArtisanUpdate {
        location,
        is_available: body.is_available,
    };
    if update.is_empty() {
        return Err(ApiError::validation(
            req_id.0,
            "at least one of location or is_available must be provided",
        ));
    }

    let row = fixnear_db::apply_artisan_update(&state.pool, artisan_id, &update)
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

    tracing::info!(
        artisan_id = %artisan_id,
        location_changed = update.location.is_some(),
        available = record.available,
        "artisan profile updated"
    );

    Ok(Json(ApiResponse::new(
        req_id.0,
        project(&record, Audience::Public),
    )))
}
