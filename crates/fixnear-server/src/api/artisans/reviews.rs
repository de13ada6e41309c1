use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fixnear_core::{Rating, RatingAggregate, ReviewRecord};
use fixnear_db::NewReview;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parse_artisan_id;
use crate::api::{map_db_error, map_match_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(in crate::api) struct SubmitReviewBody {
    pub artisan_id: String,
    pub user_id: Uuid,
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SubmittedReview {
    review: ReviewRecord,
    aggregate: RatingAggregate,
}

pub(in crate::api) async fn list_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ReviewRecord>>>, ApiError> {
    let artisan_id = parse_artisan_id(&req_id.0, &id)?;

    let exists = fixnear_db::get_artisan(&state.pool, artisan_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), e))?
        .is_some();
    if !exists {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("artisan '{artisan_id}' not found"),
        ));
    }

    let rows = fixnear_db::list_reviews_for_artisan(&state.pool, artisan_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), e))?;
    let reviews = rows
        .into_iter()
        .map(fixnear_db::ReviewRow::into_record)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_db_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::new(req_id.0, reviews)))
}

pub(in crate::api) async fn recompute_rating(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RatingAggregate>>, ApiError> {
    let artisan_id = parse_artisan_id(&req_id.0, &id)?;

    let aggregate = state
        .ratings
        .recompute(artisan_id)
        .await
        .map_err(|e| map_match_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, aggregate)))
}

/// Store a review, then refresh the artisan's aggregate. A failed recompute
/// is reported but leaves the stored review in place.
pub(in crate::api) async fn submit_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SubmitReviewBody>,
) -> Result<(StatusCode, Json<ApiResponse<SubmittedReview>>), ApiError> {
    let artisan_id = parse_artisan_id(&req_id.0, &body.artisan_id)?;
    let rating = Rating::try_new(body.rating)
        .map_err(|e| ApiError::validation(req_id.0.clone(), e.to_string()))?;

    let new_review = NewReview {
        artisan_id,
        user_id: body.user_id,
        rating,
        comment: body.comment,
    };

    let row = match fixnear_db::insert_review(&state.pool, &new_review).await {
        Ok(row) => row,
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23503") => {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                format!("artisan '{artisan_id}' not found"),
            ));
        }
        Err(e) => return Err(map_db_error(req_id.0, e)),
    };
    let review = row
        .into_record()
        .map_err(|e| map_db_error(req_id.0.clone(), e))?;

    let aggregate = state
        .ratings
        .recompute(artisan_id)
        .await
        .map_err(|e| map_match_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, SubmittedReview { review, aggregate })),
    ))
}
