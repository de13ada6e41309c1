mod admin;
mod artisans;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use fixnear_db::{PgArtisanDirectory, PgReviewStore};
use fixnear_matching::{ArtisanMatcher, MatchError, MatchPolicy, RatingAggregator};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub matcher: Arc<ArtisanMatcher>,
    pub ratings: Arc<RatingAggregator>,
}

impl AppState {
    /// Wire the matcher and rating aggregator to Postgres-backed ports.
    #[must_use]
    pub fn new(pool: PgPool, policy: MatchPolicy) -> Self {
        let directory = Arc::new(PgArtisanDirectory::new(pool.clone()));
        let reviews = Arc::new(PgReviewStore::new(pool.clone()));
        Self {
            matcher: Arc::new(ArtisanMatcher::new(directory.clone(), policy)),
            ratings: Arc::new(RatingAggregator::new(directory, reviews)),
            pool,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub fn validation(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: impl Into<fixnear_db::DbError>) -> ApiError {
    let error = error.into();
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_match_error(request_id: String, error: &MatchError) -> ApiError {
    match error {
        MatchError::InvalidCoordinate { .. } | MatchError::InvalidQuery(_) => {
            ApiError::validation(request_id, error.to_string())
        }
        MatchError::ArtisanNotFound(_) => ApiError::new(request_id, "not_found", error.to_string()),
        MatchError::DirectoryUnavailable(source) => {
            tracing::error!(error = %source, "artisan directory unavailable");
            ApiError::new(request_id, "service_unavailable", error.to_string())
        }
        MatchError::ReviewStoreUnavailable(source) => {
            tracing::error!(error = %source, "review store unavailable");
            ApiError::new(request_id, "service_unavailable", error.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn data_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/artisans/nearby", get(artisans::find_nearby))
        .route("/api/v1/artisans/emergency", get(artisans::find_emergency))
        .route(
            "/api/v1/artisans/{id}",
            get(artisans::get_artisan).patch(artisans::update_artisan),
        )
        .route(
            "/api/v1/artisans/{id}/reviews",
            get(artisans::list_reviews),
        )
        .route(
            "/api/v1/artisans/{id}/rating",
            post(artisans::recompute_rating),
        )
        .route("/api/v1/reviews", post(artisans::submit_review))
        .route("/api/v1/admin/artisans", get(admin::search_artisans))
        .route(
            "/api/v1/admin/artisans/{id}/status",
            patch(admin::update_artisan_status),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(data_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match fixnear_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}
