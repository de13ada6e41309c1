//! Read operations for the `artisans` table.

use fixnear_core::ArtisanId;
use fixnear_matching::CandidateHint;
use sqlx::PgPool;

use super::types::{ArtisanRow, ARTISAN_COLUMNS};

/// Fetch one artisan by id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_artisan(pool: &PgPool, id: ArtisanId) -> Result<Option<ArtisanRow>, sqlx::Error> {
    let sql = format!("SELECT {ARTISAN_COLUMNS} FROM artisans WHERE id = $1");
    sqlx::query_as::<_, ArtisanRow>(&sql)
        .bind(id.as_uuid())
        .fetch_optional(pool)
        .await
}

/// List artisans admitted by `hint`, in directory order (`created_at`, `id`).
///
/// The spatial part of the hint becomes a lat/lng bounding-box prefilter; a
/// box that wraps the antimeridian is split into two longitude ranges. When
/// the search cap covers a pole only "has a location" is pushed down.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_artisans(
    pool: &PgPool,
    hint: &CandidateHint,
) -> Result<Vec<ArtisanRow>, sqlx::Error> {
    let bounds = hint.within.and_then(|w| w.bounds());

    let sql = format!(
        "SELECT {ARTISAN_COLUMNS} FROM artisans \
         WHERE ($1::text IS NULL OR status = $1) \
           AND ($2::text IS NULL OR trade_type = $2) \
           AND (NOT $3 OR is_available) \
           AND (NOT $4 OR NOT is_suspended) \
           AND (NOT $5 OR latitude IS NOT NULL) \
           AND ($6::float8 IS NULL OR latitude BETWEEN $6 AND $7::float8) \
           AND ($8::float8 IS NULL \
                OR ($8 <= $9::float8 AND longitude BETWEEN $8 AND $9) \
                OR ($8 > $9 AND (longitude >= $8 OR longitude <= $9))) \
         ORDER BY created_at, id"
    );

    sqlx::query_as::<_, ArtisanRow>(&sql)
        .bind(hint.status.map(|s| s.as_str()))
        .bind(hint.trade_type.as_ref().map(|t| t.as_str().to_string()))
        .bind(hint.require_available)
        .bind(hint.exclude_suspended)
        .bind(hint.within.is_some())
        .bind(bounds.map(|b| b.min_latitude))
        .bind(bounds.map(|b| b.max_latitude))
        .bind(bounds.map(|b| b.min_longitude))
        .bind(bounds.map(|b| b.max_longitude))
        .fetch_all(pool)
        .await
}
