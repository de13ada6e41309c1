//! Write operations for the `artisans` table.

use fixnear_core::{ApprovalStatus, ArtisanId, ArtisanSeed, RatingAggregate};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::types::{ArtisanRow, ArtisanUpdate, ARTISAN_COLUMNS};

/// Insert a seed artisan, or update the existing one with the same
/// (case-insensitive) email. Rating aggregates are left untouched on update.
///
/// Returns `(id, is_new)`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn upsert_artisan_seed(
    conn: &mut PgConnection,
    seed: &ArtisanSeed,
) -> Result<(Uuid, bool), sqlx::Error> {
    let (latitude, longitude) = match seed.location {
        Some(c) => (Some(c.latitude()), Some(c.longitude())),
        None => (None, None),
    };

    sqlx::query_as::<_, (Uuid, bool)>(
        "INSERT INTO artisans \
             (id, full_name, phone, email, trade_type, profile_photo, id_card_url, \
              skill_photo_url, latitude, longitude, is_available, is_suspended, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         ON CONFLICT ((lower(email))) DO UPDATE SET \
             full_name       = EXCLUDED.full_name, \
             phone           = EXCLUDED.phone, \
             trade_type      = EXCLUDED.trade_type, \
             profile_photo   = EXCLUDED.profile_photo, \
             id_card_url     = EXCLUDED.id_card_url, \
             skill_photo_url = EXCLUDED.skill_photo_url, \
             latitude        = EXCLUDED.latitude, \
             longitude       = EXCLUDED.longitude, \
             is_available    = EXCLUDED.is_available, \
             is_suspended    = EXCLUDED.is_suspended, \
             status          = EXCLUDED.status, \
             updated_at      = NOW() \
         RETURNING id, (xmax = 0) AS is_new",
    )
    .bind(Uuid::new_v4())
    .bind(seed.full_name.trim())
    .bind(&seed.phone)
    .bind(seed.email.trim())
    .bind(seed.trade_type.as_str())
    .bind(&seed.profile_photo)
    .bind(&seed.documents.id_card_url)
    .bind(&seed.documents.skill_photo_url)
    .bind(latitude)
    .bind(longitude)
    .bind(seed.is_available)
    .bind(seed.is_suspended)
    .bind(seed.status.as_str())
    .fetch_one(conn)
    .await
}

/// Apply a partial profile update in one statement and return the new row,
/// or `None` if the artisan does not exist.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn apply_artisan_update(
    pool: &PgPool,
    id: ArtisanId,
    update: &ArtisanUpdate,
) -> Result<Option<ArtisanRow>, sqlx::Error> {
    let relocate = update.location.is_some();
    let sql = format!(
        "UPDATE artisans SET \
             latitude     = CASE WHEN $2 THEN $3::float8 ELSE latitude END, \
             longitude    = CASE WHEN $2 THEN $4::float8 ELSE longitude END, \
             is_available = COALESCE($5, is_available), \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING {ARTISAN_COLUMNS}"
    );

    sqlx::query_as::<_, ArtisanRow>(&sql)
        .bind(id.as_uuid())
        .bind(relocate)
        .bind(update.location.map(|c| c.latitude()))
        .bind(update.location.map(|c| c.longitude()))
        .bind(update.is_available)
        .fetch_optional(pool)
        .await
}

/// Set an artisan's approval status and return the new row, or `None` if the
/// artisan does not exist.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn set_artisan_status(
    pool: &PgPool,
    id: ArtisanId,
    status: ApprovalStatus,
) -> Result<Option<ArtisanRow>, sqlx::Error> {
    let sql = format!(
        "UPDATE artisans SET status = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {ARTISAN_COLUMNS}"
    );

    sqlx::query_as::<_, ArtisanRow>(&sql)
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(pool)
        .await
}

/// Outcome of [`write_rating_aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateWrite {
    Written,
    /// The review table has moved on since the aggregate was computed; a
    /// later recompute owns the row.
    Stale,
    Missing,
}

/// Write `rating` and `review_count` together, but only while
/// `review_count` still equals the number of stored reviews.
///
/// Reviews are append-only (removed only with their artisan), so the count
/// identifies the sample an aggregate was computed from. A recompute that
/// read an older sample cannot overwrite a newer one, even across processes.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn write_rating_aggregate(
    pool: &PgPool,
    id: ArtisanId,
    aggregate: RatingAggregate,
) -> Result<AggregateWrite, sqlx::Error> {
    let review_count = i32::try_from(aggregate.review_count).unwrap_or(i32::MAX);
    let (found, written) = sqlx::query_as::<_, (bool, bool)>(
        "WITH updated AS ( \
             UPDATE artisans \
             SET rating = $2, review_count = $3, updated_at = NOW() \
             WHERE id = $1 \
               AND $4 = (SELECT count(*) FROM reviews WHERE artisan_id = $1) \
             RETURNING id \
         ) \
         SELECT EXISTS (SELECT 1 FROM artisans WHERE id = $1) AS found, \
                EXISTS (SELECT 1 FROM updated) AS written",
    )
    .bind(id.as_uuid())
    .bind(aggregate.average_rating)
    .bind(review_count)
    .bind(i64::from(aggregate.review_count))
    .fetch_one(pool)
    .await?;

    Ok(match (found, written) {
        (_, true) => AggregateWrite::Written,
        (true, false) => AggregateWrite::Stale,
        (false, false) => AggregateWrite::Missing,
    })
}
