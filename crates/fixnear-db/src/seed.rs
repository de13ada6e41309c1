use fixnear_core::ArtisanSeed;
use sqlx::PgPool;

use crate::artisans::upsert_artisan_seed;
use crate::DbError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// Upsert artisans from the seed file, keyed by email.
///
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_artisans(pool: &PgPool, artisans: &[ArtisanSeed]) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for artisan in artisans {
        let (_, is_new) = upsert_artisan_seed(&mut tx, artisan).await?;
        if is_new {
            summary.inserted += 1;
        } else {
            summary.updated += 1;
        }
    }

    tx.commit().await?;
    Ok(summary)
}
