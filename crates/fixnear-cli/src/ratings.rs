//! Rating aggregate recomputation from the command line.

use std::sync::Arc;

use clap::Subcommand;
use fixnear_core::ArtisanId;
use fixnear_db::{PgArtisanDirectory, PgReviewStore};
use fixnear_matching::RatingAggregator;
use serde::Serialize;

use crate::artisans::print_json;

#[derive(Debug, Subcommand)]
pub enum RatingCommands {
    /// Recompute stored rating and review count from reviews
    Recompute {
        /// Artisan UUID to recompute
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        artisan: Option<String>,
        /// Recompute every artisan
        #[arg(long)]
        all: bool,
    },
}

#[derive(Debug, Serialize)]
struct RecomputedRating {
    artisan_id: ArtisanId,
    average_rating: f64,
    review_count: u32,
}

pub(crate) async fn run(pool: &sqlx::PgPool, command: RatingCommands) -> anyhow::Result<()> {
    let aggregator = RatingAggregator::new(
        Arc::new(PgArtisanDirectory::new(pool.clone())),
        Arc::new(PgReviewStore::new(pool.clone())),
    );

    let RatingCommands::Recompute { artisan, all } = command;
    let recomputed = if all {
        aggregator.recompute_all().await?
    } else {
        let raw = artisan.ok_or_else(|| anyhow::anyhow!("--artisan or --all is required"))?;
        let artisan_id: ArtisanId = raw.parse()?;
        vec![(artisan_id, aggregator.recompute(artisan_id).await?)]
    };

    let rows: Vec<RecomputedRating> = recomputed
        .into_iter()
        .map(|(artisan_id, aggregate)| RecomputedRating {
            artisan_id,
            average_rating: aggregate.average_rating,
            review_count: aggregate.review_count,
        })
        .collect();
    print_json(&rows)
}
