//! Artisan search and lookup command handlers.
//!
//! Results are printed as pretty JSON in the same shape the HTTP API
//! returns under `data`.

use std::sync::Arc;

use clap::Subcommand;
use fixnear_core::{ArtisanId, TradeType};
use fixnear_db::PgArtisanDirectory;
use fixnear_matching::{
    project, project_matches, ArtisanMatcher, Audience, EmergencyRequest, MatchPolicy,
    NearbyRequest,
};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum ArtisanCommands {
    /// Approved artisans within a radius, nearest first
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Restrict to one trade (case-insensitive)
        #[arg(long)]
        trade: Option<String>,
        /// Search radius in km (defaults to `FIXNEAR_NEARBY_RADIUS_KM`)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// The closest available artisans for an emergency call-out
    Emergency {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Maximum results (defaults to `FIXNEAR_EMERGENCY_LIMIT`)
        #[arg(long)]
        k: Option<usize>,
        /// Search cap in km (defaults to `FIXNEAR_EMERGENCY_MAX_RADIUS_KM`)
        #[arg(long)]
        max_radius: Option<f64>,
    },
    /// Show one artisan's public profile
    Show {
        /// Artisan UUID
        id: String,
    },
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &fixnear_core::AppConfig,
    command: ArtisanCommands,
) -> anyhow::Result<()> {
    let directory = Arc::new(PgArtisanDirectory::new(pool.clone()));
    let matcher = ArtisanMatcher::new(directory, MatchPolicy::from_config(config));

    match command {
        ArtisanCommands::Nearby {
            lat,
            lng,
            trade,
            radius,
        } => {
            let request = NearbyRequest {
                latitude: lat,
                longitude: lng,
                trade_type: trade.as_deref().map(TradeType::try_new).transpose()?,
                radius_km: radius,
            };
            let results = matcher.find_nearby(&request).await?;
            print_json(&project_matches(&results, Audience::Public))
        }
        ArtisanCommands::Emergency {
            lat,
            lng,
            k,
            max_radius,
        } => {
            let request = EmergencyRequest {
                latitude: lat,
                longitude: lng,
                k,
                max_radius_km: max_radius,
            };
            let results = matcher.find_nearest_k(&request).await?;
            print_json(&project_matches(&results, Audience::Public))
        }
        ArtisanCommands::Show { id } => {
            let artisan_id: ArtisanId = id.parse()?;
            let row = fixnear_db::get_artisan(pool, artisan_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("artisan '{artisan_id}' not found"))?;
            print_json(&project(&row.into_record()?, Audience::Public))
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
