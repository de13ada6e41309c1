mod artisans;
mod ratings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{artisans::ArtisanCommands, ratings::RatingCommands};

#[derive(Debug, Parser)]
#[command(name = "fixnear-cli")]
#[command(about = "FixNear artisan matching command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Search and inspect artisans
    Artisans {
        #[command(subcommand)]
        command: ArtisanCommands,
    },
    /// Rating aggregate maintenance
    Ratings {
        #[command(subcommand)]
        command: RatingCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert artisans from the seed file
    Seed {
        /// Seed file path (defaults to `FIXNEAR_ARTISANS_PATH`)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("fixnear-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = fixnear_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = fixnear_db::PoolConfig::from_app_config(&config);
    let pool = fixnear_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, &config, command).await,
        Commands::Artisans { command } => artisans::run(&pool, &config, command).await,
        Commands::Ratings { command } => ratings::run(&pool, command).await,
    }
}

async fn run_db(
    pool: &sqlx::PgPool,
    config: &fixnear_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            fixnear_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = fixnear_db::run_migrations(pool).await?;
            println!("migrations applied: {applied}");
        }
        DbCommands::Seed { file } => {
            let path = file.unwrap_or_else(|| config.artisans_path.clone());
            let artisans_file = fixnear_core::load_artisans(&path)?;
            let summary = fixnear_db::seed_artisans(pool, &artisans_file.artisans).await?;
            tracing::info!(
                path = %path.display(),
                inserted = summary.inserted,
                updated = summary.updated,
                "artisan seed complete"
            );
            println!(
                "seeded {} artisans ({} inserted, {} updated)",
                artisans_file.artisans.len(),
                summary.inserted,
                summary.updated
            );
        }
    }
    Ok(())
}
