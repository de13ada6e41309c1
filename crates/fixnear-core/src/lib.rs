pub mod app_config;
pub mod artisans;
pub mod config;
pub mod geo;
pub mod records;

pub use app_config::{AppConfig, Environment};
pub use artisans::{load_artisans, ArtisanSeed, ArtisansFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{Coordinate, Distance};
pub use records::{
    ApprovalStatus, ArtisanDocuments, ArtisanId, ArtisanRecord, Rating, RatingAggregate,
    ReviewId, ReviewRecord, TradeType,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("trade type must be non-empty")]
    EmptyTradeType,
    #[error("invalid approval status: {0}")]
    InvalidApprovalStatus(String),
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),
    #[error("invalid artisan id: {0}")]
    InvalidArtisanId(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read artisans file {path}: {source}")]
    ArtisansFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artisans file: {0}")]
    ArtisansFileParse(#[from] serde_yaml::Error),
    #[error("artisans file validation failed: {0}")]
    Validation(String),
}
