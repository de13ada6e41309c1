//! Loader for the artisan seed file (`config/artisans.yaml`).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ApprovalStatus, ArtisanDocuments, Coordinate, ConfigError, TradeType};

fn default_status() -> ApprovalStatus {
    ApprovalStatus::Pending
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtisanSeed {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub trade_type: TradeType,
    #[serde(default = "default_status")]
    pub status: ApprovalStatus,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub is_suspended: bool,
    pub location: Option<Coordinate>,
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub documents: ArtisanDocuments,
}

#[derive(Debug, Deserialize)]
pub struct ArtisansFile {
    pub artisans: Vec<ArtisanSeed>,
}

/// Load and validate the artisan seed file.
///
/// Coordinates and trade types are validated during deserialization; this
/// additionally checks names and email uniqueness.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_artisans(path: &Path) -> Result<ArtisansFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ArtisansFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let artisans_file: ArtisansFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ArtisansFileParse)?;

    validate_artisans(&artisans_file)?;

    Ok(artisans_file)
}

fn validate_artisans(artisans_file: &ArtisansFile) -> Result<(), ConfigError> {
    let mut seen_emails = HashSet::new();

    for artisan in &artisans_file.artisans {
        if artisan.full_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "artisan full_name must be non-empty".to_string(),
            ));
        }

        let email = artisan.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ConfigError::Validation(format!(
                "artisan '{}' has invalid email '{}'",
                artisan.full_name, artisan.email
            )));
        }

        if !seen_emails.insert(email) {
            return Err(ConfigError::Validation(format!(
                "duplicate artisan email: '{}'",
                artisan.email
            )));
        }
    }

    Ok(())
}
