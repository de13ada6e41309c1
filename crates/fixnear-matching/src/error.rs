use fixnear_core::{ArtisanId, CoreError};
use thiserror::Error;

use crate::directory::{DirectoryError, ReviewStoreError};

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("artisan not found: {0}")]
    ArtisanNotFound(ArtisanId),

    #[error("artisan directory unavailable")]
    DirectoryUnavailable(#[source] DirectoryError),

    #[error("review store unavailable")]
    ReviewStoreUnavailable(#[source] ReviewStoreError),
}

impl MatchError {
    /// True for errors caused by the caller's input rather than a backend.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidCoordinate { .. } | Self::InvalidQuery(_))
    }
}

impl From<CoreError> for MatchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCoordinate {
                latitude,
                longitude,
            } => Self::InvalidCoordinate {
                latitude,
                longitude,
            },
            other => Self::InvalidQuery(other.to_string()),
        }
    }
}

impl From<DirectoryError> for MatchError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(id) => Self::ArtisanNotFound(id),
            other => Self::DirectoryUnavailable(other),
        }
    }
}

impl From<ReviewStoreError> for MatchError {
    fn from(err: ReviewStoreError) -> Self {
        Self::ReviewStoreUnavailable(err)
    }
}
