//! Row types for the `artisans` table.

use chrono::{DateTime, Utc};
use fixnear_core::{
    ApprovalStatus, ArtisanDocuments, ArtisanId, ArtisanRecord, Coordinate, CoreError, TradeType,
};
use uuid::Uuid;

/// A row from the `artisans` table.
///
/// `password_hash` is never selected; records built from rows carry `None`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArtisanRow {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub trade_type: String,
    pub profile_photo: Option<String>,
    pub id_card_url: Option<String>,
    pub skill_photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_available: bool,
    pub rating: f64,
    pub review_count: i32,
    pub is_suspended: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArtisanRow {
    /// Convert into the domain record, re-validating coordinates and enums.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if a stored value is out of range.
    pub fn into_record(self) -> Result<ArtisanRecord, CoreError> {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::try_new(lat, lon)?),
            _ => None,
        };
        Ok(ArtisanRecord {
            id: ArtisanId::from_uuid(self.id),
            full_name: self.full_name,
            phone: self.phone,
            email: self.email,
            password_hash: None,
            trade_type: TradeType::try_new(&self.trade_type)?,
            profile_photo: self.profile_photo,
            documents: ArtisanDocuments {
                id_card_url: self.id_card_url,
                skill_photo_url: self.skill_photo_url,
            },
            approval_status: self.status.parse::<ApprovalStatus>()?,
            available: self.is_available,
            location,
            rating: self.rating,
            review_count: u32::try_from(self.review_count).unwrap_or(0),
            suspended: self.is_suspended,
            created_at: self.created_at,
        })
    }
}

/// Partial profile update. `None` fields are left untouched; a new location
/// replaces latitude and longitude in the same statement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArtisanUpdate {
    pub location: Option<Coordinate>,
    pub is_available: Option<bool>,
}

impl ArtisanUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.is_available.is_none()
    }
}

pub(crate) const ARTISAN_COLUMNS: &str = "id, full_name, phone, email, trade_type, profile_photo, \
     id_card_url, skill_photo_url, latitude, longitude, is_available, rating, \
     review_count, is_suspended, status, created_at, updated_at";
