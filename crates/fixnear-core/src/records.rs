//! Artisan and review records as the matching core sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Coordinate, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtisanId(Uuid);

impl ArtisanId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ArtisanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArtisanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ArtisanId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| CoreError::InvalidArtisanId(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(Uuid);

impl ReviewId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

/// The category of service an artisan offers, e.g. `"plumber"`.
///
/// Normalized to trimmed lowercase so `"Plumber "` and `"plumber"` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TradeType(String);

impl TradeType {
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyTradeType`] if the value is blank.
    pub fn try_new(value: &str) -> Result<Self, CoreError> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::EmptyTradeType);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TradeType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(&value)
    }
}

impl From<TradeType> for String {
    fn from(t: TradeType) -> Self {
        t.0
    }
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Suspended,
}

impl ApprovalStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "suspended" => Ok(ApprovalStatus::Suspended),
            other => Err(CoreError::InvalidApprovalStatus(other.to_string())),
        }
    }
}

/// A single review score, 1 through 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRating`] outside `1..=5`.
    pub fn try_new(value: i64) -> Result<Self, CoreError> {
        match u8::try_from(value) {
            Ok(v @ 1..=5) => Ok(Self(v)),
            _ => Err(CoreError::InvalidRating(value)),
        }
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> Self {
        r.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtisanDocuments {
    pub id_card_url: Option<String>,
    pub skill_photo_url: Option<String>,
}

/// An artisan as read from the directory.
///
/// `rating` and `review_count` are only ever written by the rating
/// aggregator; everything else is owned by profile management.
#[derive(Clone, PartialEq)]
pub struct ArtisanRecord {
    pub id: ArtisanId,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    /// Present only when a backend leaks it; never serialized outward.
    pub password_hash: Option<String>,
    pub trade_type: TradeType,
    pub profile_photo: Option<String>,
    pub documents: ArtisanDocuments,
    pub approval_status: ApprovalStatus,
    pub available: bool,
    pub location: Option<Coordinate>,
    pub rating: f64,
    pub review_count: u32,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for ArtisanRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtisanRecord")
            .field("id", &self.id)
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .field("email", &self.email)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "[redacted]"),
            )
            .field("trade_type", &self.trade_type)
            .field("profile_photo", &self.profile_photo)
            .field("documents", &self.documents)
            .field("approval_status", &self.approval_status)
            .field("available", &self.available)
            .field("location", &self.location)
            .field("rating", &self.rating)
            .field("review_count", &self.review_count)
            .field("suspended", &self.suspended)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub artisan_id: ArtisanId,
    pub user_id: Uuid,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An artisan's average rating together with the sample size it came from.
///
/// The two fields are always written together so the count matches the
/// reviews the average was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub review_count: u32,
}

impl RatingAggregate {
    pub const EMPTY: Self = Self {
        average_rating: 0.0,
        review_count: 0,
    };
}
