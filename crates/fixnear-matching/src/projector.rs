//! Outward representation of artisans and match results.
//!
//! Locations are emitted as GeoJSON points, which are longitude first:
//! `{"type": "Point", "coordinates": [lng, lat]}`.

use fixnear_core::{ApprovalStatus, ArtisanDocuments, ArtisanId, ArtisanRecord, Coordinate, Distance};
use serde::Serialize;

use crate::matcher::{AdminListing, MatchResult};

/// Who a view is rendered for. Only admins see verification documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Public,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[longitude, latitude]`.
    pub coordinates: [f64; 2],
}

impl From<Coordinate> for GeoJsonPoint {
    fn from(c: Coordinate) -> Self {
        Self {
            kind: "Point",
            coordinates: c.lng_lat(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtisanView {
    pub id: ArtisanId,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub trade_type: String,
    pub profile_photo: Option<String>,
    pub status: ApprovalStatus,
    pub is_available: bool,
    pub is_suspended: bool,
    pub rating: f64,
    pub review_count: u32,
    pub location: Option<GeoJsonPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<ArtisanDocuments>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Distance in kilometers rounded to three decimals (whole meters).
#[must_use]
pub fn round_km(distance: Distance) -> f64 {
    (distance.km() * 1000.0).round() / 1000.0
}

/// Project a record, dropping credentials and audience-restricted fields.
#[must_use]
pub fn project(artisan: &ArtisanRecord, audience: Audience) -> ArtisanView {
    ArtisanView {
        id: artisan.id,
        full_name: artisan.full_name.clone(),
        phone: artisan.phone.clone(),
        email: artisan.email.clone(),
        trade_type: artisan.trade_type.as_str().to_string(),
        profile_photo: artisan.profile_photo.clone(),
        status: artisan.approval_status,
        is_available: artisan.available,
        is_suspended: artisan.suspended,
        rating: artisan.rating,
        review_count: artisan.review_count,
        location: artisan.location.map(GeoJsonPoint::from),
        documents: match audience {
            Audience::Admin => Some(artisan.documents.clone()),
            Audience::Public => None,
        },
        distance_km: None,
    }
}

#[must_use]
pub fn project_match(result: &MatchResult, audience: Audience) -> ArtisanView {
    ArtisanView {
        distance_km: Some(round_km(result.distance)),
        ..project(&result.artisan, audience)
    }
}

#[must_use]
pub fn project_matches(results: &[MatchResult], audience: Audience) -> Vec<ArtisanView> {
    results.iter().map(|r| project_match(r, audience)).collect()
}

#[must_use]
pub fn project_admin_listing(listing: &AdminListing) -> Vec<ArtisanView> {
    match listing {
        AdminListing::Ranked(results) => project_matches(results, Audience::Admin),
        AdminListing::Unranked(artisans) => artisans
            .iter()
            .map(|a| project(a, Audience::Admin))
            .collect(),
    }
}
