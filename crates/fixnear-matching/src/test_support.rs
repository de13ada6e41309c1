use chrono::Utc;
use fixnear_core::{ApprovalStatus, ArtisanDocuments, ArtisanId, ArtisanRecord, Coordinate, TradeType};

/// Approved, available electrician at the given point.
pub(crate) fn artisan_at(lat: f64, lon: f64) -> ArtisanRecord {
    ArtisanRecord {
        id: ArtisanId::new(),
        full_name: "Test Artisan".to_string(),
        phone: "+2348000000000".to_string(),
        email: "test@example.com".to_string(),
        password_hash: None,
        trade_type: TradeType::try_new("electrician").unwrap(),
        profile_photo: None,
        documents: ArtisanDocuments::default(),
        approval_status: ApprovalStatus::Approved,
        available: true,
        location: Some(Coordinate::try_new(lat, lon).unwrap()),
        rating: 0.0,
        review_count: 0,
        suspended: false,
        created_at: Utc::now(),
    }
}
