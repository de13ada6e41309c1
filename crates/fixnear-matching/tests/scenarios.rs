use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fixnear_core::{
    ApprovalStatus, ArtisanDocuments, ArtisanId, ArtisanRecord, Coordinate, RatingAggregate,
    TradeType,
};
use fixnear_matching::{
    haversine, AdminListing, AdminSearchRequest, ArtisanDirectory, ArtisanMatcher,
    CandidateHint, DirectoryError, EmergencyRequest, InMemoryDirectory, MatchError, MatchPolicy,
    NearbyRequest,
};

const LAGOS: (f64, f64) = (6.5244, 3.3792);

fn artisan(trade: &str, lat: f64, lon: f64) -> ArtisanRecord {
    ArtisanRecord {
        id: ArtisanId::new(),
        full_name: format!("{trade} at {lat},{lon}"),
        phone: "+2348000000000".to_string(),
        email: format!("{lat}-{lon}@example.com"),
        password_hash: Some("hash".to_string()),
        trade_type: TradeType::try_new(trade).unwrap(),
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

/// Point `km` kilometers due east of the equator/prime-meridian origin.
fn east_of_origin(km: f64) -> (f64, f64) {
    (0.0, (km / fixnear_matching::EARTH_RADIUS_KM).to_degrees())
}

fn matcher_over(artisans: Vec<ArtisanRecord>) -> ArtisanMatcher {
    ArtisanMatcher::new(
        Arc::new(InMemoryDirectory::with_artisans(artisans)),
        MatchPolicy::default(),
    )
}

fn nearby(lat: f64, lng: f64, trade: Option<&str>, radius_km: Option<f64>) -> NearbyRequest {
    NearbyRequest {
        latitude: lat,
        longitude: lng,
        trade_type: trade.map(|t| TradeType::try_new(t).unwrap()),
        radius_km,
    }
}

/// Directory that counts reads and can be told to fail.
#[derive(Default)]
struct ProbeDirectory {
    reads: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl ArtisanDirectory for ProbeDirectory {
    async fn list_candidates(
        &self,
        _hint: &CandidateHint,
    ) -> Result<Vec<ArtisanRecord>, DirectoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DirectoryError::backend(std::io::Error::other(
                "connection refused",
            )));
        }
        Ok(vec![artisan("electrician", LAGOS.0, LAGOS.1)])
    }

    async fn write_aggregate(
        &self,
        id: ArtisanId,
        _aggregate: RatingAggregate,
    ) -> Result<(), DirectoryError> {
        Err(DirectoryError::NotFound(id))
    }
}

#[tokio::test]
async fn basic_nearby_search_in_lagos() {
    let a = artisan("electrician", 6.5300, 3.3800);
    let b = artisan("electrician", 6.6000, 3.4000);
    let matcher = matcher_over(vec![b, a.clone()]);

    let results = matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, None, Some(5.0)))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].artisan.id, a.id);
    let km = results[0].distance.km();
    assert!((km - 0.7).abs() <= 0.2, "got {km}");
}

#[tokio::test]
async fn default_radius_is_ten_km() {
    let b = artisan("electrician", 6.6000, 3.4000);
    let far = artisan("electrician", 6.7000, 3.4000);
    let matcher = matcher_over(vec![b.clone(), far]);

    let results = matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, None, None))
        .await
        .unwrap();
    let ids: Vec<ArtisanId> = results.iter().map(|r| r.artisan.id).collect();
    assert_eq!(ids, vec![b.id]);
}

#[tokio::test]
async fn radius_boundary_is_inclusive() {
    let target = artisan("electrician", 6.6000, 3.4000);
    let origin = Coordinate::try_new(LAGOS.0, LAGOS.1).unwrap();
    let exact = haversine(origin, target.location.unwrap()).km();
    let matcher = matcher_over(vec![target.clone()]);

    let results = matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, None, Some(exact)))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].artisan.id, target.id);
}

#[tokio::test]
async fn filters_are_conjunctive() {
    let plumber = artisan("plumber", 6.525, 3.380);
    let electrician = artisan("electrician", 6.526, 3.380);
    let mut pending_plumber = artisan("plumber", 6.527, 3.380);
    pending_plumber.approval_status = ApprovalStatus::Pending;
    let mut suspended_plumber = artisan("plumber", 6.528, 3.380);
    suspended_plumber.approval_status = ApprovalStatus::Suspended;
    let matcher = matcher_over(vec![
        electrician,
        pending_plumber,
        suspended_plumber,
        plumber.clone(),
    ]);

    let results = matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, Some("plumber"), Some(10.0)))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    for r in &results {
        assert_eq!(r.artisan.trade_type.as_str(), "plumber");
        assert_eq!(r.artisan.approval_status, ApprovalStatus::Approved);
    }
    assert_eq!(results[0].artisan.id, plumber.id);
}

#[tokio::test]
async fn results_are_sorted_ascending() {
    let artisans: Vec<ArtisanRecord> = [0.05, 0.01, 0.09, 0.03, 0.07]
        .iter()
        .map(|d| artisan("electrician", LAGOS.0 + d, LAGOS.1))
        .collect();
    let matcher = matcher_over(artisans);

    let results = matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, None, Some(50.0)))
        .await
        .unwrap();
    assert_eq!(results.len(), 5);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn emergency_returns_three_closest_in_order() {
    let artisans: Vec<ArtisanRecord> = [4.0, 2.0, 5.0, 1.0, 3.0]
        .iter()
        .map(|km| {
            let (lat, lon) = east_of_origin(*km);
            artisan("electrician", lat, lon)
        })
        .collect();
    let matcher = matcher_over(artisans);

    let results = matcher
        .find_nearest_k(&EmergencyRequest {
            latitude: 0.0,
            longitude: 0.0,
            ..EmergencyRequest::default()
        })
        .await
        .unwrap();

    let kms: Vec<f64> = results.iter().map(|r| r.distance.km()).collect();
    assert_eq!(kms.len(), 3);
    for (got, want) in kms.iter().zip([1.0, 2.0, 3.0]) {
        assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
    }
}

#[tokio::test]
async fn emergency_with_fewer_than_k_returns_all_qualifying() {
    let (lat, lon) = east_of_origin(1.0);
    let near = artisan("electrician", lat, lon);
    let mut unavailable = artisan("electrician", lat, lon);
    unavailable.available = false;
    let (lat, lon) = east_of_origin(25.0);
    let beyond_bound = artisan("electrician", lat, lon);
    let matcher = matcher_over(vec![near.clone(), unavailable, beyond_bound]);

    let results = matcher
        .find_nearest_k(&EmergencyRequest {
            latitude: 0.0,
            longitude: 0.0,
            k: Some(3),
            max_radius_km: None,
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].artisan.id, near.id);
}

#[tokio::test]
async fn empty_directory_is_not_an_error() {
    let matcher = matcher_over(Vec::new());
    assert!(matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, None, None))
        .await
        .unwrap()
        .is_empty());
    assert!(matcher
        .find_nearest_k(&EmergencyRequest {
            latitude: LAGOS.0,
            longitude: LAGOS.1,
            ..EmergencyRequest::default()
        })
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn invalid_origin_never_reaches_directory() {
    let probe = Arc::new(ProbeDirectory::default());
    let matcher = ArtisanMatcher::new(probe.clone(), MatchPolicy::default());

    let err = matcher
        .find_nearby(&nearby(200.0, 0.0, None, None))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidCoordinate { .. }));

    let err = matcher
        .find_nearest_k(&EmergencyRequest {
            latitude: 0.0,
            longitude: 0.0,
            k: Some(0),
            max_radius_km: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidQuery(_)));

    let err = matcher
        .find_nearby(&nearby(0.0, 0.0, None, Some(-1.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidQuery(_)));

    assert_eq!(probe.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn directory_failure_aborts_the_query() {
    let probe = Arc::new(ProbeDirectory {
        fail: true,
        ..ProbeDirectory::default()
    });
    let matcher = ArtisanMatcher::new(probe.clone(), MatchPolicy::default());

    let err = matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, None, None))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::DirectoryUnavailable(_)));
    assert_eq!(probe.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn admin_search_sees_every_status() {
    let approved = artisan("plumber", 6.525, 3.380);
    let mut pending = artisan("plumber", 6.526, 3.380);
    pending.approval_status = ApprovalStatus::Pending;
    let mut suspended = artisan("tiler", 6.527, 3.380);
    suspended.suspended = true;
    let matcher = matcher_over(vec![approved, pending.clone(), suspended]);

    let listing = matcher
        .find_for_admin(&AdminSearchRequest {
            latitude: Some(LAGOS.0),
            longitude: Some(LAGOS.1),
            ..AdminSearchRequest::default()
        })
        .await
        .unwrap();
    assert!(matches!(listing, AdminListing::Ranked(ref r) if r.len() == 3));

    let listing = matcher
        .find_for_admin(&AdminSearchRequest {
            status: Some(ApprovalStatus::Pending),
            ..AdminSearchRequest::default()
        })
        .await
        .unwrap();
    match listing {
        AdminListing::Unranked(artisans) => {
            assert_eq!(artisans.len(), 1);
            assert_eq!(artisans[0].id, pending.id);
        }
        AdminListing::Ranked(_) => panic!("expected an unranked listing"),
    }
}

#[tokio::test]
async fn distances_are_recomputed_per_origin() {
    let a = artisan("electrician", 6.53, 3.38);
    let matcher = matcher_over(vec![a.clone()]);
    let from_lagos = matcher
        .find_nearby(&nearby(LAGOS.0, LAGOS.1, None, Some(50.0)))
        .await
        .unwrap();
    let from_ikeja = matcher
        .find_nearby(&nearby(6.6018, 3.3515, None, Some(50.0)))
        .await
        .unwrap();
    assert!((from_lagos[0].distance.km() - from_ikeja[0].distance.km()).abs() > 1.0);

    let origin = Coordinate::try_new(6.6018, 3.3515).unwrap();
    let expected = haversine(origin, a.location.unwrap()).km();
    assert!((from_ikeja[0].distance.km() - expected).abs() < 1e-9);
}
