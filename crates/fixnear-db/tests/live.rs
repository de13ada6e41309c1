//! Live integration tests for fixnear-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/fixnear-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::sync::Arc;

use fixnear_core::{
    ApprovalStatus, ArtisanDocuments, ArtisanId, ArtisanSeed, Coordinate, Rating,
    RatingAggregate, TradeType,
};
use fixnear_db::{
    apply_artisan_update, get_artisan, insert_review, list_artisans, list_reviews_for_artisan,
    seed_artisans, set_artisan_status, write_rating_aggregate, AggregateWrite, ArtisanUpdate,
    NewReview, PgArtisanDirectory, PgReviewStore,
};
use fixnear_matching::{
    ArtisanMatcher, CandidateHint, EmergencyRequest, MatchError, MatchPolicy, NearbyRequest,
    RatingAggregator,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn seed(email: &str, trade: &str, lat: f64, lon: f64) -> ArtisanSeed {
    ArtisanSeed {
        full_name: format!("Artisan {email}"),
        phone: "+2348000000000".to_string(),
        email: email.to_string(),
        trade_type: TradeType::try_new(trade).expect("trade"),
        status: ApprovalStatus::Approved,
        is_available: true,
        is_suspended: false,
        location: Some(Coordinate::try_new(lat, lon).expect("coordinate")),
        profile_photo: None,
        documents: ArtisanDocuments::default(),
    }
}

async fn id_by_email(pool: &sqlx::PgPool, email: &str) -> ArtisanId {
    let id: Uuid = sqlx::query_scalar("SELECT id FROM artisans WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("id_by_email failed for '{email}': {e}"));
    ArtisanId::from_uuid(id)
}

fn new_review(artisan_id: ArtisanId, stars: i64) -> NewReview {
    NewReview {
        artisan_id,
        user_id: Uuid::new_v4(),
        rating: Rating::try_new(stars).expect("rating"),
        comment: Some("  good work  ".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Section 1: Seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_inserts_then_updates_by_email(pool: sqlx::PgPool) {
    let first = seed_artisans(&pool, &[seed("a@example.com", "plumber", 6.53, 3.38)])
        .await
        .expect("seed");
    assert_eq!(first.inserted, 1);
    assert_eq!(first.updated, 0);

    let changed = seed("A@Example.com", "tiler", 6.53, 3.38);
    let second = seed_artisans(&pool, &[changed]).await.expect("reseed");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 1);

    let id = id_by_email(&pool, "a@example.com").await;
    let row = get_artisan(&pool, id).await.expect("get").expect("exists");
    assert_eq!(row.trade_type, "tiler");
}

// ---------------------------------------------------------------------------
// Section 2: Candidate listing and matching
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_artisans_pushes_hint_down(pool: sqlx::PgPool) {
    let mut pending = seed("pending@example.com", "electrician", 6.531, 3.38);
    pending.status = ApprovalStatus::Pending;
    let mut homeless = seed("homeless@example.com", "electrician", 0.0, 0.0);
    homeless.location = None;
    seed_artisans(
        &pool,
        &[
            seed("near@example.com", "electrician", 6.53, 3.38),
            seed("far@example.com", "electrician", 9.05, 7.49),
            pending,
            homeless,
        ],
    )
    .await
    .expect("seed");

    let query = MatchPolicy::default()
        .nearby_query(&NearbyRequest {
            latitude: 6.5244,
            longitude: 3.3792,
            trade_type: None,
            radius_km: Some(5.0),
        })
        .expect("query");
    let rows = list_artisans(&pool, &query.hint()).await.expect("list");
    let emails: Vec<&str> = rows.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, vec!["near@example.com"]);

    let all = list_artisans(&pool, &CandidateHint::default())
        .await
        .expect("list all");
    assert_eq!(all.len(), 4);
}

#[sqlx::test(migrations = "../../migrations")]
async fn antimeridian_boxes_are_split(pool: sqlx::PgPool) {
    seed_artisans(
        &pool,
        &[
            seed("east@example.com", "electrician", 0.0, 179.99),
            seed("west@example.com", "electrician", 0.0, -179.99),
            seed("greenwich@example.com", "electrician", 0.0, 0.0),
        ],
    )
    .await
    .expect("seed");

    let matcher = ArtisanMatcher::new(
        Arc::new(PgArtisanDirectory::new(pool.clone())),
        MatchPolicy::default(),
    );
    let results = matcher
        .find_nearby(&NearbyRequest {
            latitude: 0.0,
            longitude: 179.995,
            trade_type: None,
            radius_km: Some(5.0),
        })
        .await
        .expect("search");
    assert_eq!(results.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn emergency_search_over_postgres(pool: sqlx::PgPool) {
    let mut busy = seed("busy@example.com", "plumber", 6.5245, 3.3792);
    busy.is_available = false;
    seed_artisans(
        &pool,
        &[
            busy,
            seed("one@example.com", "plumber", 6.53, 3.38),
            seed("two@example.com", "tiler", 6.54, 3.38),
            seed("three@example.com", "electrician", 6.55, 3.38),
            seed("four@example.com", "plumber", 6.56, 3.38),
        ],
    )
    .await
    .expect("seed");

    let matcher = ArtisanMatcher::new(
        Arc::new(PgArtisanDirectory::new(pool.clone())),
        MatchPolicy::default(),
    );
    let results = matcher
        .find_nearest_k(&EmergencyRequest {
            latitude: 6.5244,
            longitude: 3.3792,
            ..EmergencyRequest::default()
        })
        .await
        .expect("search");

    let emails: Vec<&str> = results.iter().map(|r| r.artisan.email.as_str()).collect();
    assert_eq!(
        emails,
        vec!["one@example.com", "two@example.com", "three@example.com"]
    );
}

// ---------------------------------------------------------------------------
// Section 3: Updates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn apply_update_moves_and_toggles(pool: sqlx::PgPool) {
    seed_artisans(&pool, &[seed("mover@example.com", "plumber", 6.53, 3.38)])
        .await
        .expect("seed");
    let id = id_by_email(&pool, "mover@example.com").await;

    let update = ArtisanUpdate {
        location: Some(Coordinate::try_new(9.05, 7.49).expect("coordinate")),
        is_available: Some(false),
    };
    let row = apply_artisan_update(&pool, id, &update)
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(row.latitude, Some(9.05));
    assert_eq!(row.longitude, Some(7.49));
    assert!(!row.is_available);

    let row = apply_artisan_update(
        &pool,
        id,
        &ArtisanUpdate {
            is_available: Some(true),
            ..ArtisanUpdate::default()
        },
    )
    .await
    .expect("update")
    .expect("exists");
    assert_eq!(row.latitude, Some(9.05));
    assert!(row.is_available);

    let missing = apply_artisan_update(&pool, ArtisanId::new(), &update)
        .await
        .expect("update");
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn set_status_approves_and_reports_missing(pool: sqlx::PgPool) {
    let mut pending = seed("pending@example.com", "plumber", 6.53, 3.38);
    pending.status = ApprovalStatus::Pending;
    seed_artisans(&pool, &[pending]).await.expect("seed");
    let id = id_by_email(&pool, "pending@example.com").await;

    let row = set_artisan_status(&pool, id, ApprovalStatus::Approved)
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(row.status, "approved");

    let missing = set_artisan_status(&pool, ArtisanId::new(), ApprovalStatus::Suspended)
        .await
        .expect("update");
    assert!(missing.is_none());
}

// ---------------------------------------------------------------------------
// Section 4: Reviews and rating aggregation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn recompute_rating_from_reviews(pool: sqlx::PgPool) {
    seed_artisans(&pool, &[seed("rated@example.com", "plumber", 6.53, 3.38)])
        .await
        .expect("seed");
    let id = id_by_email(&pool, "rated@example.com").await;

    for stars in [5, 3, 4] {
        insert_review(&pool, &new_review(id, stars))
            .await
            .expect("insert review");
    }

    let aggregator = RatingAggregator::new(
        Arc::new(PgArtisanDirectory::new(pool.clone())),
        Arc::new(PgReviewStore::new(pool.clone())),
    );
    let aggregate = aggregator.recompute(id).await.expect("recompute");
    assert!((aggregate.average_rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(aggregate.review_count, 3);

    let row = get_artisan(&pool, id).await.expect("get").expect("exists");
    assert!((row.rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(row.review_count, 3);

    let reviews = list_reviews_for_artisan(&pool, id).await.expect("list");
    assert_eq!(reviews.len(), 3);
    assert!(reviews
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
    assert_eq!(reviews[0].comment.as_deref(), Some("good work"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn recompute_with_no_reviews_is_zero(pool: sqlx::PgPool) {
    seed_artisans(&pool, &[seed("fresh@example.com", "plumber", 6.53, 3.38)])
        .await
        .expect("seed");
    let id = id_by_email(&pool, "fresh@example.com").await;

    let aggregator = RatingAggregator::new(
        Arc::new(PgArtisanDirectory::new(pool.clone())),
        Arc::new(PgReviewStore::new(pool.clone())),
    );
    let aggregate = aggregator.recompute(id).await.expect("recompute");
    assert_eq!(aggregate.review_count, 0);
    assert!(aggregate.average_rating.abs() < f64::EPSILON);
}

#[sqlx::test(migrations = "../../migrations")]
async fn recompute_for_missing_artisan_is_not_found(pool: sqlx::PgPool) {
    let aggregator = RatingAggregator::new(
        Arc::new(PgArtisanDirectory::new(pool.clone())),
        Arc::new(PgReviewStore::new(pool.clone())),
    );
    let err = aggregator
        .recompute(ArtisanId::new())
        .await
        .expect_err("missing artisan");
    assert!(matches!(err, MatchError::ArtisanNotFound(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn review_for_missing_artisan_violates_foreign_key(pool: sqlx::PgPool) {
    let err = insert_review(&pool, &new_review(ArtisanId::new(), 5))
        .await
        .expect_err("fk violation");
    let code = err
        .as_database_error()
        .and_then(|e| e.code())
        .map(|c| c.to_string());
    assert_eq!(code.as_deref(), Some("23503"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn aggregate_from_older_sample_is_not_written(pool: sqlx::PgPool) {
    seed_artisans(&pool, &[seed("busy@example.com", "plumber", 6.53, 3.38)])
        .await
        .expect("seed");
    let id = id_by_email(&pool, "busy@example.com").await;
    insert_review(&pool, &new_review(id, 5)).await.expect("review");
    insert_review(&pool, &new_review(id, 3)).await.expect("review");

    let older = RatingAggregate {
        average_rating: 5.0,
        review_count: 1,
    };
    let outcome = write_rating_aggregate(&pool, id, older).await.expect("write");
    assert_eq!(outcome, AggregateWrite::Stale);
    let row = get_artisan(&pool, id).await.expect("get").expect("exists");
    assert_eq!(row.review_count, 0);

    let current = RatingAggregate {
        average_rating: 4.0,
        review_count: 2,
    };
    let outcome = write_rating_aggregate(&pool, id, current).await.expect("write");
    assert_eq!(outcome, AggregateWrite::Written);
    let row = get_artisan(&pool, id).await.expect("get").expect("exists");
    assert_eq!(row.review_count, 2);
    assert!((row.rating - 4.0).abs() < f64::EPSILON);

    let outcome = write_rating_aggregate(&pool, ArtisanId::new(), RatingAggregate::EMPTY)
        .await
        .expect("write");
    assert_eq!(outcome, AggregateWrite::Missing);
}
