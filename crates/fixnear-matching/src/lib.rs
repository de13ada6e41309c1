//! Geospatial artisan matching: distance, spatial index, filters, nearby and
//! emergency search, rating aggregation, and result projection.

pub mod directory;
pub mod distance;
pub mod error;
pub mod filter;
pub mod index;
pub mod matcher;
pub mod memory;
pub mod projector;
pub mod query;
pub mod rating;

#[cfg(test)]
mod test_support;

pub use directory::{
    ArtisanDirectory, BoxError, CandidateHint, DirectoryError, ReviewStore, ReviewStoreError,
    SpatialHint,
};
pub use distance::{distance_km, haversine, EARTH_RADIUS_KM};
pub use error::MatchError;
pub use filter::{Criterion, MatchFilter};
pub use index::{BoundingBox, GeoIndex, Hit};
pub use matcher::{rank, AdminListing, ArtisanMatcher, MatchResult};
pub use memory::{InMemoryDirectory, InMemoryReviewStore};
pub use projector::{
    project, project_admin_listing, project_match, project_matches, round_km, ArtisanView,
    Audience, GeoJsonPoint,
};
pub use query::{
    AdminSearchRequest, EmergencyRequest, MatchPolicy, MatchQuery, NearbyRequest, SearchMode,
    StatusPolicy,
};
pub use rating::{aggregate, RatingAggregator};
