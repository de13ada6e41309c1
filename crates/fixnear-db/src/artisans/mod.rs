//! Database operations for the `artisans` table.

mod read;
mod types;
mod write;

pub use read::{get_artisan, list_artisans};
pub use types::{ArtisanRow, ArtisanUpdate};
pub use write::{
    apply_artisan_update, set_artisan_status, upsert_artisan_seed, write_rating_aggregate,
    AggregateWrite,
};
