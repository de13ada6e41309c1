//! Grid-bucketed spatial index over artisan locations.
//!
//! Points are bucketed into fixed-size lat/lng cells. A query converts its
//! radius into a [`BoundingBox`] around the spherical cap, scans only the
//! cells the box touches, and then confirms every candidate with the exact
//! haversine distance. The grid is only a prefilter: membership is always
//! decided by `haversine(origin, point) <= radius`, boundary inclusive.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use fixnear_core::{ArtisanId, Coordinate, Distance};

use crate::distance::{angular_radius, haversine};

/// Default cell edge in degrees (~55 km at the equator).
pub const DEFAULT_CELL_DEGREES: f64 = 0.5;

/// Slack added to box edges so float error never drops a boundary point.
const BOX_PADDING_DEGREES: f64 = 1e-6;

/// Axis-aligned lat/lng box enclosing a spherical cap.
///
/// When the cap straddles the antimeridian `min_longitude > max_longitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Box around the cap of `radius_km` centered on `origin`.
    ///
    /// Returns `None` when the cap contains a pole (every longitude is then
    /// reachable) or the radius is not a usable positive number.
    #[must_use]
    pub fn around(origin: Coordinate, radius_km: f64) -> Option<Self> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return None;
        }

        let angle = angular_radius(radius_km);
        let angle_deg = angle.to_degrees() + BOX_PADDING_DEGREES;
        let min_latitude = origin.latitude() - angle_deg;
        let max_latitude = origin.latitude() + angle_deg;
        if min_latitude <= -90.0 || max_latitude >= 90.0 {
            return None;
        }

        // Widest longitude offset on the cap; valid because the cap stays
        // clear of both poles here.
        let ratio = (angle.sin() / origin.latitude().to_radians().cos()).min(1.0);
        let d_lon = ratio.asin().to_degrees() + BOX_PADDING_DEGREES;
        if d_lon >= 180.0 {
            return Some(Self {
                min_latitude,
                max_latitude,
                min_longitude: -180.0,
                max_longitude: 180.0,
            });
        }

        let mut min_longitude = origin.longitude() - d_lon;
        let mut max_longitude = origin.longitude() + d_lon;
        if min_longitude < -180.0 {
            min_longitude += 360.0;
        }
        if max_longitude > 180.0 {
            max_longitude -= 360.0;
        }

        Some(Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        })
    }

    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_longitude > self.max_longitude
    }

    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        let lat_ok = (self.min_latitude..=self.max_latitude).contains(&point.latitude());
        let lon = point.longitude();
        let lon_ok = if self.crosses_antimeridian() {
            lon >= self.min_longitude || lon <= self.max_longitude
        } else {
            (self.min_longitude..=self.max_longitude).contains(&lon)
        };
        lat_ok && lon_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    pub id: ArtisanId,
    pub location: Coordinate,
    /// Position of this entry in the sequence the index was built from.
    pub position: usize,
}

/// A point within a query radius, annotated with its exact distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub id: ArtisanId,
    pub position: usize,
    pub distance: Distance,
}

type CellKey = (usize, usize);

/// Immutable spatial index. Rebuild (and swap) to reflect location changes.
#[derive(Debug, Clone)]
pub struct GeoIndex {
    entries: Vec<IndexEntry>,
    cells: HashMap<CellKey, Vec<usize>>,
    cell_degrees: f64,
    lat_cells: usize,
    lon_cells: usize,
}

impl Default for GeoIndex {
    fn default() -> Self {
        Self::build(std::iter::empty())
    }
}

impl GeoIndex {
    /// Build an index with [`DEFAULT_CELL_DEGREES`] cells.
    ///
    /// Items without a location are skipped, but positions still count them,
    /// so a [`Hit::position`] always points back into the caller's sequence.
    pub fn build<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (ArtisanId, Option<Coordinate>)>,
    {
        Self::build_with_cell_size(items, DEFAULT_CELL_DEGREES)
    }

    /// Build with a custom cell edge. Non-positive or non-finite sizes fall
    /// back to the default.
    pub fn build_with_cell_size<I>(items: I, cell_degrees: f64) -> Self
    where
        I: IntoIterator<Item = (ArtisanId, Option<Coordinate>)>,
    {
        let cell_degrees = if cell_degrees.is_finite() && cell_degrees > 0.0 {
            cell_degrees
        } else {
            DEFAULT_CELL_DEGREES
        };
        let mut index = Self {
            entries: Vec::new(),
            cells: HashMap::new(),
            cell_degrees,
            lat_cells: cell_count(180.0, cell_degrees),
            lon_cells: cell_count(360.0, cell_degrees),
        };

        for (position, (id, location)) in items.into_iter().enumerate() {
            let Some(location) = location else {
                continue;
            };
            let slot = index.entries.len();
            index.entries.push(IndexEntry {
                id,
                location,
                position,
            });
            let key = index.cell_of(location);
            index.cells.entry(key).or_default().push(slot);
        }

        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Every indexed point within `radius_km` of `origin`, boundary inclusive,
    /// in build order.
    #[must_use]
    pub fn within_radius(&self, origin: Coordinate, radius_km: f64) -> Vec<Hit> {
        if radius_km.is_nan() || radius_km < 0.0 {
            return Vec::new();
        }
        self.candidate_slots(origin, radius_km)
            .into_iter()
            .filter_map(|slot| {
                let entry = &self.entries[slot];
                let distance = haversine(origin, entry.location);
                (distance.km() <= radius_km).then_some(Hit {
                    id: entry.id,
                    position: entry.position,
                    distance,
                })
            })
            .collect()
    }

    /// The `k` nearest points within `radius_km`, ascending by distance.
    /// Equidistant points keep build order.
    #[must_use]
    pub fn nearest_within(&self, origin: Coordinate, radius_km: f64, k: usize) -> Vec<Hit> {
        if k == 0 {
            return Vec::new();
        }

        // Max-heap of the best k seen so far; the root is the current worst.
        let mut heap: BinaryHeap<Ranked> = BinaryHeap::with_capacity(k + 1);
        for hit in self.within_radius(origin, radius_km) {
            let candidate = Ranked(hit);
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }

    /// Entry slots that may fall inside the cap, ascending.
    fn candidate_slots(&self, origin: Coordinate, radius_km: f64) -> Vec<usize> {
        let Some(bounds) = BoundingBox::around(origin, radius_km) else {
            return (0..self.entries.len()).collect();
        };

        let lat_range = self.lat_cell(bounds.min_latitude)..=self.lat_cell(bounds.max_latitude);
        let lon_ranges = if bounds.crosses_antimeridian() {
            vec![
                self.lon_cell(bounds.min_longitude)..=self.lon_cells - 1,
                0..=self.lon_cell(bounds.max_longitude),
            ]
        } else {
            vec![self.lon_cell(bounds.min_longitude)..=self.lon_cell(bounds.max_longitude)]
        };

        let lat_span = lat_range.clone().count();
        let lon_span: usize = lon_ranges.iter().map(|r| r.clone().count()).sum();

        let mut slots: Vec<usize> = if lat_span.saturating_mul(lon_span) > self.cells.len() {
            // Visiting empty cells would cost more than a linear scan.
            (0..self.entries.len())
                .filter(|&slot| bounds.contains(self.entries[slot].location))
                .collect()
        } else {
            let mut found = Vec::new();
            for lat in lat_range {
                for lon_range in &lon_ranges {
                    for lon in lon_range.clone() {
                        if let Some(bucket) = self.cells.get(&(lat, lon)) {
                            found.extend(
                                bucket
                                    .iter()
                                    .copied()
                                    .filter(|&slot| bounds.contains(self.entries[slot].location)),
                            );
                        }
                    }
                }
            }
            found
        };

        slots.sort_unstable();
        slots.dedup();
        slots
    }

    fn cell_of(&self, point: Coordinate) -> CellKey {
        (
            self.lat_cell(point.latitude()),
            self.lon_cell(point.longitude()),
        )
    }

    fn lat_cell(&self, latitude: f64) -> usize {
        cell_index(latitude + 90.0, self.cell_degrees, self.lat_cells)
    }

    fn lon_cell(&self, longitude: f64) -> usize {
        cell_index(longitude + 180.0, self.cell_degrees, self.lon_cells)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell_count(span_degrees: f64, cell_degrees: f64) -> usize {
    ((span_degrees / cell_degrees).ceil() as usize).max(1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell_index(offset_degrees: f64, cell_degrees: f64, cells: usize) -> usize {
    let raw = (offset_degrees / cell_degrees).floor().max(0.0) as usize;
    raw.min(cells - 1)
}

/// Orders hits by distance, then by build position.
#[derive(Debug, Clone, Copy)]
struct Ranked(Hit);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .meters()
            .total_cmp(&other.0.distance.meters())
            .then_with(|| self.0.position.cmp(&other.0.position))
    }
}
