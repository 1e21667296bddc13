//! Hex-ring step generator
//!
//! Produces the ordered list of positions covering `step_limit` concentric
//! hexagonal rings around a scan origin. Ring 0 is the origin itself; ring
//! `r` holds `6r` points, so `n` rings yield `3n² - 3n + 1` positions.
//!
//! Hexes are pointy-top. Neighbouring centres are `√3 · R` apart, where `R`
//! is the detection radius of one query, so adjacent detection circles
//! overlap just enough to leave no gaps. Ring `r` starts `r` steps
//! north-west of the origin and walks its perimeter clockwise, one bearing
//! per side. Every point is derived from the previous one with the
//! great-circle destination formula.

use std::f64::consts::PI;
use std::iter::FusedIterator;

use crate::domain::models::{Coordinate, LocationStep};

/// Mean earth radius used for all displacement maths, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// Detection radius of a single map query, in kilometres
pub const DEFAULT_DETECTION_RADIUS_KM: f64 = 0.07;

/// Largest ring count accepted from configuration or the command line
pub const MAX_STEP_LIMIT: u32 = 1_000;

const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Bearing from a ring's predecessor start to its own start point
const RING_START_BEARING: f64 = 330.0;

/// Bearings walked along the six sides of a ring, in order
const SIDE_BEARINGS: [f64; 6] = [90.0, 150.0, 210.0, 270.0, 330.0, 30.0];

/// Move `distance_km` from `from` along `bearing_deg` on a sphere.
///
/// Uses the spherical law of cosines destination formula, so the longitude
/// change grows with `1 / cos(latitude)` and the physical step stays
/// constant. The result's longitude is normalized to -180..180.
pub fn destination(from: Coordinate, bearing_deg: f64, distance_km: f64) -> Coordinate {
    let lat1 = from.latitude * DEG_TO_RAD;
    let lon1 = from.longitude * DEG_TO_RAD;
    let bearing = bearing_deg * DEG_TO_RAD;
    let angular_distance = distance_km / EARTH_RADIUS_KM;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_d = angular_distance.sin();
    let cos_d = angular_distance.cos();

    let lat2 = (sin_lat1 * cos_d + cos_lat1 * sin_d * bearing.cos()).asin();
    let lon2 = lon1 + (bearing.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2.sin());

    let mut longitude = lon2 * RAD_TO_DEG;
    if longitude > 180.0 {
        longitude -= 360.0;
    } else if longitude < -180.0 {
        longitude += 360.0;
    }

    Coordinate {
        latitude: lat2 * RAD_TO_DEG,
        longitude,
        altitude: from.altitude,
    }
}

/// Great-circle distance between two coordinates, in kilometres (haversine).
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude * DEG_TO_RAD;
    let lat2 = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Number of positions on ring `ring`
pub const fn ring_size(ring: u32) -> usize {
    if ring == 0 {
        1
    } else {
        6 * ring as usize
    }
}

/// Number of positions generated for `step_limit` rings: `3n² - 3n + 1`
///
/// Saturates at `usize::MAX` instead of overflowing.
pub const fn total_steps(step_limit: u32) -> usize {
    if step_limit == 0 {
        return 1;
    }
    let n = step_limit as usize;
    3usize
        .saturating_mul(n)
        .saturating_mul(n - 1)
        .saturating_add(1)
}

/// Hex grid geometry for a given detection radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexGrid {
    step_km: f64,
}

impl Default for HexGrid {
    fn default() -> Self {
        Self::new(DEFAULT_DETECTION_RADIUS_KM)
    }
}

impl HexGrid {
    /// Grid whose cells are detection circles of `detection_radius_km`
    pub fn new(detection_radius_km: f64) -> Self {
        Self {
            step_km: 3.0_f64.sqrt() * detection_radius_km,
        }
    }

    /// Distance between neighbouring hex centres, in kilometres
    pub const fn step_km(&self) -> f64 {
        self.step_km
    }

    /// Positions covering `step_limit` rings around `origin`
    pub const fn steps(&self, origin: Coordinate, step_limit: u32) -> LocationSteps {
        LocationSteps {
            step_km: self.step_km,
            step_limit,
            current: origin,
            emitted: 0,
            ring: 1,
            side: 0,
            side_step: 0,
        }
    }
}

/// Positions covering `step_limit` rings around `origin` on the default grid
///
/// The sequence is deterministic; call again for each scan iteration.
pub fn generate_location_steps(origin: Coordinate, step_limit: u32) -> LocationSteps {
    HexGrid::default().steps(origin, step_limit)
}

/// Iterator over the positions of one scan iteration
#[derive(Debug, Clone)]
pub struct LocationSteps {
    step_km: f64,
    step_limit: u32,
    current: Coordinate,
    emitted: usize,
    ring: u32,
    side: usize,
    side_step: u32,
}

impl LocationSteps {
    const fn total(&self) -> usize {
        total_steps(self.step_limit)
    }
}

impl Iterator for LocationSteps {
    type Item = LocationStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted == 0 {
            self.emitted = 1;
            return Some(LocationStep {
                step: 1,
                ring: 0,
                coordinate: self.current,
            });
        }

        if self.ring >= self.step_limit {
            return None;
        }

        // Entering a new ring: hop out from the previous ring's start point.
        if self.side == 0 && self.side_step == 0 {
            self.current = destination(self.current, RING_START_BEARING, self.step_km);
        }

        let ring = self.ring;
        self.current = destination(self.current, SIDE_BEARINGS[self.side], self.step_km);
        self.emitted += 1;

        self.side_step += 1;
        if self.side_step == ring {
            self.side_step = 0;
            self.side += 1;
            if self.side == SIDE_BEARINGS.len() {
                self.side = 0;
                self.ring += 1;
            }
        }

        Some(LocationStep {
            step: self.emitted,
            ring,
            coordinate: self.current,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.emitted);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LocationSteps {}

impl FusedIterator for LocationSteps {}
