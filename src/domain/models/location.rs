use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the earth's surface, in degrees.
///
/// Altitude is carried because the game API expects a full position triple,
/// but the scanner always queries at ground level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90.0 to 90.0)
    pub latitude: f64,
    /// Longitude in degrees (-180.0 to 180.0)
    pub longitude: f64,
    /// Altitude in metres
    #[serde(default)]
    pub altitude: f64,
}

impl Coordinate {
    /// Create a ground-level coordinate
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// One generated scan position.
///
/// `step` is 1-based within its iteration; `ring` is the hex-ring radius
/// the point belongs to (ring 0 is the scan origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationStep {
    pub step: usize,
    pub ring: u32,
    pub coordinate: Coordinate,
}
