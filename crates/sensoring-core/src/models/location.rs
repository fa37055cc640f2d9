use serde::{Deserialize, Serialize};

use crate::rounding::{coordinate_from_hundredths, round_coordinate};

/// Geographic position in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Collect range violations for this position.
    ///
    /// Latitude must be within [-90, 90] and longitude within [-180, 180].
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            issues.push("latitude must be between -90 and 90.".to_string());
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            issues.push("longitude must be between -180 and 180.".to_string());
        }

        issues
    }

    pub fn is_valid(&self) -> bool {
        self.issues().is_empty()
    }

    /// Snap this position onto the two-decimal bucket grid
    pub fn rounded(&self) -> Self {
        Self {
            latitude: coordinate_from_hundredths(round_coordinate(self.latitude)),
            longitude: coordinate_from_hundredths(round_coordinate(self.longitude)),
        }
    }
}
