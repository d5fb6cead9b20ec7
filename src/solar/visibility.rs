use serde::{Deserialize, Serialize};

use super::normalize_azimuth_delta;
use crate::domain::{keys, EffectiveConfig};

/// Angular range in which a window can see the sun.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityCone {
    /// Window facing azimuth (°)
    pub window_azimuth: f64,
    pub elevation_min: f64,
    pub elevation_max: f64,
    /// Offset from `window_azimuth`, usually negative (°)
    pub azimuth_min: f64,
    /// Offset from `window_azimuth`, usually positive (°)
    pub azimuth_max: f64,
}

impl Default for VisibilityCone {
    fn default() -> Self {
        Self {
            window_azimuth: 180.0,
            elevation_min: 0.0,
            elevation_max: 90.0,
            azimuth_min: -90.0,
            azimuth_max: 90.0,
        }
    }
}

impl VisibilityCone {
    /// Read the cone from a resolved configuration, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_effective(config: &EffectiveConfig) -> Self {
        let defaults = Self::default();
        Self {
            window_azimuth: config.number(keys::AZIMUTH, defaults.window_azimuth),
            elevation_min: config.number(keys::ELEVATION_MIN, defaults.elevation_min),
            elevation_max: config.number(keys::ELEVATION_MAX, defaults.elevation_max),
            azimuth_min: config.number(keys::AZIMUTH_MIN, defaults.azimuth_min),
            azimuth_max: config.number(keys::AZIMUTH_MAX, defaults.azimuth_max),
        }
    }

    /// Whether the sun at the given position falls inside the cone.
    pub fn contains(&self, sun_elevation: f64, sun_azimuth: f64) -> bool {
        if sun_elevation <= 0.0 {
            return false;
        }
        if sun_elevation < self.elevation_min || sun_elevation > self.elevation_max {
            return false;
        }
        let deviation = normalize_azimuth_delta(sun_azimuth - self.window_azimuth);
        deviation >= self.azimuth_min && deviation <= self.azimuth_max
    }
}

/// Visibility check against a resolved configuration.
pub fn is_visible(sun_elevation: f64, sun_azimuth: f64, config: &EffectiveConfig) -> bool {
    VisibilityCone::from_effective(config).contains(sun_elevation, sun_azimuth)
}
