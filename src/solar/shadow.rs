//! Geometric shadow attenuation from an overhang-like shadow caster.

use serde::{Deserialize, Serialize};

use super::normalize_azimuth_delta;

/// Strongest attenuation a shadow can apply.
pub const MIN_SHADOW_FACTOR: f64 = 0.1;

/// Lower bound for tan(elevation) when projecting the shadow.
const MIN_TAN_ELEVATION: f64 = 1e-3;

/// Sun and shadow-caster geometry for one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowGeometry {
    /// Sun elevation (°)
    pub sun_elevation: f64,
    /// Sun azimuth (°)
    pub sun_azimuth: f64,
    /// Window facing azimuth (°)
    pub window_azimuth: f64,
    /// Horizontal projection of the caster (m)
    pub shadow_depth: f64,
    /// Vertical gap between caster and glass (m)
    pub shadow_offset: f64,
    /// Glass height the shadow falls on (m)
    pub window_height: f64,
}

impl ShadowGeometry {
    pub fn new(
        sun_elevation: f64,
        sun_azimuth: f64,
        window_azimuth: f64,
        shadow_depth: f64,
        shadow_offset: f64,
    ) -> Self {
        Self {
            sun_elevation,
            sun_azimuth,
            window_azimuth,
            shadow_depth,
            shadow_offset,
            window_height: 1.0,
        }
    }

    pub fn with_window_height(mut self, window_height: f64) -> Self {
        self.window_height = window_height;
        self
    }

    /// Attenuation factor in [0.1, 1.0]; 1.0 means unshadowed.
    pub fn factor(&self) -> f64 {
        if self.shadow_depth <= 0.0 && self.shadow_offset <= 0.0 {
            return 1.0;
        }
        if self.sun_elevation <= 0.0 {
            return 1.0;
        }

        let window_height = if self.window_height > 0.0 {
            self.window_height
        } else {
            1.0
        };

        let az_diff = normalize_azimuth_delta(self.sun_azimuth - self.window_azimuth);
        let az_factor = az_diff.to_radians().cos().max(0.0);

        let tan_elevation = self.sun_elevation.to_radians().tan();
        let shadow_length = self.shadow_depth / tan_elevation.max(MIN_TAN_ELEVATION);
        let effective_shadow = (shadow_length - self.shadow_offset).max(0.0);

        if effective_shadow <= 0.0 {
            return 1.0;
        }
        if effective_shadow >= window_height {
            return MIN_SHADOW_FACTOR;
        }

        let base = 1.0 - 0.9 * (effective_shadow / window_height);
        let factor = base * az_factor + (1.0 - az_factor);
        factor.clamp(MIN_SHADOW_FACTOR, 1.0)
    }
}

/// Shadow factor with the default 1 m window height.
pub fn shadow_factor(
    sun_elevation: f64,
    sun_azimuth: f64,
    window_azimuth: f64,
    shadow_depth: f64,
    shadow_offset: f64,
) -> f64 {
    ShadowGeometry::new(sun_elevation, sun_azimuth, window_azimuth, shadow_depth, shadow_offset)
        .factor()
}
