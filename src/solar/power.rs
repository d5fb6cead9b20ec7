//! Incident solar power on a glazed surface.

use serde::{Deserialize, Serialize};

use crate::domain::PhysicalParams;

/// Incidence cosines below this are treated as grazing (no direct gain).
pub const INCIDENCE_EPSILON: f64 = 1e-9;

/// Sun position and radiation used for a power calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarInput {
    /// Global horizontal radiation (W/m²)
    pub radiation: f64,
    /// Sun elevation (°)
    pub sun_elevation: f64,
    /// Sun azimuth (°)
    pub sun_azimuth: f64,
}

/// Direct and diffuse gain before any shadow is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerComponents {
    pub direct: f64,
    pub diffuse: f64,
}

impl PowerComponents {
    pub fn total(&self) -> f64 {
        self.direct + self.diffuse
    }

    /// Total with the direct part attenuated by `shadow_factor`.
    pub fn shaded_total(&self, shadow_factor: f64) -> f64 {
        self.direct * shadow_factor + self.diffuse
    }
}

/// Glass area excluding the frame on every side (m²), never negative.
pub fn glass_area(width: f64, height: f64, frame_width: f64) -> f64 {
    let glass_width = (width - 2.0 * frame_width).max(0.0);
    let glass_height = (height - 2.0 * frame_width).max(0.0);
    glass_width * glass_height
}

/// Cosine of the angle between the sun ray and the window normal.
pub fn incidence_cosine(
    sun_elevation: f64,
    sun_azimuth: f64,
    window_azimuth: f64,
    tilt: f64,
) -> f64 {
    let el = sun_elevation.to_radians();
    let tilt = tilt.to_radians();
    let az_diff = (sun_azimuth - window_azimuth).to_radians();
    el.sin() * tilt.cos() + el.cos() * tilt.sin() * az_diff.cos()
}

/// Direct beam power through the glass (W).
#[allow(clippy::too_many_arguments)]
pub fn direct_power(
    radiation: f64,
    sun_elevation: f64,
    sun_azimuth: f64,
    window_azimuth: f64,
    tilt: f64,
    area: f64,
    g_value: f64,
    diffuse_factor: f64,
) -> f64 {
    if sun_elevation <= 0.0 {
        return 0.0;
    }
    let cos_inc = incidence_cosine(sun_elevation, sun_azimuth, window_azimuth, tilt);
    if cos_inc < INCIDENCE_EPSILON {
        return 0.0;
    }
    let sin_el = sun_elevation.to_radians().sin();
    if sin_el <= 0.0 {
        return 0.0;
    }
    radiation * (1.0 - diffuse_factor) * cos_inc / sin_el * area * g_value
}

/// Diffuse sky power through the glass (W); independent of sun geometry.
pub fn diffuse_power(radiation: f64, area: f64, g_value: f64, diffuse_factor: f64) -> f64 {
    radiation * diffuse_factor * area * g_value
}

/// Both components for a window facing `window_azimuth`.
pub fn window_components(
    input: &SolarInput,
    window_azimuth: f64,
    area: f64,
    physical: &PhysicalParams,
) -> PowerComponents {
    PowerComponents {
        direct: direct_power(
            input.radiation,
            input.sun_elevation,
            input.sun_azimuth,
            window_azimuth,
            physical.tilt,
            area,
            physical.g_value,
            physical.diffuse_factor,
        ),
        diffuse: diffuse_power(input.radiation, area, physical.g_value, physical.diffuse_factor),
    }
}

/// Power per glass square metre; zero when there is no glass.
pub fn power_per_area(power: f64, area: f64) -> f64 {
    if area > 0.0 {
        power / area
    } else {
        0.0
    }
}
