//! Solar geometry: shadow attenuation, incident power and window visibility.
//!
//! Everything here is pure and synchronous. Angles are in degrees, azimuths
//! clockwise from north.

pub mod power;
pub mod shadow;
pub mod visibility;

pub use power::{
    diffuse_power, direct_power, glass_area, power_per_area, window_components, PowerComponents,
    SolarInput,
};
pub use shadow::{shadow_factor, ShadowGeometry, MIN_SHADOW_FACTOR};
pub use visibility::{is_visible, VisibilityCone};

/// Fold an azimuth difference into (-180, 180].
pub fn normalize_azimuth_delta(delta: f64) -> f64 {
    let wrapped = delta.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_azimuth_delta() {
        assert_eq!(normalize_azimuth_delta(0.0), 0.0);
        assert_eq!(normalize_azimuth_delta(-180.0), 180.0);
        assert_eq!(normalize_azimuth_delta(180.0), 180.0);
        assert_eq!(normalize_azimuth_delta(190.0), -170.0);
        assert_eq!(normalize_azimuth_delta(-350.0), 10.0);
        assert_eq!(normalize_azimuth_delta(720.0), 0.0);
    }
}
