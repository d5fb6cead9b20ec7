use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// External sensor readings at one instant.
///
/// Captured once per calculation cycle and shared read-only by every window
/// calculation of that cycle, so all windows observe the same moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Moment the readings were taken
    pub captured_at: DateTime<Utc>,

    /// Global horizontal solar radiation (W/m²)
    pub solar_radiation_w_m2: f64,

    /// Sun elevation above the horizon (°)
    pub sun_elevation_deg: f64,

    /// Sun azimuth, clockwise from north (°)
    pub sun_azimuth_deg: f64,

    /// Outdoor temperature (°C), if the sensor reported a number
    pub outdoor_temp_c: Option<f64>,

    /// Forecast temperature (°C), if available
    pub forecast_temp_c: Option<f64>,

    /// Weather warning sensor reports "on"
    pub weather_warning: bool,

    /// Indoor temperatures keyed by sensor entity
    pub indoor_temps_c: BTreeMap<String, f64>,
}

impl SensorSnapshot {
    /// Snapshot with sun and radiation readings, taken now.
    pub fn new(solar_radiation_w_m2: f64, sun_elevation_deg: f64, sun_azimuth_deg: f64) -> Self {
        Self {
            captured_at: Utc::now(),
            solar_radiation_w_m2,
            sun_elevation_deg,
            sun_azimuth_deg,
            outdoor_temp_c: None,
            forecast_temp_c: None,
            weather_warning: false,
            indoor_temps_c: BTreeMap::new(),
        }
    }

    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }

    pub fn with_outdoor_temp(mut self, temp_c: f64) -> Self {
        self.outdoor_temp_c = Some(temp_c);
        self
    }

    pub fn with_forecast_temp(mut self, temp_c: f64) -> Self {
        self.forecast_temp_c = Some(temp_c);
        self
    }

    pub fn with_weather_warning(mut self, active: bool) -> Self {
        self.weather_warning = active;
        self
    }

    pub fn with_indoor_temp(mut self, entity_id: impl Into<String>, temp_c: f64) -> Self {
        self.indoor_temps_c.insert(entity_id.into(), temp_c);
        self
    }

    pub fn indoor_temp(&self, entity_id: &str) -> Option<f64> {
        self.indoor_temps_c.get(entity_id).copied()
    }

    /// Wall-clock age relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.captured_at)
    }

    /// Sun above the horizon with non-zero radiation.
    pub fn is_daylight(&self) -> bool {
        self.sun_elevation_deg > 0.0 && self.solar_radiation_w_m2 > 0.0
    }
}

impl fmt::Display for SensorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorSnapshot {{ radiation: {:.1}W/m², sun: {:.1}°/{:.1}°, \
             outdoor: {}, warning: {} }}",
            self.solar_radiation_w_m2,
            self.sun_elevation_deg,
            self.sun_azimuth_deg,
            self.outdoor_temp_c
                .map(|t| format!("{:.1}°C", t))
                .unwrap_or_else(|| "n/a".to_string()),
            self.weather_warning
        )
    }
}
