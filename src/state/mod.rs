//! External sensor state access and per-cycle snapshot capture.

pub mod memory;

pub use memory::{EntityState, InMemoryStateReader};

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::{keys, ConfigRecord, SensorSnapshot};

/// Entity providing sun position attributes.
pub const SUN_ENTITY: &str = "sun.sun";

/// State strings that mean "no reading".
const NO_READING: [&str; 3] = ["unknown", "unavailable", "none"];

/// Read-only view of external entity states.
#[cfg_attr(test, mockall::automock)]
pub trait StateReader: Send + Sync {
    /// Raw state string of an entity.
    fn state(&self, entity_id: &str) -> Option<String>;

    /// Attribute value of an entity.
    fn attribute(&self, entity_id: &str, name: &str) -> Option<Value>;
}

/// Tolerant accessors shared by every [`StateReader`].
pub trait StateReaderExt: StateReader {
    /// Numeric state; `None` for missing, `unknown`, `unavailable` or unparsable.
    fn numeric_state(&self, entity_id: &str) -> Option<f64> {
        self.state(entity_id).as_deref().and_then(parse_reading)
    }

    /// Numeric state with fallback. Never fails.
    fn get_sensor_value(&self, entity_id: &str, default: f64) -> f64 {
        self.numeric_state(entity_id).unwrap_or(default)
    }

    fn numeric_attribute(&self, entity_id: &str, name: &str) -> Option<f64> {
        match self.attribute(entity_id, name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_reading(&s),
            _ => None,
        }
    }

    /// True when the entity state is `on`.
    fn is_on(&self, entity_id: &str) -> bool {
        self.state(entity_id)
            .map(|s| s.trim().eq_ignore_ascii_case("on"))
            .unwrap_or(false)
    }
}

impl<T: StateReader + ?Sized> StateReaderExt for T {}

fn parse_reading(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || NO_READING.iter().any(|s| raw.eq_ignore_ascii_case(s)) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sensor entities configured on the global layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorRefs {
    pub solar_radiation: Option<String>,
    pub outdoor_temperature: Option<String>,
    pub forecast_temperature: Option<String>,
    pub weather_warning: Option<String>,
}

impl SensorRefs {
    pub fn from_global(global: &ConfigRecord) -> Self {
        let entity = |key: &str| global.text(key).map(str::to_string);
        Self {
            solar_radiation: entity(keys::SOLAR_RADIATION_SENSOR),
            outdoor_temperature: entity(keys::OUTDOOR_TEMPERATURE_SENSOR),
            forecast_temperature: entity(keys::FORECAST_TEMPERATURE_SENSOR),
            weather_warning: entity(keys::WEATHER_WARNING_SENSOR),
        }
    }
}

/// Read every sensor needed for one calculation cycle.
///
/// Missing radiation or sun readings count as zero, which the calculator
/// treats as night.
pub fn capture_snapshot(
    reader: &dyn StateReader,
    refs: &SensorRefs,
    indoor_entities: &BTreeSet<String>,
) -> SensorSnapshot {
    // Timestamp before reading so the snapshot age is never understated
    let captured_at = chrono::Utc::now();

    let radiation = refs
        .solar_radiation
        .as_deref()
        .map(|id| reader.get_sensor_value(id, 0.0))
        .unwrap_or(0.0);
    let elevation = reader.numeric_attribute(SUN_ENTITY, "elevation").unwrap_or(0.0);
    let azimuth = reader.numeric_attribute(SUN_ENTITY, "azimuth").unwrap_or(0.0);

    let mut snapshot = SensorSnapshot::new(radiation, elevation, azimuth)
        .captured_at(captured_at)
        .with_weather_warning(refs.weather_warning.as_deref().is_some_and(|id| reader.is_on(id)));
    snapshot.outdoor_temp_c = refs
        .outdoor_temperature
        .as_deref()
        .and_then(|id| reader.numeric_state(id));
    snapshot.forecast_temp_c = refs
        .forecast_temperature
        .as_deref()
        .and_then(|id| reader.numeric_state(id));

    for entity in indoor_entities {
        match reader.numeric_state(entity) {
            Some(temp) => {
                snapshot.indoor_temps_c.insert(entity.clone(), temp);
            }
            None => debug!(entity_id = %entity, "indoor temperature unavailable"),
        }
    }

    snapshot
}
