use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

use super::value::{coerce_f64, ConfigRecord, ConfigValue};

/// Configuration keys understood by the calculation core.
pub mod keys {
    pub const G_VALUE: &str = "g_value";
    pub const FRAME_WIDTH: &str = "frame_width";
    pub const DIFFUSE_FACTOR: &str = "diffuse_factor";
    pub const TILT: &str = "tilt";
    pub const THRESHOLD_DIRECT: &str = "threshold_direct";
    pub const THRESHOLD_DIFFUSE: &str = "threshold_diffuse";
    pub const TEMPERATURE_INDOOR_BASE: &str = "temperature_indoor_base";
    pub const TEMPERATURE_OUTDOOR_BASE: &str = "temperature_outdoor_base";
    pub const SHADOW_DEPTH: &str = "shadow_depth";
    pub const SHADOW_OFFSET: &str = "shadow_offset";

    pub const NAME: &str = "name";
    pub const LINKED_GROUP_ID: &str = "linked_group_id";
    pub const GROUP_TYPE: &str = "group_type";
    pub const INDOOR_TEMPERATURE_SENSOR: &str = "indoor_temperature_sensor";
    pub const ROOM_TEMP_ENTITY: &str = "room_temp_entity";

    pub const AZIMUTH: &str = "azimuth";
    pub const ELEVATION_MIN: &str = "elevation_min";
    pub const ELEVATION_MAX: &str = "elevation_max";
    pub const AZIMUTH_MIN: &str = "azimuth_min";
    pub const AZIMUTH_MAX: &str = "azimuth_max";
    pub const WINDOW_WIDTH: &str = "window_width";
    pub const WINDOW_HEIGHT: &str = "window_height";

    pub const SCENARIO_B_ENABLE: &str = "scenario_b_enable";
    pub const SCENARIO_C_ENABLE: &str = "scenario_c_enable";
    pub const SCENARIO_B_ENABLED: &str = "scenario_b_enabled";
    pub const SCENARIO_C_ENABLED: &str = "scenario_c_enabled";
    pub const SCENARIO_B_INDOOR_THRESHOLD: &str = "scenario_b_temp_indoor_threshold";
    pub const SCENARIO_B_TEMP_DIFFERENCE: &str = "scenario_b_temp_difference";
    pub const HEATWAVE_THRESHOLD: &str = "heatwave_threshold";

    pub const MAINTENANCE_MODE: &str = "maintenance_mode";
    pub const GLOBAL_SENSITIVITY: &str = "global_sensitivity";
    pub const CHILDREN_FACTOR: &str = "children_factor";
    pub const TEMPERATURE_OFFSET: &str = "temperature_offset";
    pub const MIN_SOLAR_RADIATION: &str = "min_solar_radiation";
    pub const MIN_SUN_ELEVATION: &str = "min_sun_elevation";

    pub const SOLAR_RADIATION_SENSOR: &str = "solar_radiation_sensor";
    pub const OUTDOOR_TEMPERATURE_SENSOR: &str = "outdoor_temperature_sensor";
    pub const FORECAST_TEMPERATURE_SENSOR: &str = "weather_forecast_temperature_sensor";
    pub const WEATHER_WARNING_SENSOR: &str = "weather_warning_sensor";
}

/// Keys that are reshaped into the typed groups of [`EffectiveConfig`].
const STRUCTURED_KEYS: [&str; 10] = [
    keys::THRESHOLD_DIRECT,
    keys::THRESHOLD_DIFFUSE,
    keys::TEMPERATURE_INDOOR_BASE,
    keys::TEMPERATURE_OUTDOOR_BASE,
    keys::G_VALUE,
    keys::FRAME_WIDTH,
    keys::DIFFUSE_FACTOR,
    keys::TILT,
    keys::SHADOW_DEPTH,
    keys::SHADOW_OFFSET,
];

/// Group type that receives the children threshold factor.
pub const CHILDREN_GROUP_TYPE: &str = "children";

/// Layer a configuration value was taken from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfigLayer {
    Global,
    Group,
    Window,
}

/// Which layer last supplied each top-level key.
pub type SourceTrace = BTreeMap<String, ConfigLayer>;

/// Optical and mounting parameters of the glazing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParams {
    /// Solar heat gain coefficient (0-1)
    pub g_value: f64,
    /// Frame width on each side (m)
    pub frame_width: f64,
    /// Diffuse share of the measured radiation (0-1)
    pub diffuse_factor: f64,
    /// Window tilt from horizontal (°), 90 = vertical
    pub tilt: f64,
}

impl Default for PhysicalParams {
    fn default() -> Self {
        Self {
            g_value: 0.5,
            frame_width: 0.125,
            diffuse_factor: 0.15,
            tilt: 90.0,
        }
    }
}

/// Power thresholds (W)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub direct: f64,
    pub diffuse: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            direct: 200.0,
            diffuse: 150.0,
        }
    }
}

/// Temperature baselines (°C)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBases {
    pub indoor_base: f64,
    pub outdoor_base: f64,
}

impl Default for TemperatureBases {
    fn default() -> Self {
        Self {
            indoor_base: 23.0,
            outdoor_base: 19.5,
        }
    }
}

/// Shadow-caster geometry (m)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadowParams {
    pub depth: f64,
    pub offset: f64,
}

/// Fully merged, sentinel-free configuration for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub physical: PhysicalParams,
    pub thresholds: Thresholds,
    pub temperatures: TemperatureBases,
    pub shadow: ShadowParams,
    /// Every key not reshaped into the groups above, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, ConfigValue>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self::from_flat(ConfigRecord::new())
    }
}

impl EffectiveConfig {
    /// Reshape a merged flat record, applying defaults for absent keys.
    pub fn from_flat(flat: ConfigRecord) -> Self {
        let physical_defaults = PhysicalParams::default();
        let threshold_defaults = Thresholds::default();
        let temperature_defaults = TemperatureBases::default();

        let num = |key: &str, default: f64| coerce_f64(flat.get(key), key, default);

        let physical = PhysicalParams {
            g_value: num(keys::G_VALUE, physical_defaults.g_value),
            frame_width: num(keys::FRAME_WIDTH, physical_defaults.frame_width),
            diffuse_factor: num(keys::DIFFUSE_FACTOR, physical_defaults.diffuse_factor),
            tilt: num(keys::TILT, physical_defaults.tilt),
        };
        let thresholds = Thresholds {
            direct: num(keys::THRESHOLD_DIRECT, threshold_defaults.direct),
            diffuse: num(keys::THRESHOLD_DIFFUSE, threshold_defaults.diffuse),
        };
        let temperatures = TemperatureBases {
            indoor_base: num(keys::TEMPERATURE_INDOOR_BASE, temperature_defaults.indoor_base),
            outdoor_base: num(keys::TEMPERATURE_OUTDOOR_BASE, temperature_defaults.outdoor_base),
        };
        let shadow = ShadowParams {
            depth: num(keys::SHADOW_DEPTH, 0.0),
            offset: num(keys::SHADOW_OFFSET, 0.0),
        };

        let extra = flat
            .into_iter()
            .filter(|(k, _)| !STRUCTURED_KEYS.contains(&k.as_str()))
            .filter_map(|(k, v)| v.without_inherit().map(|v| (k, v)))
            .collect();

        Self {
            physical,
            thresholds,
            temperatures,
            shadow,
            extra,
        }
    }

    /// Numeric extra value with tolerant fallback.
    pub fn number(&self, key: &str, default: f64) -> f64 {
        coerce_f64(self.extra.get(key), key, default)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(ConfigValue::as_str)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.extra.get(key).and_then(ConfigValue::as_bool)
    }

    pub fn name(&self) -> Option<&str> {
        self.text(keys::NAME)
    }

    pub fn linked_group_id(&self) -> Option<&str> {
        self.text(keys::LINKED_GROUP_ID)
    }

    pub fn group_type(&self) -> &str {
        self.text(keys::GROUP_TYPE).unwrap_or("default")
    }

    /// Indoor temperature entity, accepting the legacy `room_temp_entity` key.
    pub fn indoor_temperature_sensor(&self) -> Option<&str> {
        self.text(keys::INDOOR_TEMPERATURE_SENSOR)
            .or_else(|| self.text(keys::ROOM_TEMP_ENTITY))
    }

    pub fn maintenance_mode(&self) -> bool {
        self.flag(keys::MAINTENANCE_MODE).unwrap_or(false)
    }

    /// True when no inheritance sentinel survived anywhere in the config.
    pub fn is_resolved(&self) -> bool {
        self.extra.values().all(ConfigValue::is_resolved)
    }

    /// Apply sensitivity, children factor and temperature offset.
    ///
    /// Thresholds are divided by `global_sensitivity` (non-positive values count
    /// as 1.0); `children` group windows additionally multiply them by
    /// `children_factor`; `temperature_offset` shifts both baselines.
    pub fn with_global_factors(mut self) -> Self {
        let mut sensitivity = self.number(keys::GLOBAL_SENSITIVITY, 1.0);
        if sensitivity <= 0.0 {
            sensitivity = 1.0;
        }
        self.thresholds.direct /= sensitivity;
        self.thresholds.diffuse /= sensitivity;

        if self.group_type() == CHILDREN_GROUP_TYPE {
            let factor = self.number(keys::CHILDREN_FACTOR, 0.8);
            self.thresholds.direct *= factor;
            self.thresholds.diffuse *= factor;
        }

        let offset = self.number(keys::TEMPERATURE_OFFSET, 0.0);
        self.temperatures.indoor_base += offset;
        self.temperatures.outdoor_base += offset;
        self
    }
}
