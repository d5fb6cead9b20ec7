use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::effective::{keys, EffectiveConfig};
use super::value::ConfigValue;

/// Per-layer scenario switch as stored on groups and windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ScenarioSwitch {
    Enable,
    Disable,
    #[default]
    Inherit,
}

impl ScenarioSwitch {
    /// Interpret a raw configuration value; anything unrecognised inherits.
    pub fn from_value(value: Option<&ConfigValue>) -> Self {
        match value {
            Some(ConfigValue::Bool(true)) => ScenarioSwitch::Enable,
            Some(ConfigValue::Bool(false)) => ScenarioSwitch::Disable,
            Some(ConfigValue::Text(s)) => s.trim().parse().unwrap_or(ScenarioSwitch::Inherit),
            _ => ScenarioSwitch::Inherit,
        }
    }

    /// `Some(enabled)` for an explicit switch, `None` when inheriting.
    pub fn explicit(self) -> Option<bool> {
        match self {
            ScenarioSwitch::Enable => Some(true),
            ScenarioSwitch::Disable => Some(false),
            ScenarioSwitch::Inherit => None,
        }
    }
}

/// Resolved scenario enables for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioEnables {
    pub scenario_b: bool,
    pub scenario_c: bool,
}

impl ScenarioEnables {
    pub fn new(scenario_b: bool, scenario_c: bool) -> Self {
        Self {
            scenario_b,
            scenario_c,
        }
    }

    /// Window and group switches arrive already merged in `extra`; when they
    /// inherit, the global `scenario_*_enabled` booleans decide (default off).
    pub fn from_effective(config: &EffectiveConfig) -> Self {
        let resolve = |switch_key: &str, global_key: &str| {
            ScenarioSwitch::from_value(config.extra.get(switch_key))
                .explicit()
                .unwrap_or_else(|| config.flag(global_key).unwrap_or(false))
        };
        Self {
            scenario_b: resolve(keys::SCENARIO_B_ENABLE, keys::SCENARIO_B_ENABLED),
            scenario_c: resolve(keys::SCENARIO_C_ENABLE, keys::SCENARIO_C_ENABLED),
        }
    }
}
