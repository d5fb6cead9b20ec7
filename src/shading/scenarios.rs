//! Individual shading rules. Each returns `Ok(Some(reason))` when it fires.

use serde::{Deserialize, Serialize};

use super::{ShadingError, ShadingInputs};
use crate::domain::{keys, EffectiveConfig};

/// Temperature limits for scenarios B and C (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioThresholds {
    /// Scenario B indoor limit
    pub indoor: f64,
    /// Scenario B minimum outdoor-minus-indoor difference
    pub difference: f64,
    /// Scenario C indoor heatwave limit
    pub heatwave: f64,
}

impl Default for ScenarioThresholds {
    fn default() -> Self {
        Self {
            indoor: 25.0,
            difference: 5.0,
            heatwave: 30.0,
        }
    }
}

impl ScenarioThresholds {
    pub fn from_effective(config: &EffectiveConfig) -> Self {
        let defaults = Self::default();
        Self {
            indoor: config.number(keys::SCENARIO_B_INDOOR_THRESHOLD, defaults.indoor),
            difference: config.number(keys::SCENARIO_B_TEMP_DIFFERENCE, defaults.difference),
            heatwave: config.number(keys::HEATWAVE_THRESHOLD, defaults.heatwave),
        }
    }
}

pub(crate) fn finite(name: &str, value: f64) -> Result<f64, ShadingError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ShadingError::InvalidNumericInput {
            key: name.to_string(),
            value,
        })
    }
}

fn required(name: &'static str, value: Option<f64>) -> Result<f64, ShadingError> {
    let value = value.ok_or(ShadingError::MissingInput(name))?;
    finite(name, value)
}

/// Baseline: total power above the direct threshold.
pub fn baseline(total_power: f64, threshold: f64) -> Result<Option<String>, ShadingError> {
    let total_power = finite("total_power", total_power)?;
    let threshold = finite("threshold_direct", threshold)?;
    Ok((total_power > threshold)
        .then(|| format!("Solar power {:.1}W exceeds threshold {:.1}W", total_power, threshold)))
}

/// Scenario B (diffuse heat): warm room while outside is markedly warmer.
pub fn scenario_b(
    inputs: &ShadingInputs,
    thresholds: &ScenarioThresholds,
) -> Result<Option<String>, ShadingError> {
    let indoor = required("indoor temperature", inputs.indoor_temp)?;
    let outdoor = required("outdoor temperature", inputs.outdoor_temp)?;
    let difference = outdoor - indoor;

    if indoor > thresholds.indoor && difference > thresholds.difference {
        Ok(Some(format!(
            "Diffuse heat: indoor {:.1}°C > {:.1}°C and \
             outdoor-indoor difference {:.1}°C > {:.1}°C",
            indoor, thresholds.indoor, difference, thresholds.difference
        )))
    } else {
        Ok(None)
    }
}

/// Scenario C (heatwave): room above the heatwave limit.
pub fn scenario_c(
    inputs: &ShadingInputs,
    thresholds: &ScenarioThresholds,
) -> Result<Option<String>, ShadingError> {
    let indoor = required("indoor temperature", inputs.indoor_temp)?;

    if indoor > thresholds.heatwave {
        let mut reason = format!("Heatwave: indoor {:.1}°C > {:.1}°C", indoor, thresholds.heatwave);
        if let Some(forecast) = inputs.forecast_temp.filter(|t| t.is_finite()) {
            reason.push_str(&format!(", forecast {:.1}°C", forecast));
        }
        Ok(Some(reason))
    } else {
        Ok(None)
    }
}
