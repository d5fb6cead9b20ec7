//! Shading decision engine.
//!
//! Rules are checked in a fixed order: maintenance mode, weather warning,
//! baseline power, scenario B, scenario C. The first rule that fires decides
//! and supplies the reason. Failures never escape [`decide`]; they turn into a
//! non-shading decision carrying the error text.

pub mod scenarios;

pub use scenarios::ScenarioThresholds;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{EffectiveConfig, ScenarioEnables, ShadingDecision, ShadingTrigger, WindowPower};

pub const NO_SHADING_REASON: &str = "No shading required";
pub const MAINTENANCE_REASON: &str = "Maintenance mode active";
pub const WEATHER_WARNING_REASON: &str = "Weather warning active";

/// Shading evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShadingError {
    /// A scenario lacks a reading; the scenario is skipped
    #[error("{0} unavailable")]
    MissingInput(&'static str),
    /// A reading or configured value is not a finite number
    #[error("invalid numeric input for '{key}': {value}")]
    InvalidNumericInput { key: String, value: f64 },
}

/// Sensor-derived inputs for one window's decision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadingInputs {
    pub indoor_temp: Option<f64>,
    pub outdoor_temp: Option<f64>,
    pub forecast_temp: Option<f64>,
    pub weather_warning: bool,
    pub maintenance_mode: bool,
}

/// Decide whether a window should be shaded.
///
/// `config` is expected to carry global factors already applied.
pub fn decide(
    config: &EffectiveConfig,
    power: &WindowPower,
    inputs: &ShadingInputs,
    enables: ScenarioEnables,
) -> ShadingDecision {
    let threshold = config.thresholds.direct;
    match evaluate(config, power, inputs, enables) {
        Ok(decision) => decision,
        Err(e) => {
            warn!(error = %e, "shading evaluation failed");
            ShadingDecision::no_shade(
                format!("Error in shading calculation: {}", e),
                Some(ShadingTrigger::Error),
                threshold,
            )
        }
    }
}

fn evaluate(
    config: &EffectiveConfig,
    power: &WindowPower,
    inputs: &ShadingInputs,
    enables: ScenarioEnables,
) -> Result<ShadingDecision, ShadingError> {
    let threshold = config.thresholds.direct;

    if inputs.maintenance_mode {
        return Ok(ShadingDecision::no_shade(
            MAINTENANCE_REASON,
            Some(ShadingTrigger::Maintenance),
            threshold,
        ));
    }
    if inputs.weather_warning {
        return Ok(ShadingDecision::shade(
            WEATHER_WARNING_REASON,
            ShadingTrigger::WeatherWarning,
            threshold,
        ));
    }

    if let Some(reason) = scenarios::baseline(power.total, threshold)? {
        return Ok(ShadingDecision::shade(reason, ShadingTrigger::Baseline, threshold));
    }

    let thresholds = ScenarioThresholds::from_effective(config);
    let mut skipped = Vec::new();

    if enables.scenario_b {
        match scenarios::scenario_b(inputs, &thresholds) {
            Ok(Some(reason)) => {
                return Ok(ShadingDecision::shade(reason, ShadingTrigger::ScenarioB, threshold))
            }
            Ok(None) => {}
            Err(ShadingError::MissingInput(what)) => {
                skipped.push(format!("scenario B skipped: {} unavailable", what))
            }
            Err(e) => return Err(e),
        }
    }

    if enables.scenario_c {
        match scenarios::scenario_c(inputs, &thresholds) {
            Ok(Some(reason)) => {
                return Ok(ShadingDecision::shade(reason, ShadingTrigger::ScenarioC, threshold))
            }
            Ok(None) => {}
            Err(ShadingError::MissingInput(what)) => {
                skipped.push(format!("scenario C skipped: {} unavailable", what))
            }
            Err(e) => return Err(e),
        }
    }

    if !skipped.is_empty() {
        debug!(skipped = ?skipped, "scenarios skipped for missing inputs");
    }

    let reason = if skipped.is_empty() {
        NO_SHADING_REASON.to_string()
    } else {
        format!("{} ({})", NO_SHADING_REASON, skipped.join("; "))
    };
    Ok(ShadingDecision::no_shade(reason, None, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigRecord;

    fn config_with_threshold(direct: f64) -> EffectiveConfig {
        EffectiveConfig::from_flat(ConfigRecord::new().with("threshold_direct", direct))
    }

    fn power(total: f64) -> WindowPower {
        WindowPower {
            total,
            direct: total,
            ..WindowPower::zero()
        }
    }

    #[test]
    fn test_baseline_shades_with_reason() {
        let decision = decide(
            &config_with_threshold(100.0),
            &power(150.0),
            &ShadingInputs::default(),
            ScenarioEnables::default(),
        );
        assert!(decision.should_shade);
        assert!(decision.reason.contains("150.0W"));
        assert!(decision.reason.contains("100.0W"));
        assert_eq!(decision.trigger, Some(ShadingTrigger::Baseline));
        assert_eq!(decision.effective_threshold, 100.0);
    }

    #[test]
    fn test_scenario_c_heatwave() {
        let inputs = ShadingInputs {
            indoor_temp: Some(32.0),
            ..Default::default()
        };
        let decision = decide(
            &EffectiveConfig::default(),
            &power(10.0),
            &inputs,
            ScenarioEnables::new(false, true),
        );
        assert!(decision.should_shade);
        assert!(decision.reason.contains("32.0°C > 30.0°C"));
        assert_eq!(decision.trigger, Some(ShadingTrigger::ScenarioC));
    }

    #[test]
    fn test_disabled_scenarios_do_not_fire() {
        let inputs = ShadingInputs {
            indoor_temp: Some(35.0),
            outdoor_temp: Some(42.0),
            ..Default::default()
        };
        let decision =
            decide(&EffectiveConfig::default(), &power(10.0), &inputs, ScenarioEnables::default());
        assert!(!decision.should_shade);
        assert_eq!(decision.reason, NO_SHADING_REASON);
        assert_eq!(decision.trigger, None);
    }

    #[test]
    fn test_first_firing_rule_gives_reason() {
        let inputs = ShadingInputs {
            indoor_temp: Some(35.0),
            outdoor_temp: Some(42.0),
            ..Default::default()
        };
        let decision = decide(
            &config_with_threshold(100.0),
            &power(500.0),
            &inputs,
            ScenarioEnables::new(true, true),
        );
        assert_eq!(decision.trigger, Some(ShadingTrigger::Baseline));

        let decision = decide(
            &config_with_threshold(1000.0),
            &power(500.0),
            &inputs,
            ScenarioEnables::new(true, true),
        );
        assert_eq!(decision.trigger, Some(ShadingTrigger::ScenarioB));
    }

    #[test]
    fn test_maintenance_beats_weather_warning() {
        let inputs = ShadingInputs {
            maintenance_mode: true,
            weather_warning: true,
            ..Default::default()
        };
        let decision = decide(
            &config_with_threshold(1.0),
            &power(900.0),
            &inputs,
            ScenarioEnables::default(),
        );
        assert!(!decision.should_shade);
        assert_eq!(decision.reason, MAINTENANCE_REASON);
    }

    #[test]
    fn test_weather_warning_forces_shade() {
        let inputs = ShadingInputs {
            weather_warning: true,
            ..Default::default()
        };
        let decision =
            decide(&EffectiveConfig::default(), &power(0.0), &inputs, ScenarioEnables::default());
        assert!(decision.should_shade);
        assert_eq!(decision.reason, WEATHER_WARNING_REASON);
    }

    #[test]
    fn test_missing_inputs_yield_diagnostic() {
        let decision = decide(
            &EffectiveConfig::default(),
            &power(10.0),
            &ShadingInputs::default(),
            ScenarioEnables::new(true, true),
        );
        assert!(!decision.should_shade);
        assert!(decision.reason.starts_with(NO_SHADING_REASON));
        assert!(decision.reason.contains("scenario B skipped"));
        assert!(decision.reason.contains("scenario C skipped"));
    }

    #[test]
    fn test_invalid_number_becomes_error_reason() {
        let decision = decide(
            &EffectiveConfig::default(),
            &power(f64::NAN),
            &ShadingInputs::default(),
            ScenarioEnables::default(),
        );
        assert!(!decision.should_shade);
        assert!(decision.reason.starts_with("Error in shading calculation: "));
        assert_eq!(decision.trigger, Some(ShadingTrigger::Error));
    }
}
