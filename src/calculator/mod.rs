//! Per-window orchestration: resolve configuration, run the solar models,
//! decide shading, aggregate a cycle.

pub mod debug;

pub use debug::WindowDebugReport;

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    keys, CalculationBatch, EffectiveConfig, PowerDensity, SensorSnapshot, ShadingDecision,
    ShadingTrigger, WindowCalculationResult, WindowPower,
};
use crate::resolver::{ConfigError, ConfigResolver, ConfigSource, ResolvedConfig};
use crate::shading::{self, ShadingInputs};
use crate::solar::{glass_area, window_components, ShadowGeometry, SolarInput, VisibilityCone};
use crate::state::{self, SensorRefs, StateReader};

pub const MINIMUM_CONDITIONS_REASON: &str = "Minimum conditions not met";

const DEFAULT_WINDOW_SIZE_M: f64 = 1.0;

/// Computes power and shading results for configured windows.
#[derive(Clone)]
pub struct WindowCalculator {
    resolver: ConfigResolver,
}

impl WindowCalculator {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            resolver: ConfigResolver::new(source),
        }
    }

    pub fn window_ids(&self) -> Vec<String> {
        self.resolver.window_ids()
    }

    pub fn resolve_effective_config(&self, window_id: &str) -> Result<ResolvedConfig, ConfigError> {
        self.resolver.resolve_effective_config(window_id)
    }

    /// Global sensor entities.
    pub fn sensor_refs(&self) -> SensorRefs {
        SensorRefs::from_global(&self.resolver.global_config())
    }

    /// Indoor temperature entities referenced by any window.
    pub fn indoor_sensor_refs(&self) -> BTreeSet<String> {
        self.window_ids()
            .iter()
            .filter_map(|id| self.resolver.resolve_effective_config(id).ok())
            .filter_map(|resolved| {
                resolved.effective.indoor_temperature_sensor().map(str::to_string)
            })
            .collect()
    }

    /// Read every sensor a cycle needs, once.
    pub fn capture_snapshot(&self, reader: &dyn StateReader) -> SensorSnapshot {
        state::capture_snapshot(reader, &self.sensor_refs(), &self.indoor_sensor_refs())
    }

    /// Calculate a single window against `snapshot`.
    pub fn calculate_window(
        &self,
        window_id: &str,
        snapshot: &SensorSnapshot,
    ) -> Result<WindowCalculationResult, ConfigError> {
        let resolved = self.resolver.resolve_effective_config(window_id)?;
        Ok(calculate_resolved(resolved, snapshot))
    }

    /// Calculate one window and keep every intermediate for inspection.
    pub fn debug_report(
        &self,
        window_id: &str,
        snapshot: &SensorSnapshot,
    ) -> Result<WindowDebugReport, ConfigError> {
        let layers = self.resolver.layer_records(window_id)?;
        let resolved = self.resolver.resolve_effective_config(window_id)?;
        let applied = resolved.effective.clone().with_global_factors();
        let result = calculate_resolved(resolved.clone(), snapshot);

        Ok(WindowDebugReport {
            window_id: window_id.to_string(),
            generated_at: Utc::now(),
            layers,
            resolved,
            applied,
            snapshot: snapshot.clone(),
            result,
        })
    }

    /// Calculate every listed window; unknown windows are logged and skipped.
    pub fn calculate_all_windows(
        &self,
        window_ids: &[String],
        snapshot: &SensorSnapshot,
    ) -> BTreeMap<String, WindowCalculationResult> {
        let mut results = BTreeMap::new();
        for window_id in window_ids {
            match self.calculate_window(window_id, snapshot) {
                Ok(result) => {
                    results.insert(window_id.clone(), result);
                }
                Err(e) => warn!(window_id = %window_id, error = %e, "skipping window"),
            }
        }
        results
    }

    /// Calculate all configured windows and aggregate groups and summary.
    pub fn calculate_cycle(&self, snapshot: &SensorSnapshot) -> CalculationBatch {
        let window_ids = self.window_ids();
        let windows = self.calculate_all_windows(&window_ids, snapshot);
        let groups = self.resolver.group_names();
        let batch = CalculationBatch::from_windows(windows, &groups, Utc::now());

        info!(
            cycle_id = %batch.cycle_id,
            windows = batch.summary.window_count,
            shaded = batch.summary.windows_with_shading,
            total_power_w = batch.summary.total_power,
            "calculation cycle complete"
        );
        batch
    }
}

/// True when sun and radiation are strong enough to bother calculating.
pub fn meets_minimum_conditions(config: &EffectiveConfig, snapshot: &SensorSnapshot) -> bool {
    let min_radiation = config.number(keys::MIN_SOLAR_RADIATION, 1e-3);
    let min_elevation = config.number(keys::MIN_SUN_ELEVATION, 0.0);

    snapshot.is_daylight()
        && snapshot.solar_radiation_w_m2 >= min_radiation
        && snapshot.sun_elevation_deg >= min_elevation
}

fn calculate_resolved(
    resolved: ResolvedConfig,
    snapshot: &SensorSnapshot,
) -> WindowCalculationResult {
    let ResolvedConfig {
        window_id,
        effective,
        scenarios,
        ..
    } = resolved;
    let config = effective.with_global_factors();
    let threshold = config.thresholds.direct;

    let name = config.name().unwrap_or(&window_id).to_string();
    let group_id = config.linked_group_id().map(str::to_string);

    if !meets_minimum_conditions(&config, snapshot) {
        debug!(window_id = %window_id, "minimum conditions not met, skipping solar models");
        return WindowCalculationResult {
            window_id,
            name,
            group_id,
            power: WindowPower::zero(),
            power_per_m2: PowerDensity::default(),
            shading: ShadingDecision::no_shade(
                MINIMUM_CONDITIONS_REASON,
                Some(ShadingTrigger::MinimumConditions),
                threshold,
            ),
            calculated_at: snapshot.captured_at,
        };
    }

    let width = config.number(keys::WINDOW_WIDTH, DEFAULT_WINDOW_SIZE_M);
    let height = config.number(keys::WINDOW_HEIGHT, DEFAULT_WINDOW_SIZE_M);
    let area = glass_area(width, height, config.physical.frame_width);
    let power = window_power(&config, snapshot, area, height);

    let inputs = ShadingInputs {
        indoor_temp: config
            .indoor_temperature_sensor()
            .and_then(|entity| snapshot.indoor_temp(entity)),
        outdoor_temp: snapshot.outdoor_temp_c,
        forecast_temp: snapshot.forecast_temp_c,
        weather_warning: snapshot.weather_warning,
        maintenance_mode: config.maintenance_mode(),
    };
    let shading = shading::decide(&config, &power, &inputs, scenarios);

    debug!(
        window_id = %window_id,
        visible = power.is_visible,
        shadow_factor = power.shadow_factor,
        total_power_w = power.total,
        should_shade = shading.should_shade,
        reason = %shading.reason,
        "window calculated"
    );

    WindowCalculationResult {
        window_id,
        name,
        group_id,
        power_per_m2: power.density(),
        power,
        shading,
        calculated_at: snapshot.captured_at,
    }
}

/// Direct power only reaches the glass while the sun is inside the window's
/// visibility cone; the shadow factor only applies then too.
fn window_power(
    config: &EffectiveConfig,
    snapshot: &SensorSnapshot,
    area: f64,
    height: f64,
) -> WindowPower {
    let cone = VisibilityCone::from_effective(config);
    let is_visible = cone.contains(snapshot.sun_elevation_deg, snapshot.sun_azimuth_deg);

    let input = SolarInput {
        radiation: snapshot.solar_radiation_w_m2,
        sun_elevation: snapshot.sun_elevation_deg,
        sun_azimuth: snapshot.sun_azimuth_deg,
    };
    let mut components = window_components(&input, cone.window_azimuth, area, &config.physical);

    let shadow_factor = if is_visible {
        ShadowGeometry::new(
            snapshot.sun_elevation_deg,
            snapshot.sun_azimuth_deg,
            cone.window_azimuth,
            config.shadow.depth,
            config.shadow.offset,
        )
        .with_window_height(height)
        .factor()
    } else {
        components.direct = 0.0;
        1.0
    };

    WindowPower {
        direct_raw: components.direct,
        diffuse_raw: components.diffuse,
        total_raw: components.total(),
        direct: components.direct * shadow_factor,
        diffuse: components.diffuse,
        total: components.shaded_total(shadow_factor),
        shadow_factor,
        is_visible,
        area_m2: area,
    }
}
