use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::solar::power_per_area;

/// Solar power figures for one window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowPower {
    /// Direct component before shadow (W)
    pub direct_raw: f64,
    /// Diffuse component (W)
    pub diffuse_raw: f64,
    /// Unshadowed total (W)
    pub total_raw: f64,
    /// Direct component after shadow (W)
    pub direct: f64,
    /// Diffuse component (W)
    pub diffuse: f64,
    /// Total after shadow (W)
    pub total: f64,
    /// Applied shadow factor (0.1-1.0)
    pub shadow_factor: f64,
    /// Sun within the window's visibility cone
    pub is_visible: bool,
    /// Glass area excluding frame (m²)
    pub area_m2: f64,
}

impl WindowPower {
    /// No-sun result: all figures zero, full shadow factor.
    pub fn zero() -> Self {
        Self {
            shadow_factor: 1.0,
            ..Default::default()
        }
    }

    /// Total after shadow per glass square metre (W/m²); zero for no area.
    pub fn total_per_m2(&self) -> f64 {
        power_per_area(self.total, self.area_m2)
    }

    pub fn direct_per_m2(&self) -> f64 {
        power_per_area(self.direct, self.area_m2)
    }

    pub fn diffuse_per_m2(&self) -> f64 {
        power_per_area(self.diffuse, self.area_m2)
    }

    pub fn density(&self) -> PowerDensity {
        PowerDensity {
            total: self.total_per_m2(),
            direct: self.direct_per_m2(),
            diffuse: self.diffuse_per_m2(),
        }
    }
}

/// Shadow-adjusted power per glass square metre (W/m²).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerDensity {
    pub total: f64,
    pub direct: f64,
    pub diffuse: f64,
}

/// What caused a shading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShadingTrigger {
    Maintenance,
    WeatherWarning,
    Baseline,
    ScenarioB,
    ScenarioC,
    MinimumConditions,
    Error,
}

/// Shading verdict for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadingDecision {
    pub should_shade: bool,
    /// Human-readable explanation
    pub reason: String,
    /// Direct threshold in force after global factors (W)
    pub effective_threshold: f64,
    /// Rule that produced the verdict, if any fired
    pub trigger: Option<ShadingTrigger>,
}

impl ShadingDecision {
    pub fn shade(
        reason: impl Into<String>,
        trigger: ShadingTrigger,
        effective_threshold: f64,
    ) -> Self {
        Self {
            should_shade: true,
            reason: reason.into(),
            effective_threshold,
            trigger: Some(trigger),
        }
    }

    pub fn no_shade(
        reason: impl Into<String>,
        trigger: Option<ShadingTrigger>,
        effective_threshold: f64,
    ) -> Self {
        Self {
            should_shade: false,
            reason: reason.into(),
            effective_threshold,
            trigger,
        }
    }
}

impl fmt::Display for ShadingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            if self.should_shade { "shade" } else { "open" },
            self.reason
        )
    }
}

/// Result of one window calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCalculationResult {
    pub window_id: String,
    pub name: String,
    pub group_id: Option<String>,
    #[serde(flatten)]
    pub power: WindowPower,
    pub power_per_m2: PowerDensity,
    pub shading: ShadingDecision,
    pub calculated_at: DateTime<Utc>,
}

impl WindowCalculationResult {
    pub fn should_shade(&self) -> bool {
        self.shading.should_shade
    }
}

/// Aggregate over the windows linked to one group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupResult {
    pub group_id: String,
    /// Configured display name, the id when none is set
    pub name: String,
    pub window_count: usize,
    /// Sums rounded to 2 decimals (W)
    pub total_power: f64,
    pub total_power_direct: f64,
    pub total_power_diffuse: f64,
    pub shading_count: usize,
}

/// Totals across every calculated window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub total_power: f64,
    pub total_power_direct: f64,
    pub total_power_diffuse: f64,
    pub window_count: usize,
    pub windows_with_shading: usize,
    pub calculation_time: Option<DateTime<Utc>>,
}

/// Everything produced by one calculation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationBatch {
    pub cycle_id: Uuid,
    pub windows: BTreeMap<String, WindowCalculationResult>,
    pub groups: BTreeMap<String, GroupResult>,
    pub summary: CalculationSummary,
}

impl CalculationBatch {
    /// Aggregate per-window results into group and overall totals.
    ///
    /// `configured_groups` maps group id to display name. Every configured
    /// group is reported, with zero totals when no window links to it; links
    /// to groups that are not configured are ignored.
    pub fn from_windows(
        windows: BTreeMap<String, WindowCalculationResult>,
        configured_groups: &BTreeMap<String, String>,
        calculated_at: DateTime<Utc>,
    ) -> Self {
        let mut groups: BTreeMap<String, GroupResult> = configured_groups
            .iter()
            .map(|(id, name)| {
                let group = GroupResult {
                    group_id: id.clone(),
                    name: name.clone(),
                    ..Default::default()
                };
                (id.clone(), group)
            })
            .collect();
        let mut summary = CalculationSummary {
            calculation_time: Some(calculated_at),
            ..Default::default()
        };

        for result in windows.values() {
            summary.total_power += result.power.total;
            summary.total_power_direct += result.power.direct;
            summary.total_power_diffuse += result.power.diffuse;
            summary.window_count += 1;
            if result.should_shade() {
                summary.windows_with_shading += 1;
            }

            let linked = result.group_id.as_ref().and_then(|id| groups.get_mut(id));
            if let Some(group) = linked {
                group.window_count += 1;
                group.total_power += result.power.total;
                group.total_power_direct += result.power.direct;
                group.total_power_diffuse += result.power.diffuse;
                if result.should_shade() {
                    group.shading_count += 1;
                }
            }
        }

        for group in groups.values_mut() {
            group.total_power = round2(group.total_power);
            group.total_power_direct = round2(group.total_power_direct);
            group.total_power_diffuse = round2(group.total_power_diffuse);
        }
        summary.total_power = round2(summary.total_power);
        summary.total_power_direct = round2(summary.total_power_direct);
        summary.total_power_diffuse = round2(summary.total_power_diffuse);

        Self {
            cycle_id: Uuid::new_v4(),
            windows,
            groups,
            summary,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
