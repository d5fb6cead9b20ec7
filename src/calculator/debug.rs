//! Per-window diagnostics: every input and intermediate behind one result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EffectiveConfig, SensorSnapshot, WindowCalculationResult};
use crate::resolver::{LayerRecords, ResolvedConfig};

/// Diagnostic view of a single window calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDebugReport {
    pub window_id: String,
    pub generated_at: DateTime<Utc>,
    /// Global, group and window records before merging
    pub layers: LayerRecords,
    /// Merged configuration with its source trace
    pub resolved: ResolvedConfig,
    /// Configuration after sensitivity, children factor and temperature offset
    pub applied: EffectiveConfig,
    pub snapshot: SensorSnapshot,
    pub result: WindowCalculationResult,
}
