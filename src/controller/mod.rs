pub mod cache;

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::calculator::{WindowCalculator, WindowDebugReport};
use crate::config::Config;
use crate::domain::{CalculationBatch, SensorSnapshot, WindowCalculationResult};
use crate::resolver::{ConfigError, ConfigSource, ResolvedConfig, SystemConfig};
use crate::state::InMemoryStateReader;

pub use cache::SnapshotCache;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub controller: Arc<ShadingController>,
}

impl AppState {
    /// Build state from the service config, loading the records file.
    pub fn new(cfg: Config) -> Result<Self> {
        let records = SystemConfig::from_path(&cfg.records.path)?;
        info!(
            path = %cfg.records.path.display(),
            windows = records.windows.len(),
            groups = records.groups.len(),
            "loaded window records"
        );
        Ok(Self::with_source(cfg, Arc::new(records)))
    }

    pub fn with_source(cfg: Config, source: Arc<dyn ConfigSource>) -> Self {
        let controller = Arc::new(ShadingController::new(
            WindowCalculator::new(source),
            Arc::new(InMemoryStateReader::new()),
            Duration::from_secs(cfg.controller.snapshot_ttl_seconds),
        ));
        Self { cfg, controller }
    }
}

pub fn spawn_controller_tasks(state: AppState, cfg: Config) {
    let controller = state.controller.clone();
    tokio::spawn(async move {
        if let Err(e) = controller.run(cfg.controller.tick_seconds).await {
            warn!(error=%e, "calculation loop stopped");
        }
    });
}

/// Runs calculation cycles and keeps the latest batch.
pub struct ShadingController {
    pub calculator: WindowCalculator,
    pub states: Arc<InMemoryStateReader>,
    pub cache: SnapshotCache,
    latest: RwLock<Option<CalculationBatch>>,
}

impl ShadingController {
    pub fn new(
        calculator: WindowCalculator,
        states: Arc<InMemoryStateReader>,
        snapshot_ttl: Duration,
    ) -> Self {
        Self {
            calculator,
            states,
            cache: SnapshotCache::new(snapshot_ttl),
            latest: RwLock::new(None),
        }
    }

    pub async fn run(&self, tick_seconds: u64) -> Result<()> {
        let mut interval = tokio::time::interval(Duration::from_secs(tick_seconds.max(1)));
        loop {
            interval.tick().await;
            let batch = self.run_cycle().await;
            info!(
                cycle_id = %batch.cycle_id,
                windows = batch.summary.window_count,
                shaded = batch.summary.windows_with_shading,
                total_power_w = batch.summary.total_power,
                "control tick"
            );
        }
    }

    /// Sensor snapshot, reused while younger than the cache TTL.
    pub fn snapshot(&self) -> SensorSnapshot {
        self.cache.get_or_capture(Utc::now(), || {
            self.calculator.capture_snapshot(self.states.as_ref())
        })
    }

    /// Calculate every window against one snapshot and store the batch.
    pub async fn run_cycle(&self) -> CalculationBatch {
        let snapshot = self.snapshot();
        let batch = self.calculator.calculate_cycle(&snapshot);
        *self.latest.write().await = Some(batch.clone());
        batch
    }

    pub async fn latest(&self) -> Option<CalculationBatch> {
        self.latest.read().await.clone()
    }

    pub fn calculate_window(
        &self,
        window_id: &str,
    ) -> Result<WindowCalculationResult, ConfigError> {
        let snapshot = self.snapshot();
        self.calculator.calculate_window(window_id, &snapshot)
    }

    /// Diagnostics for one window against the current snapshot.
    pub fn debug_window(&self, window_id: &str) -> Result<WindowDebugReport, ConfigError> {
        let snapshot = self.snapshot();
        self.calculator.debug_report(window_id, &snapshot)
    }

    pub fn resolve(&self, window_id: &str) -> Result<ResolvedConfig, ConfigError> {
        self.calculator.resolve_effective_config(window_id)
    }
}
