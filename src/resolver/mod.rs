//! Three-tier configuration inheritance: global, then group, then window.

pub mod source;

pub use source::{ConfigSource, GlobalRecord, SystemConfig};

#[cfg(test)]
pub use source::MockConfigSource;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    keys, ConfigLayer, ConfigRecord, ConfigValue, EffectiveConfig, ScenarioEnables, SourceTrace,
};

/// Configuration lookup and loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{kind} configuration not found: {id}")]
    ConfigNotFound { kind: &'static str, id: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid records file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn window_not_found(id: impl Into<String>) -> Self {
        ConfigError::ConfigNotFound {
            kind: "window",
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::ConfigNotFound { .. })
    }
}

/// Effective configuration for one window plus where each key came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub window_id: String,
    pub effective: EffectiveConfig,
    pub sources: SourceTrace,
    pub scenarios: ScenarioEnables,
}

/// Raw records behind one window, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecords {
    pub global: Option<GlobalRecord>,
    /// Group named by the window's `linked_group_id`
    pub group_id: Option<String>,
    /// `None` when unlinked or the linked group is not configured
    pub group: Option<ConfigRecord>,
    pub window: ConfigRecord,
}

/// Merges configuration layers for windows of a [`ConfigSource`].
#[derive(Clone)]
pub struct ConfigResolver {
    source: Arc<dyn ConfigSource>,
}

impl ConfigResolver {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    pub fn window_ids(&self) -> Vec<String> {
        self.source.window_ids()
    }

    /// Configured group ids mapped to their display name.
    pub fn group_names(&self) -> BTreeMap<String, String> {
        self.source
            .group_ids()
            .into_iter()
            .map(|id| {
                let name = self
                    .source
                    .group_record(&id)
                    .and_then(|record| record.text(keys::NAME).map(str::to_string))
                    .unwrap_or_else(|| id.clone());
                (id, name)
            })
            .collect()
    }

    /// Sentinel-free global configuration; empty when none is stored.
    pub fn global_config(&self) -> ConfigRecord {
        self.source
            .global_record()
            .map(|global| global.merged())
            .unwrap_or_default()
    }

    /// Raw, unmerged records that feed `window_id`.
    pub fn layer_records(&self, window_id: &str) -> Result<LayerRecords, ConfigError> {
        let window = self
            .source
            .window_record(window_id)
            .ok_or_else(|| ConfigError::window_not_found(window_id))?;

        let group_id = window.text(keys::LINKED_GROUP_ID).map(str::to_string);
        let group = group_id.as_deref().and_then(|group_id| {
            let group = self.source.group_record(group_id);
            if group.is_none() {
                debug!(window_id, group_id, "linked group not found, skipping group layer");
            }
            group
        });

        Ok(LayerRecords {
            global: self.source.global_record(),
            group_id,
            group,
            window,
        })
    }

    /// Merge global, linked group and window records for `window_id`.
    ///
    /// Sentinel values never override a parent value. When both sides hold a
    /// nested mapping the mapping is merged key by key.
    pub fn resolve_effective_config(&self, window_id: &str) -> Result<ResolvedConfig, ConfigError> {
        let layers = self.layer_records(window_id)?;

        let mut sources = SourceTrace::new();
        let mut merged = ConfigRecord::new();
        let global = layers.global.map(|g| g.merged()).unwrap_or_default();
        merge_layer(&mut merged, &global, ConfigLayer::Global, &mut sources);
        if let Some(group) = &layers.group {
            merge_layer(&mut merged, group, ConfigLayer::Group, &mut sources);
        }
        merge_layer(&mut merged, &layers.window, ConfigLayer::Window, &mut sources);

        let effective = EffectiveConfig::from_flat(merged);
        let scenarios = ScenarioEnables::from_effective(&effective);

        Ok(ResolvedConfig {
            window_id: window_id.to_string(),
            effective,
            sources,
            scenarios,
        })
    }
}

/// Overlay `layer` onto `effective`, skipping sentinels at every depth.
pub fn merge_layer(
    effective: &mut ConfigRecord,
    layer: &ConfigRecord,
    origin: ConfigLayer,
    sources: &mut SourceTrace,
) {
    for (key, value) in layer.iter() {
        let Some(value) = value.clone().without_inherit() else {
            continue;
        };

        let nested = matches!(
            (effective.get(key), &value),
            (Some(ConfigValue::Map(_)), ConfigValue::Map(_))
        );

        if nested {
            if let (Some(ConfigValue::Map(existing)), ConfigValue::Map(incoming)) =
                (effective.get_mut(key), value)
            {
                existing.extend(incoming);
            }
        } else {
            effective.insert(key.clone(), value);
        }
        sources.insert(key.clone(), origin);
    }
}
