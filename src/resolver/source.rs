use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::ConfigError;
use crate::domain::ConfigRecord;

/// Global configuration as stored: base data plus an override layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalRecord {
    #[serde(flatten)]
    pub data: ConfigRecord,
    /// Later edits; wins over `data` key by key
    #[serde(default, skip_serializing_if = "ConfigRecord::is_empty")]
    pub options: ConfigRecord,
}

impl GlobalRecord {
    pub fn new(data: ConfigRecord) -> Self {
        Self {
            data,
            options: ConfigRecord::new(),
        }
    }

    /// Sentinel-free merge of data and options.
    pub fn merged(&self) -> ConfigRecord {
        let mut merged = self.data.without_inherit();
        for (key, value) in self.options.without_inherit() {
            merged.insert(key, value);
        }
        merged
    }
}

/// Read access to raw, unmerged configuration records.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigSource: Send + Sync {
    fn window_record(&self, window_id: &str) -> Option<ConfigRecord>;
    fn group_record(&self, group_id: &str) -> Option<ConfigRecord>;
    fn global_record(&self) -> Option<GlobalRecord>;
    fn window_ids(&self) -> Vec<String>;
    fn group_ids(&self) -> Vec<String>;
}

/// In-memory configuration loaded from a YAML records file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub global: Option<GlobalRecord>,
    #[serde(default)]
    pub groups: BTreeMap<String, ConfigRecord>,
    #[serde(default)]
    pub windows: BTreeMap<String, ConfigRecord>,
}

impl SystemConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn with_global(mut self, global: GlobalRecord) -> Self {
        self.global = Some(global);
        self
    }

    pub fn with_group(mut self, id: impl Into<String>, record: ConfigRecord) -> Self {
        self.groups.insert(id.into(), record);
        self
    }

    pub fn with_window(mut self, id: impl Into<String>, record: ConfigRecord) -> Self {
        self.windows.insert(id.into(), record);
        self
    }
}

impl ConfigSource for SystemConfig {
    fn window_record(&self, window_id: &str) -> Option<ConfigRecord> {
        self.windows.get(window_id).cloned()
    }

    fn group_record(&self, group_id: &str) -> Option<ConfigRecord> {
        self.groups.get(group_id).cloned()
    }

    fn global_record(&self) -> Option<GlobalRecord> {
        self.global.clone()
    }

    fn window_ids(&self) -> Vec<String> {
        self.windows.keys().cloned().collect()
    }

    fn group_ids(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigValue;

    const RECORDS: &str = r#"
global:
  g_value: 0.5
  threshold_direct: 200
  solar_radiation_sensor: sensor.solar_radiation
  options:
    threshold_direct: 250
    g_value: inherit
groups:
  south:
    diffuse_factor: 0.3
windows:
  living_room:
    name: Living Room
    linked_group_id: south
    diffuse_factor: "-1"
    window_width: 1.5
"#;

    #[test]
    fn test_load_yaml_records() {
        let config = SystemConfig::from_yaml_str(RECORDS).unwrap();
        assert_eq!(config.window_ids(), vec!["living_room".to_string()]);
        assert_eq!(config.group_ids(), vec!["south".to_string()]);

        let window = config.window_record("living_room").unwrap();
        assert!(window.get("diffuse_factor").unwrap().is_inherit());
        assert!(config.window_record("attic").is_none());
    }

    #[test]
    fn test_global_options_override_data() {
        let config = SystemConfig::from_yaml_str(RECORDS).unwrap();
        let merged = config.global_record().unwrap().merged();

        assert_eq!(merged.get("threshold_direct").and_then(ConfigValue::as_f64), Some(250.0));
        // sentinel in options does not erase the base value
        assert_eq!(merged.get("g_value").and_then(ConfigValue::as_f64), Some(0.5));
        assert_eq!(merged.text("solar_radiation_sensor"), Some("sensor.solar_radiation"));
        assert!(!merged.contains_key("options"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SystemConfig::from_path("/nonexistent/windows.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/windows.yaml"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            SystemConfig::from_yaml_str("windows: [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }
}
