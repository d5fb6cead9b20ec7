//! Raw configuration values as they arrive from a configuration source.
//!
//! Inheritance sentinels (`-1`, `"-1"`, `""`, `null` and `"inherit"`) are folded
//! into [`ConfigValue::Inherit`] while parsing, so merge code only ever matches
//! on the variant and never re-parses strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Textual inheritance marker accepted from configuration sources.
pub const INHERIT_MARKER: &str = "inherit";

/// Value coercion errors.
///
/// These are always recovered by the caller (usually by substituting a
/// documented default), never propagated out of a calculation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("invalid numeric input for '{key}': {value}")]
    InvalidNumericInput { key: String, value: String },
}

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Use the parent layer's value.
    Inherit,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn is_inherit(&self) -> bool {
        matches!(self, ConfigValue::Inherit)
    }

    /// Convert a loosely typed JSON/YAML value, recognising sentinels.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ConfigValue::Inherit,
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(v) => ConfigValue::from(v),
                None => ConfigValue::Text(n.to_string()),
            },
            Value::String(s) => ConfigValue::from_text(s),
            Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from_json).collect())
            }
            Value::Object(map) => ConfigValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Parse a textual value; sentinel strings become [`ConfigValue::Inherit`].
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "-1" || trimmed.eq_ignore_ascii_case(INHERIT_MARKER) {
            ConfigValue::Inherit
        } else {
            ConfigValue::Text(text)
        }
    }

    /// Numeric view of the value, accepting numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(v) if v.is_finite() => Some(*v),
            ConfigValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Numeric coercion that reports why it failed.
    pub fn to_f64(&self, key: &str) -> Result<f64, ValueError> {
        self.as_f64().ok_or_else(|| ValueError::InvalidNumericInput {
            key: key.to_string(),
            value: self.to_string(),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Boolean view; accepts the usual on/off spellings used by state stores.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::Number(v) if *v == 0.0 || *v == 1.0 => Some(*v == 1.0),
            ConfigValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "enable" | "enabled" => Some(true),
                "false" | "off" | "no" | "disable" | "disabled" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Drop every sentinel, recursing into nested maps and lists.
    ///
    /// Returns `None` when the value itself is a sentinel.
    pub fn without_inherit(self) -> Option<ConfigValue> {
        match self {
            ConfigValue::Inherit => None,
            ConfigValue::Map(map) => Some(ConfigValue::Map(
                map.into_iter()
                    .filter_map(|(k, v)| v.without_inherit().map(|v| (k, v)))
                    .collect(),
            )),
            ConfigValue::List(items) => Some(ConfigValue::List(
                items.into_iter().filter_map(ConfigValue::without_inherit).collect(),
            )),
            other => Some(other),
        }
    }

    /// True when no sentinel remains anywhere inside the value.
    pub fn is_resolved(&self) -> bool {
        match self {
            ConfigValue::Inherit => false,
            ConfigValue::Map(map) => map.values().all(ConfigValue::is_resolved),
            ConfigValue::List(items) => items.iter().all(ConfigValue::is_resolved),
            _ => true,
        }
    }
}

/// Coerce an optional value to `f64`, substituting `default` for missing,
/// inherited or unparsable input.
pub fn coerce_f64(value: Option<&ConfigValue>, key: &str, default: f64) -> f64 {
    match value {
        None | Some(ConfigValue::Inherit) => default,
        Some(v) => v.to_f64(key).unwrap_or_else(|err| {
            warn!(error = %err, default, "using default for invalid configuration value");
            default
        }),
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Inherit => write!(f, "{}", INHERIT_MARKER),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Number(v) => write!(f, "{}", v),
            ConfigValue::Text(s) => write!(f, "{}", s),
            ConfigValue::List(items) => write!(f, "[{} items]", items.len()),
            ConfigValue::Map(map) => write!(f, "{{{} keys}}", map.len()),
        }
    }
}

impl From<f64> for ConfigValue {
    /// `-1` is the numeric inheritance sentinel.
    fn from(v: f64) -> Self {
        if v == -1.0 {
            ConfigValue::Inherit
        } else {
            ConfigValue::Number(v)
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::from_text(s)
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::from_text(s)
    }
}

impl From<BTreeMap<String, ConfigValue>> for ConfigValue {
    fn from(map: BTreeMap<String, ConfigValue>) -> Self {
        ConfigValue::Map(map)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Inherit => serializer.serialize_str(INHERIT_MARKER),
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Number(v) => serializer.serialize_f64(*v),
            ConfigValue::Text(s) => serializer.serialize_str(s),
            ConfigValue::List(items) => items.serialize(serializer),
            ConfigValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(ConfigValue::from_json)
    }
}

/// Flat key/value configuration record for one layer (global, group or window).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigRecord(BTreeMap<String, ConfigValue>);

impl ConfigRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Option<ConfigValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.0.iter()
    }

    /// Non-empty text value (sentinels never reach here as text).
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    /// Copy with every sentinel removed.
    pub fn without_inherit(&self) -> ConfigRecord {
        self.0
            .iter()
            .filter_map(|(k, v)| v.clone().without_inherit().map(|v| (k.clone(), v)))
            .collect()
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigRecord {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ConfigRecord {
    type Item = (String, ConfigValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<BTreeMap<String, ConfigValue>> for ConfigRecord {
    fn from(map: BTreeMap<String, ConfigValue>) -> Self {
        Self(map)
    }
}
