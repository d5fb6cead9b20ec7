use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use super::StateReader;

/// Last reported state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub state: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    pub last_updated: DateTime<Utc>,
}

/// Thread-safe entity state store fed by sensor pushes.
#[derive(Debug, Default)]
pub struct InMemoryStateReader {
    entities: RwLock<HashMap<String, EntityState>>,
}

impl InMemoryStateReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state of an entity, keeping previous attributes unless new
    /// ones are given.
    pub fn set_state(
        &self,
        entity_id: impl Into<String>,
        state: impl Into<String>,
        attributes: Option<BTreeMap<String, Value>>,
    ) -> EntityState {
        let mut entities = self.entities.write();
        let entity_id = entity_id.into();
        let attributes = match attributes {
            Some(attributes) => attributes,
            None => entities
                .get(&entity_id)
                .map(|existing| existing.attributes.clone())
                .unwrap_or_default(),
        };
        let entry = EntityState {
            state: state.into(),
            attributes,
            last_updated: Utc::now(),
        };
        entities.insert(entity_id, entry.clone());
        entry
    }

    /// Convenience for the sun entity's position attributes.
    pub fn set_sun_position(&self, elevation: f64, azimuth: f64) {
        let state = if elevation > 0.0 { "above_horizon" } else { "below_horizon" };
        let attributes = BTreeMap::from([
            ("elevation".to_string(), Value::from(elevation)),
            ("azimuth".to_string(), Value::from(azimuth)),
        ]);
        self.set_state(super::SUN_ENTITY, state, Some(attributes));
    }

    pub fn get(&self, entity_id: &str) -> Option<EntityState> {
        self.entities.read().get(entity_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl StateReader for InMemoryStateReader {
    fn state(&self, entity_id: &str) -> Option<String> {
        self.entities.read().get(entity_id).map(|e| e.state.clone())
    }

    fn attribute(&self, entity_id: &str, name: &str) -> Option<Value> {
        self.entities
            .read()
            .get(entity_id)
            .and_then(|e| e.attributes.get(name).cloned())
    }
}
