use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::dispatch::ServiceBridge;

/// State of a single host entity, as delivered in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Raw state string (e.g. "20", "on", "Line 3", "unavailable").
    pub state: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Complete state of all host entities at one tick.
///
/// Owned by the host and replaced wholesale on every tick; cards only read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySnapshot {
    entities: HashMap<String, EntityState>,
}

impl EntitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>, state: EntityState) -> Self {
        self.entities.insert(entity_id.into(), state);
        self
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Host context pushed into a card on every tick: the latest entity snapshot
/// plus a handle to the host's service-call bridge.
#[derive(Clone)]
pub struct Hass {
    pub states: Arc<EntitySnapshot>,
    pub services: Arc<dyn ServiceBridge>,
}

impl Hass {
    pub fn new(states: EntitySnapshot, services: Arc<dyn ServiceBridge>) -> Self {
        Self {
            states: Arc::new(states),
            services,
        }
    }
}

impl std::fmt::Debug for Hass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hass")
            .field("entities", &self.states.len())
            .field("services", &"<bridge>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "number.zone_1_volume": {"state": "20", "attributes": {"min": 0, "max": 70}},
            "switch.zone_1_mute": {"state": "off"}
        }"#;

        let snapshot: EntitySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 2);

        let volume = snapshot.get("number.zone_1_volume").unwrap();
        assert_eq!(volume.state, "20");
        assert_eq!(volume.attribute("max"), Some(&serde_json::json!(70)));

        let mute = snapshot.get("switch.zone_1_mute").unwrap();
        assert!(mute.attributes.is_empty());
        assert!(snapshot.get("select.zone_1_source").is_none());
    }
}
