// ── External state snapshot ──
//
// The host pushes the whole world on every change. The core only ever
// reads from it; the snapshot itself is shared as `Arc<StateSnapshot>`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::EntityId;

/// Reported state of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub state: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Map::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Mapping from entity id to reported state, as delivered by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    states: HashMap<EntityId, EntityState>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and feeds.
    #[must_use]
    pub fn with(mut self, id: EntityId, state: EntityState) -> Self {
        self.states.insert(id, state);
        self
    }

    pub fn insert(&mut self, id: EntityId, state: EntityState) -> Option<EntityState> {
        self.states.insert(id, state)
    }

    /// Replace an entity's state string, keeping its attributes.
    pub fn set_state(&mut self, id: &EntityId, state: impl Into<String>) {
        match self.states.get_mut(id) {
            Some(entry) => entry.state = state.into(),
            None => {
                self.states.insert(id.clone(), EntityState::new(state));
            }
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityState> {
        self.states.get(id)
    }

    /// Raw state string of an entity, if reported.
    pub fn state_of(&self, id: &EntityId) -> Option<&str> {
        self.states.get(id).map(|s| s.state.as_str())
    }

    /// Overlay every entity in `other` on top of this snapshot.
    pub fn merge(&mut self, other: StateSnapshot) {
        self.states.extend(other.states);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &EntityState)> {
        self.states.iter()
    }
}

impl FromIterator<(EntityId, EntityState)> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityState)>>(iter: I) -> Self {
        Self {
            states: iter.into_iter().collect(),
        }
    }
}
