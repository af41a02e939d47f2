// ── Core identity type ──
//
// Every entity the card talks to is addressed as `<domain>.<object_id>`.
// The domain prefix decides which service opens a control.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identifier of a host entity, e.g. `lock.front_door`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Parse and validate a raw identifier.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        let valid = match raw.split_once('.') {
            Some((domain, object)) => {
                !domain.is_empty()
                    && !object.is_empty()
                    && !raw.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Self(raw))
        } else {
            Err(CoreError::InvalidEntityId { raw })
        }
    }

    /// Built-in identifiers that are known to be well formed.
    pub(crate) fn from_static(raw: &'static str) -> Self {
        debug_assert!(Self::parse(raw).is_ok(), "malformed built-in entity id {raw}");
        Self(raw.to_owned())
    }

    /// Domain prefix (`lock` for `lock.front_door`).
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(d, _)| d)
    }

    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, o)| o)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn domain_and_object_split_on_first_dot() {
        let id = EntityId::parse("input_text.pin.display").unwrap();
        assert_eq!(id.domain(), "input_text");
        assert_eq!(id.object_id(), "pin.display");
    }

    #[test]
    fn rejects_missing_domain_or_object() {
        assert!(EntityId::parse("lock").is_err());
        assert!(EntityId::parse(".front").is_err());
        assert!(EntityId::parse("lock.").is_err());
        assert!(EntityId::parse("lock.front door").is_err());
    }

    #[test]
    fn from_str_round_trips_display() {
        let id: EntityId = "cover.building_door".parse().unwrap();
        assert_eq!(id.to_string(), "cover.building_door");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<EntityId, _> = serde_json::from_str("\"lock.gate\"");
        assert!(ok.is_ok());
        let bad: Result<EntityId, _> = serde_json::from_str("\"gate\"");
        assert!(bad.is_err());
    }
}
