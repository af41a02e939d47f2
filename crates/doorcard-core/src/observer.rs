// ── State observer ──
//
// Host snapshots arrive on every change anywhere in the house. Only the
// door sensor and the PIN feedback entity matter for re-rendering, so each
// push is reduced to a fingerprint of those two and compared with the last.

use tracing::trace;

use crate::model::{EntityId, StateSnapshot};

/// Separates the sensor and feedback parts of a fingerprint.
pub const FINGERPRINT_SEPARATOR: char = '\u{1f}';

/// Change detector over the watched subset of host state.
#[derive(Debug, Clone)]
pub struct StateObserver {
    sensor: Option<EntityId>,
    feedback: EntityId,
    last_fingerprint: Option<String>,
}

impl StateObserver {
    pub fn new(sensor: Option<EntityId>, feedback: EntityId) -> Self {
        Self {
            sensor,
            feedback,
            last_fingerprint: None,
        }
    }

    /// Fingerprint of the watched entities. Absent entities contribute `""`.
    pub fn fingerprint(&self, snapshot: &StateSnapshot) -> String {
        let sensor = self
            .sensor
            .as_ref()
            .and_then(|id| snapshot.get(id))
            .and_then(|state| serde_json::to_string(state).ok())
            .unwrap_or_default();
        let feedback = snapshot.state_of(&self.feedback).unwrap_or_default();

        let mut fp = String::with_capacity(sensor.len() + feedback.len() + 1);
        fp.push_str(&sensor);
        fp.push(FINGERPRINT_SEPARATOR);
        fp.push_str(feedback);
        fp
    }

    /// Record the snapshot's fingerprint. Returns `true` when it differs
    /// from the previous one; an unchanged fingerprint leaves no trace.
    pub fn observe(&mut self, snapshot: &StateSnapshot) -> bool {
        let fp = self.fingerprint(snapshot);
        if self.last_fingerprint.as_deref() == Some(fp.as_str()) {
            return false;
        }
        trace!(fingerprint = %fp.escape_debug(), "watched state changed");
        self.last_fingerprint = Some(fp);
        true
    }

    pub fn last_fingerprint(&self) -> Option<&str> {
        self.last_fingerprint.as_deref()
    }

    /// Forget the last fingerprint so the next push counts as a change.
    pub fn reset(&mut self) {
        self.last_fingerprint = None;
    }
}
