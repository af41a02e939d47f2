// ── Command API ──
//
// All writes toward the host flow through a typed `Command` enum pushed
// onto an unbounded `mpsc` queue. The card never awaits a result: the
// receiving end (the command sink) owns delivery, retries and failures.

pub mod table;

use chrono::NaiveTime;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::model::EntityId;

pub use table::{ActionDomain, OpenResolution, resolve_open};

/// Every write the card can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `input_text.set_value` -- used for the PIN display echo.
    SetText { entity: EntityId, value: String },
    /// `script.turn_on`.
    RunScript { entity: EntityId },
    /// `lock.unlock`.
    Unlock { entity: EntityId },
    /// `<domain>.toggle` for switches and input booleans.
    Toggle { entity: EntityId },
    /// `cover.open_cover`.
    OpenCover { entity: EntityId },
    /// `input_datetime.set_datetime` with a time-of-day payload.
    SetTime { entity: EntityId, time: NaiveTime },
}

impl Command {
    pub fn entity(&self) -> &EntityId {
        match self {
            Self::SetText { entity, .. }
            | Self::RunScript { entity }
            | Self::Unlock { entity }
            | Self::Toggle { entity }
            | Self::OpenCover { entity }
            | Self::SetTime { entity, .. } => entity,
        }
    }

    /// Service domain the command is sent to.
    pub fn domain(&self) -> &str {
        match self {
            Self::SetText { .. } => "input_text",
            Self::RunScript { .. } => "script",
            Self::Unlock { .. } => "lock",
            Self::Toggle { entity } => entity.domain(),
            Self::OpenCover { .. } => "cover",
            Self::SetTime { .. } => "input_datetime",
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::SetText { .. } => "set_value",
            Self::RunScript { .. } => "turn_on",
            Self::Unlock { .. } => "unlock",
            Self::Toggle { .. } => "toggle",
            Self::OpenCover { .. } => "open_cover",
            Self::SetTime { .. } => "set_datetime",
        }
    }

    /// Extra service data beyond the target entity.
    pub fn payload(&self) -> Map<String, Value> {
        let mut data = Map::new();
        match self {
            Self::SetText { value, .. } => {
                data.insert("value".into(), Value::String(value.clone()));
            }
            Self::SetTime { time, .. } => {
                data.insert(
                    "time".into(),
                    Value::String(time.format("%H:%M:%S").to_string()),
                );
            }
            Self::RunScript { .. }
            | Self::Unlock { .. }
            | Self::Toggle { .. }
            | Self::OpenCover { .. } => {}
        }
        data
    }

    /// Flatten into the wire shape the host understands.
    pub fn to_service_call(&self) -> ServiceCall {
        ServiceCall {
            domain: self.domain().to_owned(),
            service: self.service().to_owned(),
            entity_id: self.entity().clone(),
            data: self.payload(),
        }
    }
}

/// `(domain, service, entity, payload)` as sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: EntityId,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

/// Fire-and-forget handle onto the command queue.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Create a dispatcher together with the receiving end of its queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queue a command. At most one send per call; nothing is awaited.
    pub fn dispatch(&self, cmd: Command) {
        debug!(
            domain = cmd.domain(),
            service = cmd.service(),
            entity = %cmd.entity(),
            "dispatching command"
        );
        if let Err(mpsc::error::SendError(cmd)) = self.tx.send(cmd) {
            warn!(entity = %cmd.entity(), "command sink closed; dropping command");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    #[test]
    fn set_text_carries_value_payload() {
        let call = Command::SetText {
            entity: id("input_text.pin_display"),
            value: "12".into(),
        }
        .to_service_call();

        assert_eq!(call.domain, "input_text");
        assert_eq!(call.service, "set_value");
        assert_eq!(call.data.get("value"), Some(&Value::String("12".into())));
    }

    #[test]
    fn toggle_uses_entity_domain() {
        let cmd = Command::Toggle {
            entity: id("input_boolean.notify_push_door"),
        };
        assert_eq!(cmd.domain(), "input_boolean");
        assert_eq!(cmd.service(), "toggle");
        assert!(cmd.payload().is_empty());
    }

    #[test]
    fn set_time_formats_seconds() {
        let cmd = Command::SetTime {
            entity: id("input_datetime.door_notify_start"),
            time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
        };
        let json = serde_json::to_value(cmd.to_service_call()).unwrap();
        assert_eq!(json["data"]["time"], "07:30:00");
        assert_eq!(json["entity_id"], "input_datetime.door_notify_start");
    }

    #[test]
    fn dispatch_is_queued_in_order() {
        let (dispatcher, mut rx) = CommandDispatcher::channel();
        dispatcher.dispatch(Command::RunScript { entity: id("script.a") });
        dispatcher.dispatch(Command::RunScript { entity: id("script.b") });

        assert_eq!(rx.try_recv().unwrap().entity().as_str(), "script.a");
        assert_eq!(rx.try_recv().unwrap().entity().as_str(), "script.b");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dispatch_to_closed_sink_does_not_panic() {
        let (dispatcher, rx) = CommandDispatcher::channel();
        drop(rx);
        dispatcher.dispatch(Command::Unlock { entity: id("lock.gate") });
    }
}
