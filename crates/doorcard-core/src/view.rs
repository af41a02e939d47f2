//! View model: pure derivation of everything the card displays.
//!
//! [`derive`] maps a snapshot plus configuration onto a [`DisplayModel`].
//! It never fails: absent entities become placeholders (`--`, `--:--`,
//! `----`, default toggles and times). Same input, same output.

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::config::WidgetConfig;
use crate::model::{EntityId, StateSnapshot};
use crate::pin::PinFeedback;

pub const NO_TIME: &str = "--:--";
pub const NO_DATE: &str = "----";
pub const NO_STATE: &str = "--";
pub const DEFAULT_NOTIFY_START: &str = "07:00";
pub const DEFAULT_NOTIFY_END: &str = "22:00";
pub const DEFAULT_SNAPSHOT_IMAGE: &str = "img/snapshot.jpg";

/// Door contact state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DoorStatus {
    Open,
    Closed,
    Unavailable,
}

impl DoorStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Unavailable => "Door state unavailable",
        }
    }
}

/// Lock-like control state. Anything but `unlocked` reads as locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockStatus {
    Locked,
    Unlocked,
}

impl LockStatus {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("unlocked") => Self::Unlocked,
            _ => Self::Locked,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Locked => "Locked",
            Self::Unlocked => "Unlocked",
        }
    }
}

/// Notification preferences as shown in the settings overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSettings {
    pub clock: String,
    pub date: String,
    pub telegram: bool,
    pub push: bool,
    pub start: String,
    pub end: String,
}

/// Everything the main card face shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    pub door: DoorStatus,
    /// `HH:MM` of the last opening, or `--:--`.
    pub last_open: String,
    /// Present only when a smartlock is configured.
    pub smartlock: Option<LockStatus>,
    /// Present only when a gate is configured.
    pub gate: Option<LockStatus>,
    /// Raw building-door state (or `--`), present only when configured.
    pub building_door: Option<String>,
    pub settings: NotificationSettings,
}

/// Content of the open overlay, derived from live state at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ModalView {
    ConfirmGate { target: EntityId },
    ConfirmBuilding { target: EntityId },
    PinEntry { feedback: PinFeedback },
    Snapshot { image: String },
    Settings(NotificationSettings),
}

/// One render: the card face plus the overlay, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFrame {
    pub display: DisplayModel,
    pub modal: Option<ModalView>,
}

/// Derive the display model from a snapshot and configuration.
pub fn derive(snapshot: &StateSnapshot, config: &WidgetConfig) -> DisplayModel {
    let door = match config.sensor.as_ref().and_then(|id| snapshot.state_of(id)) {
        None => DoorStatus::Unavailable,
        Some("on") => DoorStatus::Open,
        Some(_) => DoorStatus::Closed,
    };

    let last_open = snapshot
        .state_of(&config.helpers.last_open)
        .and_then(format_clock)
        .unwrap_or_else(|| NO_TIME.into());

    DisplayModel {
        door,
        last_open,
        smartlock: lock_status(snapshot, config.smartlock.as_ref()),
        gate: lock_status(snapshot, config.gate.as_ref()),
        building_door: config.building_door.as_ref().map(|id| {
            snapshot
                .state_of(id)
                .map_or_else(|| NO_STATE.into(), str::to_owned)
        }),
        settings: notification_settings(snapshot, config),
    }
}

/// Notification settings with defaults for every absent helper.
pub fn notification_settings(snapshot: &StateSnapshot, config: &WidgetConfig) -> NotificationSettings {
    let helpers = &config.helpers;
    let text = |id: &EntityId, fallback: &str| {
        snapshot
            .state_of(id)
            .filter(|s| !s.is_empty())
            .map_or_else(|| fallback.to_owned(), str::to_owned)
    };
    let window = |id: &EntityId, fallback: &str| match snapshot.state_of(id) {
        Some(raw) if !raw.is_empty() => format_clock(raw).unwrap_or_else(|| raw.to_owned()),
        _ => fallback.to_owned(),
    };

    NotificationSettings {
        clock: text(&helpers.clock, NO_TIME),
        date: text(&helpers.date, NO_DATE),
        telegram: snapshot.state_of(&helpers.notify_telegram) == Some("on"),
        push: snapshot.state_of(&helpers.notify_push) == Some("on"),
        start: window(&helpers.notify_start, DEFAULT_NOTIFY_START),
        end: window(&helpers.notify_end, DEFAULT_NOTIFY_END),
    }
}

/// Path of the latest camera snapshot, or the bundled placeholder.
pub fn snapshot_image(snapshot: &StateSnapshot, config: &WidgetConfig) -> String {
    snapshot
        .state_of(&config.helpers.snapshot_path)
        .filter(|s| !s.is_empty())
        .map_or_else(|| DEFAULT_SNAPSHOT_IMAGE.into(), str::to_owned)
}

fn lock_status(snapshot: &StateSnapshot, id: Option<&EntityId>) -> Option<LockStatus> {
    id.map(|id| LockStatus::from_raw(snapshot.state_of(id)))
}

/// Reduce a host date/time value to its `HH:MM` wall-clock part.
fn format_clock(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let time = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.time())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.time()))
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()?;
    Some(time.format("%H:%M").to_string())
}
