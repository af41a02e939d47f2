// ── Widget configuration ──
//
// Which entities one card instance watches and controls. Built by the
// config crate (or a test) and handed in -- core never reads config files.
// Immutable once a widget is set up; reconfiguration swaps it wholesale.

use std::time::Duration;

use crate::error::CoreError;
use crate::model::EntityId;
use crate::scheduler::RENDER_DEBOUNCE;

/// Helper entities the card relies on besides the controls themselves.
///
/// These are the host-side helpers the card reads settings from and writes
/// PIN input to. Every one has a conventional default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperEntities {
    /// Text entity echoing the digits typed so far.
    pub pin_display: EntityId,
    /// Text entity the host uses to report the PIN check result.
    pub pin_feedback: EntityId,
    /// Script that verifies the PIN currently in `pin_display`.
    pub pin_verify_script: EntityId,
    /// Script that locks the door from the PIN pad.
    pub lock_script: EntityId,
    /// Datetime of the last door opening.
    pub last_open: EntityId,
    /// Text entity holding the path of the latest camera snapshot.
    pub snapshot_path: EntityId,
    pub clock: EntityId,
    pub date: EntityId,
    pub notify_telegram: EntityId,
    pub notify_push: EntityId,
    /// Start of the notification window.
    pub notify_start: EntityId,
    /// End of the notification window.
    pub notify_end: EntityId,
}

impl Default for HelperEntities {
    fn default() -> Self {
        Self {
            pin_display: EntityId::from_static("input_text.pin_display"),
            pin_feedback: EntityId::from_static("input_text.pin_feedback"),
            pin_verify_script: EntityId::from_static("script.door_pin_verify"),
            lock_script: EntityId::from_static("script.door_lock_feedback"),
            last_open: EntityId::from_static("input_datetime.last_door_open"),
            snapshot_path: EntityId::from_static("input_text.snapshot_path"),
            clock: EntityId::from_static("sensor.time"),
            date: EntityId::from_static("sensor.date"),
            notify_telegram: EntityId::from_static("input_boolean.notify_telegram_door"),
            notify_push: EntityId::from_static("input_boolean.notify_push_door"),
            notify_start: EntityId::from_static("input_datetime.door_notify_start"),
            notify_end: EntityId::from_static("input_datetime.door_notify_end"),
        }
    }
}

/// Values the pin-feedback entity reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackVocabulary {
    /// Resting value; anything else is shown verbatim instead of the PIN dots.
    pub idle: String,
    pub opened: String,
    pub locked: String,
    pub wrong: String,
}

impl Default for FeedbackVocabulary {
    fn default() -> Self {
        Self {
            idle: "----".into(),
            opened: "OPENED".into(),
            locked: "LOCKED".into(),
            wrong: "WRONG".into(),
        }
    }
}

/// Configuration of a single card instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Door contact sensor (`on` = open).
    pub sensor: Option<EntityId>,
    /// Smartlock opened through the PIN pad.
    pub smartlock: Option<EntityId>,
    pub gate: Option<EntityId>,
    pub building_door: Option<EntityId>,
    pub helpers: HelperEntities,
    pub feedback: FeedbackVocabulary,
    /// Trailing-edge debounce window for state-driven renders.
    pub debounce: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            sensor: None,
            smartlock: None,
            gate: None,
            building_door: None,
            helpers: HelperEntities::default(),
            feedback: FeedbackVocabulary::default(),
            debounce: RENDER_DEBOUNCE,
        }
    }
}

impl WidgetConfig {
    /// Setup-time validation. A card without any control has nothing to do.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.smartlock.is_none() && self.gate.is_none() && self.building_door.is_none() {
            return Err(CoreError::Config {
                message: "at least one of smartlock, gate or building-door must be configured"
                    .into(),
            });
        }
        if self.debounce.is_zero() {
            return Err(CoreError::Config {
                message: "debounce window must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_rejected() {
        let err = WidgetConfig::default().validate().unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn sensor_alone_is_not_enough() {
        let cfg = WidgetConfig {
            sensor: Some(EntityId::parse("binary_sensor.front_door").unwrap()),
            ..WidgetConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn any_single_control_is_enough() {
        for id in ["lock.front_door", "lock.gate", "cover.building_door"] {
            let id = EntityId::parse(id).unwrap();
            let configs = [
                WidgetConfig { smartlock: Some(id.clone()), ..WidgetConfig::default() },
                WidgetConfig { gate: Some(id.clone()), ..WidgetConfig::default() },
                WidgetConfig { building_door: Some(id), ..WidgetConfig::default() },
            ];
            for cfg in configs {
                assert!(cfg.validate().is_ok());
            }
        }
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let cfg = WidgetConfig {
            gate: Some(EntityId::parse("lock.gate").unwrap()),
            debounce: Duration::ZERO,
            ..WidgetConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
