//! Loopback host: a local stand-in for the smart-home runtime.
//!
//! Holds the entity state the widget is shown, merges updates from the
//! snapshot feed, and applies dispatched commands the way the real host's
//! services and scripts would, so the card can be exercised end to end
//! without any device behind it.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use doorcard_core::{
    Command, EntityId, EntityState, FeedbackVocabulary, HelperEntities, StateSnapshot, WidgetConfig,
};

pub struct LoopbackHost {
    state: StateSnapshot,
    helpers: HelperEntities,
    feedback: FeedbackVocabulary,
    sensor: Option<EntityId>,
    smartlock: Option<EntityId>,
    pin: String,
}

impl LoopbackHost {
    /// Seed a host for `config`, accepting `pin` at the verification script.
    pub fn new(config: &WidgetConfig, pin: impl Into<String>) -> Self {
        let helpers = config.helpers.clone();
        let mut state = StateSnapshot::new()
            .with(helpers.pin_display.clone(), EntityState::new(""))
            .with(
                helpers.pin_feedback.clone(),
                EntityState::new(config.feedback.idle.clone()),
            );
        if let Some(sensor) = &config.sensor {
            state.insert(sensor.clone(), EntityState::new("off"));
        }
        for control in [&config.smartlock, &config.gate].into_iter().flatten() {
            state.insert(control.clone(), EntityState::new("locked"));
        }
        if let Some(building) = &config.building_door {
            state.insert(building.clone(), EntityState::new("closed"));
        }

        Self {
            state,
            helpers,
            feedback: config.feedback.clone(),
            sensor: config.sensor.clone(),
            smartlock: config.smartlock.clone(),
            pin: pin.into(),
        }
    }

    /// Current state, as the host would push it.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        Arc::new(self.state.clone())
    }

    /// Overlay an update from the feed.
    pub fn merge(&mut self, update: StateSnapshot) {
        debug!(entities = update.len(), "merging feed update");
        self.state.merge(update);
    }

    /// Apply one dispatched command at wall-clock time `now`.
    pub fn apply(&mut self, command: &Command, now: NaiveDateTime) {
        let call = command.to_service_call();
        debug!(
            domain = %call.domain,
            service = %call.service,
            entity = %call.entity_id,
            "loopback service call"
        );

        match command {
            Command::SetText { entity, value } => {
                if *entity == self.helpers.pin_display && !value.is_empty() {
                    // Typing again clears the previous verdict.
                    self.set(&self.helpers.pin_feedback.clone(), self.feedback.idle.clone());
                }
                self.set(entity, value.clone());
            }
            Command::RunScript { entity } => self.run_script(entity, now),
            Command::Unlock { entity } => self.set(entity, "unlocked"),
            Command::Toggle { entity } => {
                let next = if self.state.state_of(entity) == Some("on") {
                    "off"
                } else {
                    "on"
                };
                self.set(entity, next);
            }
            Command::OpenCover { entity } => self.set(entity, "open"),
            Command::SetTime { entity, time } => {
                self.set(entity, time.format("%H:%M:%S").to_string());
            }
        }
    }

    fn run_script(&mut self, script: &EntityId, now: NaiveDateTime) {
        let feedback = self.helpers.pin_feedback.clone();
        if *script == self.helpers.pin_verify_script {
            let typed = self.state.state_of(&self.helpers.pin_display).unwrap_or("");
            if typed == self.pin {
                info!("pin accepted");
                self.set(&feedback, self.feedback.opened.clone());
                self.open_door(now);
            } else {
                info!("pin rejected");
                self.set(&feedback, self.feedback.wrong.clone());
            }
            self.set(&self.helpers.pin_display.clone(), "");
        } else if *script == self.helpers.lock_script {
            if let Some(lock) = self.smartlock.clone() {
                self.set(&lock, "locked");
            }
            if let Some(sensor) = self.sensor.clone() {
                self.set(&sensor, "off");
            }
            self.set(&feedback, self.feedback.locked.clone());
        } else {
            debug!(%script, "script has no loopback behavior");
        }
    }

    fn open_door(&mut self, now: NaiveDateTime) {
        if let Some(lock) = self.smartlock.clone() {
            self.set(&lock, "unlocked");
        }
        if let Some(sensor) = self.sensor.clone() {
            self.set(&sensor, "on");
        }
        self.set(
            &self.helpers.last_open.clone(),
            now.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
    }

    fn set(&mut self, entity: &EntityId, value: impl Into<String>) {
        self.state.set_state(entity, value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;

    use super::*;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    fn config() -> WidgetConfig {
        WidgetConfig {
            sensor: Some(id("binary_sensor.front_door")),
            smartlock: Some(id("lock.front_door")),
            gate: Some(id("lock.gate")),
            building_door: Some(id("cover.building_door")),
            ..WidgetConfig::default()
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 15, 42)
            .unwrap()
    }

    fn state(host: &LoopbackHost, raw: &str) -> String {
        host.snapshot().state_of(&id(raw)).unwrap_or_default().to_owned()
    }

    fn type_pin(host: &mut LoopbackHost, pin: &str) {
        host.apply(
            &Command::SetText {
                entity: id("input_text.pin_display"),
                value: pin.into(),
            },
            now(),
        );
    }

    fn verify() -> Command {
        Command::RunScript {
            entity: id("script.door_pin_verify"),
        }
    }

    #[test]
    fn seeds_configured_entities() {
        let host = LoopbackHost::new(&config(), "1234");
        assert_eq!(state(&host, "binary_sensor.front_door"), "off");
        assert_eq!(state(&host, "lock.gate"), "locked");
        assert_eq!(state(&host, "cover.building_door"), "closed");
        assert_eq!(state(&host, "input_text.pin_feedback"), "----");
    }

    #[test]
    fn correct_pin_opens_the_door() {
        let mut host = LoopbackHost::new(&config(), "1234");
        type_pin(&mut host, "1234");
        host.apply(&verify(), now());

        assert_eq!(state(&host, "input_text.pin_feedback"), "OPENED");
        assert_eq!(state(&host, "lock.front_door"), "unlocked");
        assert_eq!(state(&host, "binary_sensor.front_door"), "on");
        assert_eq!(state(&host, "input_datetime.last_door_open"), "2024-05-01 08:15:42");
        assert_eq!(state(&host, "input_text.pin_display"), "");
    }

    #[test]
    fn wrong_pin_is_reported_and_typing_resets_it() {
        let mut host = LoopbackHost::new(&config(), "1234");
        type_pin(&mut host, "9999");
        host.apply(&verify(), now());
        assert_eq!(state(&host, "input_text.pin_feedback"), "WRONG");
        assert_eq!(state(&host, "lock.front_door"), "locked");

        type_pin(&mut host, "1");
        assert_eq!(state(&host, "input_text.pin_feedback"), "----");
    }

    #[test]
    fn lock_script_relocks() {
        let mut host = LoopbackHost::new(&config(), "1234");
        type_pin(&mut host, "1234");
        host.apply(&verify(), now());

        host.apply(
            &Command::RunScript {
                entity: id("script.door_lock_feedback"),
            },
            now(),
        );
        assert_eq!(state(&host, "lock.front_door"), "locked");
        assert_eq!(state(&host, "binary_sensor.front_door"), "off");
        assert_eq!(state(&host, "input_text.pin_feedback"), "LOCKED");
    }

    #[test]
    fn services_mutate_their_targets() {
        let mut host = LoopbackHost::new(&config(), "1234");
        let commands = [
            Command::Unlock {
                entity: id("lock.gate"),
            },
            Command::OpenCover {
                entity: id("cover.building_door"),
            },
            Command::Toggle {
                entity: id("input_boolean.notify_push_door"),
            },
            Command::SetTime {
                entity: id("input_datetime.door_notify_start"),
                time: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
            },
        ];
        for command in &commands {
            host.apply(command, now());
        }

        assert_eq!(state(&host, "lock.gate"), "unlocked");
        assert_eq!(state(&host, "cover.building_door"), "open");
        assert_eq!(state(&host, "input_boolean.notify_push_door"), "on");
        assert_eq!(state(&host, "input_datetime.door_notify_start"), "06:30:00");

        host.apply(&commands[2], now());
        assert_eq!(state(&host, "input_boolean.notify_push_door"), "off");
    }

    #[test]
    fn feed_updates_overlay_state() {
        let mut host = LoopbackHost::new(&config(), "1234");
        host.merge(
            StateSnapshot::new().with(id("binary_sensor.front_door"), EntityState::new("on")),
        );
        assert_eq!(state(&host, "binary_sensor.front_door"), "on");
        assert_eq!(state(&host, "lock.front_door"), "locked");
    }
}
