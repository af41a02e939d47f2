//! Modal controller: which overlay is open and what confirm/close do.
//!
//! ```text
//!            open(kind)                 confirm(entity) / close()
//!  Closed ──────────────▶ ConfirmGate ──────────────────────────▶ Closed
//!                         ConfirmBuilding
//!                         PinEntry | Snapshot | Settings ──close()──▶ Closed
//! ```
//!
//! `Closed` is both the initial state and re-enterable; there is no
//! terminal state. Opening while another overlay is up replaces it, going
//! through `close()` first so the PIN buffer never leaks across overlays.

use std::fmt;

use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::command::{Command, CommandDispatcher, OpenResolution, resolve_open};
use crate::config::WidgetConfig;
use crate::error::CoreError;
use crate::model::EntityId;
use crate::pin::PinEntryBuffer;

/// Overlay kinds an operator can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ModalKind {
    Gate,
    Building,
    Pin,
    Snapshot,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    ConfirmGate {
        target: EntityId,
    },
    ConfirmBuilding {
        target: EntityId,
    },
    PinEntry,
    Snapshot,
    Settings,
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Target entity of a confirmation overlay.
    pub fn confirm_target(&self) -> Option<&EntityId> {
        match self {
            Self::ConfirmGate { target } | Self::ConfirmBuilding { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for ModalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::ConfirmGate { .. } => "confirm-gate",
            Self::ConfirmBuilding { .. } => "confirm-building",
            Self::PinEntry => "pin-entry",
            Self::Snapshot => "snapshot",
            Self::Settings => "settings",
        };
        f.write_str(name)
    }
}

/// Result of a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Dispatched(Command),
    /// The target's domain has no open action; nothing was sent.
    Skipped { domain: String },
}

#[derive(Debug, Clone, Default)]
pub struct ModalController {
    state: ModalState,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Open an overlay, replacing whatever is currently shown.
    pub fn open(
        &mut self,
        kind: ModalKind,
        config: &WidgetConfig,
        pin: &mut PinEntryBuffer,
        dispatcher: &CommandDispatcher,
    ) -> Result<(), CoreError> {
        let next = match kind {
            ModalKind::Gate => ModalState::ConfirmGate {
                target: config
                    .gate
                    .clone()
                    .ok_or(CoreError::NotConfigured { role: "gate" })?,
            },
            ModalKind::Building => ModalState::ConfirmBuilding {
                target: config
                    .building_door
                    .clone()
                    .ok_or(CoreError::NotConfigured { role: "building-door" })?,
            },
            ModalKind::Pin => {
                if config.smartlock.is_none() {
                    return Err(CoreError::NotConfigured { role: "smartlock" });
                }
                ModalState::PinEntry
            }
            ModalKind::Snapshot => ModalState::Snapshot,
            ModalKind::Settings => ModalState::Settings,
        };

        if self.state.is_open() {
            debug!(from = %self.state, to = %next, "replacing open modal");
            self.close(pin, dispatcher);
        }
        debug!(modal = %next, "opening modal");
        self.state = next;
        Ok(())
    }

    /// Close from any state. Always resets the PIN buffer and clears the
    /// pin-display entity, whichever overlay was open.
    pub fn close(&mut self, pin: &mut PinEntryBuffer, dispatcher: &CommandDispatcher) {
        self.state = ModalState::Closed;
        pin.clear(dispatcher);
    }

    /// Confirm the open gate/building overlay for `entity`.
    ///
    /// Dispatches at most one open command, then closes no matter whether
    /// the domain was supported.
    pub fn confirm(
        &mut self,
        entity: &EntityId,
        pin: &mut PinEntryBuffer,
        dispatcher: &CommandDispatcher,
    ) -> Result<ConfirmOutcome, CoreError> {
        if self.state.confirm_target().is_none() {
            return Err(CoreError::transition("confirm", &self.state));
        }

        let outcome = match resolve_open(entity) {
            OpenResolution::Dispatch(cmd) => {
                dispatcher.dispatch(cmd.clone());
                ConfirmOutcome::Dispatched(cmd)
            }
            OpenResolution::UnsupportedDomain { domain } => {
                warn!(entity = %entity, %domain, "no open action for entity domain");
                ConfirmOutcome::Skipped { domain }
            }
        };

        self.close(pin, dispatcher);
        Ok(outcome)
    }

    /// Forget the overlay without any host writes (instance teardown).
    pub(crate) fn discard(&mut self) {
        self.state = ModalState::Closed;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pin::Digit;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        modal: ModalController,
        pin: PinEntryBuffer,
        dispatcher: CommandDispatcher,
        rx: UnboundedReceiver<Command>,
        config: WidgetConfig,
    }

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    fn fixture(gate: &str) -> Fixture {
        let config = WidgetConfig {
            smartlock: Some(id("lock.front_door")),
            gate: Some(id(gate)),
            building_door: Some(id("cover.building_door")),
            ..WidgetConfig::default()
        };
        let (dispatcher, rx) = CommandDispatcher::channel();
        let pin = PinEntryBuffer::new(
            config.helpers.pin_display.clone(),
            config.helpers.pin_verify_script.clone(),
        );
        Fixture {
            modal: ModalController::new(),
            pin,
            dispatcher,
            rx,
            config,
        }
    }

    impl Fixture {
        fn open(&mut self, kind: ModalKind) -> Result<(), CoreError> {
            self.modal
                .open(kind, &self.config, &mut self.pin, &self.dispatcher)
        }

        fn drain(&mut self) -> Vec<Command> {
            std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
        }
    }

    fn clear_write() -> Command {
        Command::SetText {
            entity: id("input_text.pin_display"),
            value: String::new(),
        }
    }

    #[test]
    fn starts_closed() {
        let f = fixture("lock.gate");
        assert_eq!(f.modal.state(), &ModalState::Closed);
        assert!(!f.modal.is_open());
    }

    #[test]
    fn open_gate_then_confirm_unlocks_once() {
        let mut f = fixture("lock.gate");
        f.open(ModalKind::Gate).unwrap();
        assert_eq!(
            f.modal.state(),
            &ModalState::ConfirmGate {
                target: id("lock.gate")
            }
        );

        let outcome = f
            .modal
            .confirm(&id("lock.gate"), &mut f.pin, &f.dispatcher)
            .unwrap();
        let unlock = Command::Unlock {
            entity: id("lock.gate"),
        };
        assert_eq!(outcome, ConfirmOutcome::Dispatched(unlock.clone()));
        assert_eq!(f.modal.state(), &ModalState::Closed);
        assert_eq!(f.drain(), vec![unlock, clear_write()]);
    }

    #[test]
    fn unsupported_domain_still_closes() {
        let mut f = fixture("light.gate_lamp");
        f.open(ModalKind::Gate).unwrap();

        let outcome = f
            .modal
            .confirm(&id("light.gate_lamp"), &mut f.pin, &f.dispatcher)
            .unwrap();
        assert_eq!(
            outcome,
            ConfirmOutcome::Skipped {
                domain: "light".into()
            }
        );
        assert_eq!(f.modal.state(), &ModalState::Closed);
        assert_eq!(f.drain(), vec![clear_write()]);
    }

    #[test]
    fn confirm_outside_confirmation_is_rejected() {
        let mut f = fixture("lock.gate");
        for kind in [ModalKind::Pin, ModalKind::Snapshot, ModalKind::Settings] {
            f.open(kind).unwrap();
            let before = f.modal.state().clone();
            let err = f
                .modal
                .confirm(&id("lock.gate"), &mut f.pin, &f.dispatcher)
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { .. }));
            assert_eq!(f.modal.state(), &before);
        }

        f.modal.close(&mut f.pin, &f.dispatcher);
        assert!(
            f.modal
                .confirm(&id("lock.gate"), &mut f.pin, &f.dispatcher)
                .is_err()
        );
    }

    #[test]
    fn close_always_clears_pin_from_every_state() {
        for kind in [
            None,
            Some(ModalKind::Gate),
            Some(ModalKind::Building),
            Some(ModalKind::Pin),
            Some(ModalKind::Snapshot),
            Some(ModalKind::Settings),
        ] {
            let mut f = fixture("lock.gate");
            if let Some(kind) = kind {
                f.open(kind).unwrap();
            }
            f.pin.append_digit(Digit::new(3).unwrap(), &f.dispatcher);
            f.drain();

            f.modal.close(&mut f.pin, &f.dispatcher);
            assert!(f.pin.is_empty(), "{kind:?}");
            assert_eq!(f.drain(), vec![clear_write()], "{kind:?}");
            assert_eq!(f.modal.state(), &ModalState::Closed);
        }
    }

    #[test]
    fn reopening_replaces_current_modal() {
        let mut f = fixture("lock.gate");
        f.open(ModalKind::Pin).unwrap();
        f.pin.append_digit(Digit::new(1).unwrap(), &f.dispatcher);
        f.drain();

        f.open(ModalKind::Settings).unwrap();
        assert_eq!(f.modal.state(), &ModalState::Settings);
        assert!(f.pin.is_empty());
        assert_eq!(f.drain(), vec![clear_write()]);
    }

    #[test]
    fn unconfigured_controls_cannot_open() {
        let mut f = fixture("lock.gate");
        f.config.building_door = None;
        f.config.smartlock = None;
        assert_eq!(
            f.open(ModalKind::Building),
            Err(CoreError::NotConfigured { role: "building-door" })
        );
        assert!(f.open(ModalKind::Pin).is_err());
        assert_eq!(f.modal.state(), &ModalState::Closed);
    }

    #[test]
    fn kinds_parse_from_names() {
        assert_eq!("building".parse::<ModalKind>().unwrap(), ModalKind::Building);
        assert_eq!(ModalKind::Pin.to_string(), "pin");
    }
}
