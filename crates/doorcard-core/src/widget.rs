//! The card instance. Owns every piece of per-widget mutable state.
//!
//! A [`DoorWidget`] is created from a validated [`WidgetConfig`] and lives
//! for as long as the host keeps it attached. State pushes flow through
//! the observer and scheduler; operator input flows through the modal
//! controller and PIN buffer into the [`CommandDispatcher`].
//!
//! Renders are always derived from the live snapshot at the moment they
//! execute, never from the snapshot that triggered them.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveTime;
use tracing::{debug, info};

use crate::command::{Command, CommandDispatcher};
use crate::config::WidgetConfig;
use crate::error::CoreError;
use crate::modal::{ConfirmOutcome, ModalController, ModalKind, ModalState};
use crate::model::StateSnapshot;
use crate::observer::StateObserver;
use crate::pin::{PinEntryBuffer, PinKey};
use crate::scheduler::{RenderScheduler, Schedule};
use crate::view::{self, ModalView, RenderFrame};

/// Notification channels toggled from the settings overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    Telegram,
    Push,
}

/// Ends of the notification window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowBound {
    Start,
    End,
}

pub struct DoorWidget {
    config: WidgetConfig,
    observer: StateObserver,
    scheduler: RenderScheduler,
    modal: ModalController,
    pin: PinEntryBuffer,
    snapshot: Arc<StateSnapshot>,
    dispatcher: CommandDispatcher,
    attached: bool,
}

impl DoorWidget {
    /// Set up a card instance. Fails before anything renders when the
    /// configuration names no control entity.
    pub fn new(config: WidgetConfig, dispatcher: CommandDispatcher) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            observer: observer_for(&config),
            scheduler: RenderScheduler::new(config.debounce),
            modal: ModalController::new(),
            pin: pin_for(&config),
            snapshot: Arc::new(StateSnapshot::new()),
            dispatcher,
            attached: false,
            config,
        })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn modal_state(&self) -> &ModalState {
        self.modal.state()
    }

    pub fn pin(&self) -> &PinEntryBuffer {
        &self.pin
    }

    pub fn snapshot(&self) -> &Arc<StateSnapshot> {
        &self.snapshot
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Attach to the host and render from whatever state is known. The
    /// render counts toward the debounce window starting at `now`.
    pub fn attach(&mut self, now: Instant) -> RenderFrame {
        self.attached = true;
        info!("widget attached");
        self.scheduler.mark_rendered(now);
        self.render()
    }

    /// Detach from the host. Cancels any pending render and discards the
    /// render and modal state; no host writes are issued.
    pub fn detach(&mut self) {
        if self.scheduler.cancel() {
            debug!("cancelled pending render on detach");
        }
        self.scheduler.reset();
        self.observer.reset();
        self.modal.discard();
        self.pin.discard();
        self.attached = false;
        info!("widget detached");
    }

    /// Replace the configuration wholesale, as a fresh setup would.
    ///
    /// Renders only while attached; a detached widget picks the new
    /// configuration up on its next [`attach`](Self::attach).
    pub fn reconfigure(
        &mut self,
        config: WidgetConfig,
        now: Instant,
    ) -> Result<Option<RenderFrame>, CoreError> {
        config.validate()?;
        if self.modal.is_open() {
            self.modal.close(&mut self.pin, &self.dispatcher);
        }
        self.observer = observer_for(&config);
        self.scheduler = RenderScheduler::new(config.debounce);
        self.pin = pin_for(&config);
        self.config = config;
        info!("widget reconfigured");
        if !self.attached {
            return Ok(None);
        }
        self.scheduler.mark_rendered(now);
        Ok(Some(self.render()))
    }

    // ── State sync ───────────────────────────────────────────────────

    /// Accept a host snapshot. Returns a frame when it renders right away;
    /// a deferred render is reported through [`next_deadline`](Self::next_deadline).
    pub fn push_state(&mut self, snapshot: Arc<StateSnapshot>, now: Instant) -> Option<RenderFrame> {
        self.snapshot = snapshot;
        if !self.attached || !self.observer.observe(&self.snapshot) {
            return None;
        }
        match self.scheduler.signal(now) {
            Schedule::Immediate => Some(self.render()),
            Schedule::Deferred { deadline } => {
                debug!(?deadline, "render deferred");
                None
            }
        }
    }

    /// Deadline of the pending trailing render, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.pending_deadline()
    }

    /// Run the trailing render if its deadline has passed.
    pub fn poll_timer(&mut self, now: Instant) -> Option<RenderFrame> {
        if self.attached && self.scheduler.fire(now) {
            debug!("trailing render fired");
            Some(self.render())
        } else {
            None
        }
    }

    /// Derive the frame from live state, including the open overlay.
    pub fn render(&self) -> RenderFrame {
        RenderFrame {
            display: view::derive(&self.snapshot, &self.config),
            modal: self.modal_view(),
        }
    }

    fn modal_view(&self) -> Option<ModalView> {
        let snapshot = &self.snapshot;
        match self.modal.state() {
            ModalState::Closed => None,
            ModalState::ConfirmGate { target } => Some(ModalView::ConfirmGate {
                target: target.clone(),
            }),
            ModalState::ConfirmBuilding { target } => Some(ModalView::ConfirmBuilding {
                target: target.clone(),
            }),
            ModalState::PinEntry => Some(ModalView::PinEntry {
                feedback: self.pin.feedback(
                    snapshot.state_of(&self.config.helpers.pin_feedback),
                    &self.config.feedback,
                ),
            }),
            ModalState::Snapshot => Some(ModalView::Snapshot {
                image: view::snapshot_image(snapshot, &self.config),
            }),
            ModalState::Settings => Some(ModalView::Settings(view::notification_settings(
                snapshot,
                &self.config,
            ))),
        }
    }

    // ── Operator input ───────────────────────────────────────────────

    pub fn open_modal(&mut self, kind: ModalKind) -> Result<RenderFrame, CoreError> {
        self.modal
            .open(kind, &self.config, &mut self.pin, &self.dispatcher)?;
        Ok(self.render())
    }

    pub fn close_modal(&mut self) -> RenderFrame {
        self.modal.close(&mut self.pin, &self.dispatcher);
        self.render()
    }

    /// Confirm the open gate/building overlay.
    pub fn confirm(&mut self) -> Result<(ConfirmOutcome, RenderFrame), CoreError> {
        let target = self
            .modal
            .state()
            .confirm_target()
            .cloned()
            .ok_or_else(|| CoreError::transition("confirm", self.modal.state()))?;
        let outcome = self
            .modal
            .confirm(&target, &mut self.pin, &self.dispatcher)?;
        Ok((outcome, self.render()))
    }

    /// Handle a keypad press. Returns the refreshed frame, or `None` when
    /// the key was ignored (a fifth digit).
    pub fn press_key(&mut self, key: PinKey) -> Result<Option<RenderFrame>, CoreError> {
        self.require(&ModalState::PinEntry, "use the keypad")?;
        match key {
            PinKey::Digit(digit) => {
                if !self.pin.append_digit(digit, &self.dispatcher) {
                    return Ok(None);
                }
            }
            PinKey::Clear => self.pin.clear(&self.dispatcher),
            PinKey::Submit => self.pin.commit(&self.dispatcher),
        }
        Ok(Some(self.render()))
    }

    /// Lock the door from the PIN pad. The feedback entity reports the
    /// result, which arrives as a regular state push.
    pub fn lock_now(&mut self) -> Result<(), CoreError> {
        self.require(&ModalState::PinEntry, "lock")?;
        self.dispatcher.dispatch(Command::RunScript {
            entity: self.config.helpers.lock_script.clone(),
        });
        Ok(())
    }

    pub fn toggle_notification(&mut self, channel: NotifyChannel) -> Result<(), CoreError> {
        self.require(&ModalState::Settings, "toggle notifications")?;
        let entity = match channel {
            NotifyChannel::Telegram => &self.config.helpers.notify_telegram,
            NotifyChannel::Push => &self.config.helpers.notify_push,
        };
        self.dispatcher.dispatch(Command::Toggle {
            entity: entity.clone(),
        });
        Ok(())
    }

    pub fn set_notification_time(
        &mut self,
        bound: WindowBound,
        time: NaiveTime,
    ) -> Result<(), CoreError> {
        self.require(&ModalState::Settings, "set the notification window")?;
        let entity = match bound {
            WindowBound::Start => &self.config.helpers.notify_start,
            WindowBound::End => &self.config.helpers.notify_end,
        };
        self.dispatcher.dispatch(Command::SetTime {
            entity: entity.clone(),
            time,
        });
        Ok(())
    }

    fn require(&self, expected: &ModalState, operation: &'static str) -> Result<(), CoreError> {
        if self.modal.state() == expected {
            Ok(())
        } else {
            Err(CoreError::transition(operation, self.modal.state()))
        }
    }
}

fn observer_for(config: &WidgetConfig) -> StateObserver {
    StateObserver::new(config.sensor.clone(), config.helpers.pin_feedback.clone())
}

fn pin_for(config: &WidgetConfig) -> PinEntryBuffer {
    PinEntryBuffer::new(
        config.helpers.pin_display.clone(),
        config.helpers.pin_verify_script.clone(),
    )
}
