//! Logic layer of the door/gate control card.
//!
//! This crate owns everything a dashboard card instance decides on its own,
//! with no knowledge of how it is drawn or how commands reach devices:
//!
//! - **[`DoorWidget`]**: One card instance. Takes pushed
//!   [`StateSnapshot`]s, decides when to render, and turns operator input
//!   into [`Command`]s. [`attach()`](DoorWidget::attach) /
//!   [`detach()`](DoorWidget::detach) bracket its lifetime on a host.
//!
//! - **[`StateObserver`]**: Fingerprints the watched subset of state (door
//!   sensor and PIN feedback) so unrelated entity churn costs nothing.
//!
//! - **[`RenderScheduler`]**: Trailing-edge debounce driven by explicit
//!   [`Instant`](std::time::Instant)s. Hosts arm their own timer for
//!   [`pending_deadline()`](RenderScheduler::pending_deadline).
//!
//! - **[`ModalController`]** / **[`PinEntryBuffer`]**: The overlay state
//!   machine and the four-digit keypad buffer behind it.
//!
//! - **[`Command`]**: Typed writes pushed through a [`CommandDispatcher`]
//!   onto an `mpsc` queue. Nothing in this crate awaits their outcome.
//!
//! - **View model** ([`view`]): Pure derivation of [`RenderFrame`]s.

pub mod command;
pub mod config;
pub mod error;
pub mod modal;
pub mod model;
pub mod observer;
pub mod pin;
pub mod scheduler;
pub mod view;
pub mod widget;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{ActionDomain, Command, CommandDispatcher, OpenResolution, ServiceCall};
pub use config::{FeedbackVocabulary, HelperEntities, WidgetConfig};
pub use error::CoreError;
pub use modal::{ConfirmOutcome, ModalController, ModalKind, ModalState};
pub use model::{EntityId, EntityState, StateSnapshot};
pub use observer::StateObserver;
pub use pin::{Digit, FeedbackTone, PIN_LENGTH, PinEntryBuffer, PinFeedback, PinKey};
pub use scheduler::{RENDER_DEBOUNCE, RenderScheduler, Schedule};
pub use view::{DisplayModel, DoorStatus, LockStatus, ModalView, NotificationSettings, RenderFrame};
pub use widget::{DoorWidget, NotifyChannel, WindowBound};
