// ── Core error types ──
//
// Everything the widget can refuse to do. Missing entity state is NOT an
// error anywhere in the core -- the view model substitutes placeholders.
// Dispatch failures never surface here either: the command sink owns them.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ── Setup errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid entity id '{raw}': expected <domain>.<object_id>")]
    InvalidEntityId { raw: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("No {role} entity configured")]
    NotConfigured { role: &'static str },

    #[error("Cannot {operation} while modal is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },
}

impl CoreError {
    pub(crate) fn transition(operation: &'static str, state: impl ToString) -> Self {
        Self::InvalidTransition {
            operation,
            state: state.to_string(),
        }
    }
}
