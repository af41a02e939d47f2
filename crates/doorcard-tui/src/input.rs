//! Key bindings: which widget operation a key press means in each overlay.

use chrono::NaiveTime;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use doorcard_core::{Digit, ModalKind, ModalState, NotifyChannel, PinKey, WindowBound};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Quit,
    Open(ModalKind),
    Close,
    Confirm,
    Pin(PinKey),
    LockNow,
    Toggle(NotifyChannel),
    EditTime(WindowBound),
}

/// Map a key to an operation for the overlay currently shown.
pub fn map_key(state: &ModalState, key: KeyEvent) -> Option<Input> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Input::Quit);
    }

    match state {
        ModalState::Closed => match key.code {
            KeyCode::Char('q') => Some(Input::Quit),
            KeyCode::Char('p') => Some(Input::Open(ModalKind::Pin)),
            KeyCode::Char('g') => Some(Input::Open(ModalKind::Gate)),
            KeyCode::Char('b') => Some(Input::Open(ModalKind::Building)),
            KeyCode::Char('s') => Some(Input::Open(ModalKind::Snapshot)),
            KeyCode::Char(',') => Some(Input::Open(ModalKind::Settings)),
            _ => None,
        },
        ModalState::ConfirmGate { .. } | ModalState::ConfirmBuilding { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => Some(Input::Confirm),
            KeyCode::Char('n') | KeyCode::Esc => Some(Input::Close),
            _ => None,
        },
        ModalState::PinEntry => match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                Digit::try_from(c).ok().map(|d| Input::Pin(PinKey::Digit(d)))
            }
            KeyCode::Backspace | KeyCode::Delete => Some(Input::Pin(PinKey::Clear)),
            KeyCode::Enter => Some(Input::Pin(PinKey::Submit)),
            KeyCode::Char('l') => Some(Input::LockNow),
            KeyCode::Esc => Some(Input::Close),
            _ => None,
        },
        ModalState::Snapshot => match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(Input::Close),
            _ => None,
        },
        ModalState::Settings => match key.code {
            KeyCode::Char('t') => Some(Input::Toggle(NotifyChannel::Telegram)),
            KeyCode::Char('h') => Some(Input::Toggle(NotifyChannel::Push)),
            KeyCode::Char('a') => Some(Input::EditTime(WindowBound::Start)),
            KeyCode::Char('e') => Some(Input::EditTime(WindowBound::End)),
            KeyCode::Esc => Some(Input::Close),
            _ => None,
        },
    }
}

/// Result of feeding a key to a [`TimeEdit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStep {
    Continue,
    Cancel,
    Submit(NaiveTime),
    Invalid,
}

/// In-progress `HH:MM` entry for one end of the notification window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEdit {
    pub bound: WindowBound,
    pub text: String,
}

impl TimeEdit {
    const MAX_LEN: usize = 5;

    pub fn new(bound: WindowBound) -> Self {
        Self {
            bound,
            text: String::with_capacity(Self::MAX_LEN),
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> EditStep {
        match key.code {
            KeyCode::Esc => EditStep::Cancel,
            KeyCode::Backspace => {
                self.text.pop();
                EditStep::Continue
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => {
                if self.text.len() < Self::MAX_LEN {
                    self.text.push(c);
                }
                EditStep::Continue
            }
            KeyCode::Enter => NaiveTime::parse_from_str(&self.text, "%H:%M")
                .map_or(EditStep::Invalid, EditStep::Submit),
            _ => EditStep::Continue,
        }
    }
}
