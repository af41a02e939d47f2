//! PIN entry buffer.
//!
//! Digits typed on the keypad live only here, at most [`PIN_LENGTH`] of
//! them. Every change is echoed to the host's pin-display entity so the
//! host-side verification script sees what was typed.

use serde::Serialize;

use crate::command::{Command, CommandDispatcher};
use crate::config::FeedbackVocabulary;
use crate::model::EntityId;

pub const PIN_LENGTH: usize = 4;

const MASK: char = '\u{2022}';

/// A single keypad digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digit(char);

impl Digit {
    pub fn new(value: u8) -> Option<Self> {
        (value <= 9).then(|| Self(char::from(b'0' + value)))
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl TryFrom<char> for Digit {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        if c.is_ascii_digit() { Ok(Self(c)) } else { Err(c) }
    }
}

/// Keys on the PIN pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKey {
    Digit(Digit),
    Clear,
    Submit,
}

/// How the feedback line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedbackTone {
    Neutral,
    Opened,
    Locked,
    /// Shown in red and pulsing.
    Wrong,
}

/// Text shown above the keypad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinFeedback {
    pub text: String,
    pub tone: FeedbackTone,
}

#[derive(Debug, Clone)]
pub struct PinEntryBuffer {
    digits: String,
    display: EntityId,
    verify_script: EntityId,
}

impl PinEntryBuffer {
    pub fn new(display: EntityId, verify_script: EntityId) -> Self {
        Self {
            digits: String::with_capacity(PIN_LENGTH),
            display,
            verify_script,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Append a digit and echo the buffer. A full buffer ignores the digit
    /// and returns `false`.
    pub fn append_digit(&mut self, digit: Digit, dispatcher: &CommandDispatcher) -> bool {
        if self.digits.len() >= PIN_LENGTH {
            return false;
        }
        self.digits.push(digit.as_char());
        self.write_display(self.digits.clone(), dispatcher);
        true
    }

    pub fn clear(&mut self, dispatcher: &CommandDispatcher) {
        self.digits.clear();
        self.write_display(String::new(), dispatcher);
    }

    /// Send the buffer for verification and reset it.
    ///
    /// The verification script runs fire-and-forget; the buffer is emptied
    /// whatever the outcome turns out to be.
    pub fn commit(&mut self, dispatcher: &CommandDispatcher) {
        let pin = std::mem::take(&mut self.digits);
        self.write_display(pin, dispatcher);
        dispatcher.dispatch(Command::RunScript {
            entity: self.verify_script.clone(),
        });
    }

    /// Drop the digits without telling the host.
    pub(crate) fn discard(&mut self) {
        self.digits.clear();
    }

    /// Feedback line: host feedback when it is not idle, otherwise one mask
    /// character per typed digit, or the idle marker when nothing is typed.
    pub fn feedback(&self, reported: Option<&str>, vocabulary: &FeedbackVocabulary) -> PinFeedback {
        match reported {
            Some(value) if !value.is_empty() && value != vocabulary.idle => {
                let tone = if value == vocabulary.opened {
                    FeedbackTone::Opened
                } else if value == vocabulary.locked {
                    FeedbackTone::Locked
                } else if value == vocabulary.wrong {
                    FeedbackTone::Wrong
                } else {
                    FeedbackTone::Neutral
                };
                PinFeedback {
                    text: value.to_owned(),
                    tone,
                }
            }
            _ => {
                let text = if self.digits.is_empty() {
                    vocabulary.idle.clone()
                } else {
                    std::iter::repeat_n(MASK, self.digits.len()).collect()
                };
                PinFeedback {
                    text,
                    tone: FeedbackTone::Neutral,
                }
            }
        }
    }

    fn write_display(&self, value: String, dispatcher: &CommandDispatcher) {
        dispatcher.dispatch(Command::SetText {
            entity: self.display.clone(),
            value,
        });
    }
}
