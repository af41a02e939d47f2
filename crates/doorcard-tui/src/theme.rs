//! Palette and semantic styles for the card.

use ratatui::style::{Color, Modifier, Style};

use doorcard_core::{DoorStatus, FeedbackTone, LockStatus};

// ── Palette ───────────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const HIGHLIGHT: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const OK_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const WARN_ORANGE: Color = Color::Rgb(255, 184, 108); // #ffb86c
pub const ALERT_RED: Color = Color::Rgb(255, 99, 99); // #ff6363
pub const TEXT: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const MUTED: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn border_card() -> Style {
    Style::default().fg(MUTED)
}

/// Border of an open overlay.
pub fn border_overlay() -> Style {
    Style::default().fg(HIGHLIGHT)
}

pub fn label() -> Style {
    Style::default().fg(MUTED)
}

pub fn value() -> Style {
    Style::default().fg(TEXT)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn door(status: DoorStatus) -> Style {
    match status {
        DoorStatus::Open => Style::default().fg(WARN_ORANGE).add_modifier(Modifier::BOLD),
        DoorStatus::Closed => Style::default().fg(OK_GREEN),
        DoorStatus::Unavailable => Style::default().fg(ALERT_RED),
    }
}

pub fn lock(status: LockStatus) -> Style {
    match status {
        LockStatus::Locked => Style::default().fg(OK_GREEN),
        LockStatus::Unlocked => Style::default().fg(WARN_ORANGE),
    }
}

/// PIN feedback line. A wrong PIN blinks.
pub fn feedback(tone: FeedbackTone) -> Style {
    let base = Style::default().add_modifier(Modifier::BOLD);
    match tone {
        FeedbackTone::Neutral => base.fg(TEXT),
        FeedbackTone::Opened => base.fg(OK_GREEN),
        FeedbackTone::Locked => base.fg(WARN_ORANGE),
        FeedbackTone::Wrong => base.fg(ALERT_RED).add_modifier(Modifier::SLOW_BLINK),
    }
}

pub fn toggle(on: bool) -> Style {
    if on {
        Style::default().fg(OK_GREEN)
    } else {
        Style::default().fg(MUTED)
    }
}
