//! Drawing a [`RenderFrame`]: the card face, the open overlay, the status line.
//!
//! Nothing here reads entity state. Everything shown comes from the frame
//! the widget produced, plus the app's own chrome (card name, last notice,
//! an in-progress time edit).

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use doorcard_core::{
    DisplayModel, ModalView, NotificationSettings, PinFeedback, RenderFrame, WindowBound,
};

use crate::input::TimeEdit;
use crate::theme;

/// App-side decoration around the widget's frame.
#[derive(Debug, Default)]
pub struct Chrome<'a> {
    pub card: &'a str,
    pub notice: Option<&'a str>,
    pub time_edit: Option<&'a TimeEdit>,
}

pub fn render(frame: &mut Frame, view: &RenderFrame, chrome: &Chrome<'_>) {
    let [card_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    render_card(frame, card_area, &view.display, chrome.card);
    render_status(frame, status_area, chrome.notice);

    match &view.modal {
        None => {}
        Some(ModalView::ConfirmGate { target }) => {
            render_confirm(frame, card_area, "Open gate", target.as_str());
        }
        Some(ModalView::ConfirmBuilding { target }) => {
            render_confirm(frame, card_area, "Open building door", target.as_str());
        }
        Some(ModalView::PinEntry { feedback }) => render_pin(frame, card_area, feedback),
        Some(ModalView::Snapshot { image }) => render_snapshot(frame, card_area, image),
        Some(ModalView::Settings(settings)) => {
            render_settings(frame, card_area, settings, chrome.time_edit);
        }
    }
}

/// Key hints for the closed card. Only configured controls are offered.
pub fn control_hints(display: &DisplayModel) -> Vec<(&'static str, &'static str)> {
    let mut hints = Vec::with_capacity(6);
    if display.smartlock.is_some() {
        hints.push(("p", "pin"));
    }
    if display.gate.is_some() {
        hints.push(("g", "gate"));
    }
    if display.building_door.is_some() {
        hints.push(("b", "building"));
    }
    hints.extend([("s", "snapshot"), (",", "settings"), ("q", "quit")]);
    hints
}

/// A `width` x `height` rectangle centered in `area`, clipped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height);
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    Rect::new(area.x + x, area.y + y, width, height)
}

fn hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!("{key} "), theme::key_hint_key()));
        spans.push(Span::styled(format!("{label}  "), theme::key_hint()));
    }
    Line::from(spans)
}

fn row<'a>(label: &'a str, value: impl Into<String>, style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {label:<12}"), theme::label()),
        Span::styled(value.into(), style),
    ])
}

fn render_card(frame: &mut Frame, area: Rect, display: &DisplayModel, card: &str) {
    let block = Block::default()
        .title(format!(" {card} "))
        .title_style(theme::title_style())
        .title_bottom(Line::styled(
            format!(" {} {} ", display.settings.clock, display.settings.date),
            theme::label(),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_card());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        row("Door", display.door.label(), theme::door(display.door)),
        row("Last opened", display.last_open.clone(), theme::value()),
    ];
    if let Some(lock) = display.smartlock {
        lines.push(row("Smartlock", lock.label(), theme::lock(lock)));
    }
    if let Some(gate) = display.gate {
        lines.push(row("Gate", gate.label(), theme::lock(gate)));
    }
    if let Some(building) = &display.building_door {
        lines.push(row("Building", building.clone(), theme::value()));
    }
    lines.push(Line::from(""));
    lines.push(hint_line(&control_hints(display)));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_status(frame: &mut Frame, area: Rect, notice: Option<&str>) {
    let line = match notice {
        Some(message) => Line::from(vec![
            Span::styled(" ! ", Style::default().fg(theme::WARN_ORANGE)),
            Span::styled(message.to_owned(), theme::value()),
        ]),
        None => Line::from(Span::styled(" ready", theme::key_hint())),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Clear `area` and draw an overlay frame around it, returning the inside.
fn overlay(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_overlay())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

fn render_confirm(frame: &mut Frame, area: Rect, title: &str, target: &str) {
    let inner = overlay(frame, centered(area, 44, 6), "Confirm");
    let text = vec![
        Line::styled(format!(" {title}?"), theme::value()),
        Line::styled(format!(" {target}"), theme::label()),
        Line::from(""),
        hint_line(&[("y", "confirm"), ("n", "cancel")]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_pin(frame: &mut Frame, area: Rect, feedback: &PinFeedback) {
    let inner = overlay(frame, centered(area, 44, 6), "PIN");
    let text = vec![
        Line::styled(format!("  {}", feedback.text), theme::feedback(feedback.tone)),
        Line::from(""),
        hint_line(&[("0-9", "digit"), ("⌫", "clear"), ("⏎", "submit")]),
        hint_line(&[("l", "lock now"), ("Esc", "close")]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_snapshot(frame: &mut Frame, area: Rect, image: &str) {
    let inner = overlay(frame, centered(area, 50, 5), "Snapshot");
    let text = vec![
        Line::styled(format!(" {image}"), theme::value()),
        Line::from(""),
        hint_line(&[("Esc", "close")]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_settings(
    frame: &mut Frame,
    area: Rect,
    settings: &NotificationSettings,
    edit: Option<&TimeEdit>,
) {
    let inner = overlay(frame, centered(area, 44, 10), "Notifications");

    let on_off = |on: bool| if on { "on" } else { "off" };
    let window = |bound: WindowBound, current: &str| match edit {
        Some(edit) if edit.bound == bound => (format!("{}█", edit.text), theme::key_hint_key()),
        _ => (current.to_owned(), theme::value()),
    };
    let (start, start_style) = window(WindowBound::Start, &settings.start);
    let (end, end_style) = window(WindowBound::End, &settings.end);

    let text = vec![
        row("Telegram", on_off(settings.telegram), theme::toggle(settings.telegram)),
        row("Push", on_off(settings.push), theme::toggle(settings.push)),
        row("From", start, start_style),
        row("Until", end, end_style),
        Line::from(""),
        hint_line(&[("t", "telegram"), ("h", "push")]),
        hint_line(&[("a", "from"), ("e", "until"), ("Esc", "close")]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use doorcard_core::view::derive;
    use doorcard_core::{EntityId, EntityState, FeedbackTone, StateSnapshot, WidgetConfig};
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    fn display(config: &WidgetConfig) -> DisplayModel {
        let snapshot = StateSnapshot::new()
            .with(id("binary_sensor.front_door"), EntityState::new("on"))
            .with(id("lock.front_door"), EntityState::new("unlocked"));
        derive(&snapshot, config)
    }

    fn draw(view: &RenderFrame, chrome: &Chrome<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| render(f, view, chrome)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn hints_follow_configured_controls() {
        let config = WidgetConfig {
            gate: Some(id("lock.gate")),
            ..WidgetConfig::default()
        };
        assert_eq!(
            control_hints(&display(&config)),
            vec![("g", "gate"), ("s", "snapshot"), (",", "settings"), ("q", "quit")]
        );

        let config = WidgetConfig {
            smartlock: Some(id("lock.front_door")),
            gate: Some(id("lock.gate")),
            building_door: Some(id("cover.building_door")),
            ..WidgetConfig::default()
        };
        let keys: Vec<_> = control_hints(&display(&config))
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["p", "g", "b", "s", ",", "q"]);
    }

    #[test]
    fn centered_fits_inside_area() {
        let area = Rect::new(0, 0, 30, 10);
        assert_eq!(centered(area, 10, 4), Rect::new(10, 3, 10, 4));
        assert_eq!(centered(area, 80, 40), Rect::new(1, 0, 28, 10));
    }

    #[test]
    fn card_face_shows_door_and_controls() {
        let config = WidgetConfig {
            sensor: Some(id("binary_sensor.front_door")),
            smartlock: Some(id("lock.front_door")),
            ..WidgetConfig::default()
        };
        let view = RenderFrame {
            display: display(&config),
            modal: None,
        };
        let out = draw(
            &view,
            &Chrome {
                card: "front",
                ..Chrome::default()
            },
        );

        assert!(out.contains(" front "));
        assert!(out.contains("Open"));
        assert!(out.contains("Unlocked"));
        assert!(out.contains("--:--"));
        assert!(!out.contains("Gate"));
    }

    #[test]
    fn pin_overlay_shows_feedback() {
        let config = WidgetConfig {
            smartlock: Some(id("lock.front_door")),
            ..WidgetConfig::default()
        };
        let view = RenderFrame {
            display: display(&config),
            modal: Some(ModalView::PinEntry {
                feedback: PinFeedback {
                    text: "WRONG".into(),
                    tone: FeedbackTone::Wrong,
                },
            }),
        };
        let out = draw(&view, &Chrome::default());
        assert!(out.contains("PIN"));
        assert!(out.contains("WRONG"));
    }

    #[test]
    fn settings_overlay_shows_time_being_edited() {
        let config = WidgetConfig {
            gate: Some(id("lock.gate")),
            ..WidgetConfig::default()
        };
        let display = display(&config);
        let view = RenderFrame {
            modal: Some(ModalView::Settings(display.settings.clone())),
            display,
        };
        let edit = TimeEdit {
            bound: WindowBound::End,
            text: "21:3".into(),
        };
        let out = draw(
            &view,
            &Chrome {
                time_edit: Some(&edit),
                notice: Some("invalid time"),
                ..Chrome::default()
            },
        );

        assert!(out.contains("07:00"));
        assert!(out.contains("21:3█"));
        assert!(out.contains("invalid time"));
    }
}
