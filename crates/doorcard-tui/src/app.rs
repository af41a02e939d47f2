//! Application core: one widget, its loopback host, and the event loop.
//!
//! The loop waits on four sources at once: terminal keys, commands the
//! widget dispatched, feed updates, and the widget's pending render
//! deadline. Every command is applied to the host right away and the
//! resulting state is pushed back, just as a real host would echo it.

use std::time::Instant;

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use doorcard_core::{
    Command, ConfirmOutcome, CoreError, DoorWidget, RenderFrame, StateSnapshot, WidgetConfig,
};

use crate::event::{Event, EventReader};
use crate::host::LoopbackHost;
use crate::input::{EditStep, Input, TimeEdit, map_key};
use crate::tui::Tui;
use crate::ui::{self, Chrome};

enum Step {
    Event(Option<Event>),
    Command(Command),
    Feed(Option<StateSnapshot>),
    Timer,
}

pub struct App {
    widget: DoorWidget,
    host: LoopbackHost,
    commands: mpsc::UnboundedReceiver<Command>,
    feed: Option<mpsc::UnboundedReceiver<StateSnapshot>>,
    frame: RenderFrame,
    card: String,
    time_edit: Option<TimeEdit>,
    notice: Option<String>,
    running: bool,
}

impl App {
    pub fn new(
        card: String,
        config: WidgetConfig,
        pin: String,
        feed: Option<mpsc::UnboundedReceiver<StateSnapshot>>,
    ) -> Result<Self> {
        let (dispatcher, commands) = doorcard_core::CommandDispatcher::channel();
        let host = LoopbackHost::new(&config, pin);
        let widget = DoorWidget::new(config, dispatcher)?;
        let frame = widget.render();

        Ok(Self {
            widget,
            host,
            commands,
            feed,
            frame,
            card,
            time_edit: None,
            notice: None,
            running: true,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        let mut events = EventReader::new();

        self.start();

        while self.running {
            tui.draw(|f| self.draw(f))?;

            let deadline = self.widget.next_deadline();
            let step = tokio::select! {
                event = events.next() => Step::Event(event),
                Some(command) = self.commands.recv() => Step::Command(command),
                update = next_update(&mut self.feed) => Step::Feed(update),
                () = wait_until(deadline) => Step::Timer,
            };

            match step {
                Step::Event(None) => break,
                Step::Event(Some(Event::Key(key))) => self.handle_key(key),
                Step::Event(Some(Event::Resize)) => {}
                Step::Command(command) => self.apply(&command),
                Step::Feed(Some(update)) => {
                    self.host.merge(update);
                    self.push_host_state();
                }
                Step::Feed(None) => {
                    debug!("snapshot feed closed");
                    self.feed = None;
                }
                Step::Timer => {
                    if let Some(frame) = self.widget.poll_timer(Instant::now()) {
                        self.frame = frame;
                    }
                }
            }

            // Apply whatever the last step dispatched before drawing again.
            self.drain_commands();
        }

        self.widget.detach();
        events.stop();
        info!("card detached");
        Ok(())
    }

    /// Seed the widget with the host's state and attach it.
    fn start(&mut self) {
        self.push_host_state();
        self.frame = self.widget.attach(Instant::now());
        info!(card = %self.card, "card attached");
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(&command);
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        let chrome = Chrome {
            card: &self.card,
            notice: self.notice.as_deref(),
            time_edit: self.time_edit.as_ref(),
        };
        ui::render(frame, &self.frame, &chrome);
    }

    /// Apply an operator's command to the host and show its effect at once.
    fn apply(&mut self, command: &Command) {
        self.host.apply(command, Local::now().naive_local());
        self.push_host_state();
        if self.widget.is_attached() {
            self.frame = self.widget.render();
        }
    }

    fn push_host_state(&mut self) {
        match self.widget.push_state(self.host.snapshot(), Instant::now()) {
            Some(frame) => self.frame = frame,
            // Unwatched entities never signal the scheduler. Redraw unless a
            // trailing render is already due to pick them up.
            None if self.widget.is_attached() && self.widget.next_deadline().is_none() => {
                self.frame = self.widget.render();
            }
            None => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let Some(edit) = self.time_edit.as_mut() {
            match edit.handle(key) {
                EditStep::Continue => {}
                EditStep::Cancel => self.time_edit = None,
                EditStep::Invalid => self.notice = Some("expected a time as HH:MM".into()),
                EditStep::Submit(time) => {
                    let bound = edit.bound;
                    self.time_edit = None;
                    let result = self.widget.set_notification_time(bound, time);
                    self.report(result);
                }
            }
            return;
        }

        let Some(input) = map_key(self.widget.modal_state(), key) else {
            return;
        };
        self.notice = None;
        let result = self.handle_input(input);
        self.report(result);
    }

    fn handle_input(&mut self, input: Input) -> Result<(), CoreError> {
        match input {
            Input::Quit => self.running = false,
            Input::Open(kind) => self.frame = self.widget.open_modal(kind)?,
            Input::Close => self.frame = self.widget.close_modal(),
            Input::Confirm => {
                let (outcome, frame) = self.widget.confirm()?;
                if let ConfirmOutcome::Skipped { domain } = outcome {
                    self.notice = Some(format!("no open action for {domain} entities"));
                }
                self.frame = frame;
            }
            Input::Pin(key) => {
                if let Some(frame) = self.widget.press_key(key)? {
                    self.frame = frame;
                }
            }
            Input::LockNow => self.widget.lock_now()?,
            Input::Toggle(channel) => self.widget.toggle_notification(channel)?,
            Input::EditTime(bound) => self.time_edit = Some(TimeEdit::new(bound)),
        }
        Ok(())
    }

    fn report(&mut self, result: Result<(), CoreError>) {
        if let Err(err) = result {
            warn!(error = %err, "operation refused");
            self.notice = Some(err.to_string());
        }
    }
}

async fn next_update(
    feed: &mut Option<mpsc::UnboundedReceiver<StateSnapshot>>,
) -> Option<StateSnapshot> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
