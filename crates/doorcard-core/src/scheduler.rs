// ── Render scheduler ──
//
// Trailing-edge debounce over change signals. The scheduler never sleeps
// and never owns a timer task: callers pass `now` in, and hosts arm their
// own timer for `pending_deadline()`. That keeps it single-threaded and
// lets tests drive time explicitly.

use std::time::{Duration, Instant};

use tracing::trace;

/// Default debounce window.
pub const RENDER_DEBOUNCE: Duration = Duration::from_millis(100);

/// What a change signal resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Render right away.
    Immediate,
    /// A trailing render is armed for `deadline`.
    Deferred { deadline: Instant },
}

/// Coalesces bursts of change signals into single renders.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    window: Duration,
    last_render: Option<Instant>,
    pending: Option<Instant>,
}

impl RenderScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_render: None,
            pending: None,
        }
    }

    /// Register a change signal at `now`.
    ///
    /// Renders immediately only when the window since the last render has
    /// elapsed and nothing is pending; otherwise (re)arms the trailing
    /// deadline at `now + window`, replacing any earlier one.
    pub fn signal(&mut self, now: Instant) -> Schedule {
        let quiet = self
            .last_render
            .is_none_or(|last| now.saturating_duration_since(last) >= self.window);

        if quiet && self.pending.is_none() {
            self.last_render = Some(now);
            return Schedule::Immediate;
        }

        let deadline = now + self.window;
        if let Some(previous) = self.pending.replace(deadline) {
            trace!(?previous, ?deadline, "replacing pending render");
        }
        Schedule::Deferred { deadline }
    }

    /// Fire the pending render if its deadline has been reached.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                self.last_render = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Record a render the host ran outside the debounce path, such as the
    /// one on attach. Later signals inside the window are deferred.
    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_render = Some(now);
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn last_render(&self) -> Option<Instant> {
        self.last_render
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop the pending render, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Forget all timing state, cancelling any pending render.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_render = None;
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(RENDER_DEBOUNCE)
    }
}
