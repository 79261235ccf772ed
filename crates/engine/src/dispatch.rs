//! One dispatch tick: promote at most one notice onto the screen.

use std::fmt;

use notice_protocol::{IconKind, Notice};

use crate::state::Engine;

/// Identifier the engine assigns to each displayed notification.
///
/// Unrelated to whatever id the notification server hands out; the display
/// sink keeps that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayId(u64);

impl DisplayId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A notification ready for the display sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub id: DisplayId,
    /// Formatted, possibly truncated, title.
    pub title: String,
    pub icon_kind: IconKind,
}

/// Result of one [`Engine::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A queued notice was put on screen; the loop keeps running.
    Promoted(Rendered),
    /// The synthetic overflow item was put on screen; the loop stopped.
    Overflow(Rendered),
    /// All display slots are taken while notices wait; the loop keeps running.
    Backpressure,
    /// Nothing left to do; the loop stopped.
    Stopped,
}

impl TickOutcome {
    /// Whether the dispatch loop should be re-armed.
    pub fn keeps_running(&self) -> bool {
        matches!(self, TickOutcome::Promoted(_) | TickOutcome::Backpressure)
    }

    /// The notification to show, if the tick produced one.
    pub fn rendered(&self) -> Option<&Rendered> {
        match self {
            TickOutcome::Promoted(r) | TickOutcome::Overflow(r) => Some(r),
            TickOutcome::Backpressure | TickOutcome::Stopped => None,
        }
    }
}

impl Engine {
    /// Runs one dispatch step.
    ///
    /// Promotes at most one notice per call. `dispatch_running` is left set
    /// for [`TickOutcome::Promoted`] and [`TickOutcome::Backpressure`] and
    /// cleared otherwise.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.step();
        self.dispatch_running = outcome.keeps_running();

        tracing::trace!(
            ?outcome,
            displayed = self.displayed.len(),
            pending = self.queue.len(),
            "dispatch tick"
        );
        outcome
    }

    fn step(&mut self) -> TickOutcome {
        if self.displayed.len() >= self.config.display_limit {
            return if self.queue.is_empty() {
                TickOutcome::Stopped
            } else {
                TickOutcome::Backpressure
            };
        }

        if let Some((notice, others)) = self.queue.pop() {
            let title = self
                .messages
                .notice_title(&notice.title, others, self.config.title_limit);
            return TickOutcome::Promoted(self.register(notice, title));
        }

        if let Some(count) = self.queue.take_overflow() {
            let notice = Notice {
                url: self.session.default_domain.clone().unwrap_or_default(),
                title: self.messages.overflow_title(count),
                icon_kind: IconKind::Normal,
            };
            let title = notice.title.clone();
            return TickOutcome::Overflow(self.register(notice, title));
        }

        TickOutcome::Stopped
    }

    fn register(&mut self, notice: Notice, title: String) -> Rendered {
        self.next_id += 1;
        let id = DisplayId(self.next_id);
        let rendered = Rendered {
            id,
            title,
            icon_kind: notice.icon_kind,
        };
        self.displayed.insert(id, notice);
        rendered
    }
}
