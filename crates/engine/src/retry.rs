//! Poll request lifecycle.
//!
//! ```text
//! Idle ──start──▶ Connecting ──connected──▶ Waiting ──succeeded──▶ Bound
//!  ▲                  │                        │
//!  │           connect_failed                failed
//!  │                  ▼                        ▼
//!  └──(no network)── RetryScheduled{attempt} ◀─┘
//!                     │
//!                     └──start──▶ Connecting
//! ```
//!
//! Retries are unbounded: a transport failure always schedules another
//! attempt while the network is up. `Bound` ends polling; from then on
//! notices arrive as push signals.
//!
//! Each attempt gets a fresh [`RequestId`]. Results are matched against the
//! current id, so an attempt abandoned on a network drop cannot move the
//! machine once a newer one is under way.

use crate::error::ConnectFailure;

/// Where the poll request currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// Nothing in flight; waiting for the network or the service to appear.
    #[default]
    Idle,
    /// Acquiring the agent connection.
    Connecting,
    /// Request sent, reply pending.
    Waiting,
    /// A reply arrived and the push subscription is bound.
    Bound,
    /// A retry timer is armed.
    RetryScheduled { attempt: u32 },
}

/// Identifies one connect-and-request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RequestId(u64);

/// Drives [`RequestState`] transitions and remembers whether the push
/// subscription has been bound.
///
/// Every transition method only acts from the state it expects and for the
/// current [`RequestId`], so late timer or reply events are harmless.
#[derive(Debug, Default)]
pub struct RequestMachine {
    state: RequestState,
    current: RequestId,
    attempts: u32,
    subscribed: bool,
}

impl RequestMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Whether the push subscription has been bound.
    pub fn subscribed(&self) -> bool {
        self.subscribed
    }

    /// Begins a connection attempt and returns its id. Returns `None` when a
    /// request is already in flight or polling is over.
    pub fn start(&mut self) -> Option<RequestId> {
        match self.state {
            RequestState::Idle | RequestState::RetryScheduled { .. } => {
                self.state = RequestState::Connecting;
                self.current = RequestId(self.current.0.wrapping_add(1));
                Some(self.current)
            }
            RequestState::Connecting | RequestState::Waiting | RequestState::Bound => None,
        }
    }

    fn is_current(&self, id: RequestId, state: RequestState) -> bool {
        self.current == id && self.state == state
    }

    /// The connection is live; the request goes out next.
    pub fn connected(&mut self, id: RequestId) -> bool {
        if !self.is_current(id, RequestState::Connecting) {
            return false;
        }
        self.state = RequestState::Waiting;
        true
    }

    /// Connection attempt failed.
    ///
    /// An unavailable service parks the machine in `Idle` until the service
    /// shows up again. A bus error is retried like a transport failure.
    pub fn connect_failed(
        &mut self,
        id: RequestId,
        failure: &ConnectFailure,
        connectivity: bool,
    ) -> Option<u32> {
        if !self.is_current(id, RequestState::Connecting) {
            return None;
        }
        match failure {
            ConnectFailure::Unavailable => {
                self.state = RequestState::Idle;
                None
            }
            ConnectFailure::Bus(_) => self.schedule_retry(connectivity),
        }
    }

    /// A reply was received. Returns `true` exactly once per machine: on the
    /// first success, when the push subscription must be bound.
    pub fn succeeded(&mut self, id: RequestId) -> bool {
        if !self.is_current(id, RequestState::Waiting) {
            return false;
        }
        self.state = RequestState::Bound;
        self.attempts = 0;
        !std::mem::replace(&mut self.subscribed, true)
    }

    /// The request failed. Returns the retry attempt number when a retry
    /// must be scheduled.
    pub fn failed(&mut self, id: RequestId, connectivity: bool) -> Option<u32> {
        if !self.is_current(id, RequestState::Waiting) {
            return None;
        }
        self.schedule_retry(connectivity)
    }

    /// Network went away: drop whatever was pending unless polling is over.
    pub fn connectivity_lost(&mut self) {
        if self.state != RequestState::Bound {
            self.state = RequestState::Idle;
        }
    }

    fn schedule_retry(&mut self, connectivity: bool) -> Option<u32> {
        if !connectivity {
            self.state = RequestState::Idle;
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        self.state = RequestState::RetryScheduled {
            attempt: self.attempts,
        };
        Some(self.attempts)
    }
}
