//! Notice acquisition and dispatch engine.
//!
//! Holds the single [`Engine`] state (pending queue, overflow count,
//! displayed notifications, connectivity flags), the one-notice-per-tick
//! dispatch step, tray status derivation, and the [`Runtime`] that feeds
//! agent replies, push signals, timers, and UI callbacks into the engine one
//! event at a time.

mod detail;
mod dispatch;
mod error;
mod queue;
mod retry;
mod runtime;
mod state;
mod status;
pub mod text;

pub use detail::{Cookie, DetailRequest};
pub use dispatch::{DisplayId, Rendered, TickOutcome};
pub use error::{ConnectFailure, RequestError};
pub use queue::NoticeQueue;
pub use retry::{RequestId, RequestMachine, RequestState};
pub use runtime::{
    AgentFuture, AgentTransport, DetailViewer, Event, EventReceiver, EventSender, NoticeDisplay,
    Runtime, Sinks, Timing, TraySink, event_channel,
};
pub use state::{DetailOpen, Engine, EngineConfig};
pub use status::derive_status;
pub use text::{Locale, Messages};

/// Maximum number of notifications on screen at once.
pub const DISPLAY_LIMIT: usize = 5;

/// Character budget of a displayed notice title.
pub const TITLE_LIMIT: usize = 17;
