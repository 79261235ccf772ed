//! System bus plumbing for the notice applet.
//!
//! [`AgentClient`] talks to the notice agent and implements the engine's
//! [`AgentTransport`](notice_engine::AgentTransport). The monitors turn
//! NetworkManager state and agent name-owner changes into engine events.

mod agent;
mod error;
mod login;
mod monitor;
mod slot;
mod systemd;

pub use agent::{AgentClient, AgentSettings};
pub use error::{Error, Result};
pub use login::current_login;
pub use monitor::{NetworkMonitor, is_connected_state, watch_availability};
pub use slot::ConnectionSlot;
pub use systemd::unit_available;
