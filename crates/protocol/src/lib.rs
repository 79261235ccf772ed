//! Wire protocol for the notice agent service.
//!
//! The agent is a privileged daemon on the system bus. It answers a
//! `do_task` call with a JSON document and emits `set_noti` signals carrying
//! unsolicited notice batches. This crate owns the request builder, the
//! decoded types, and the tolerant parser shared by both channels.

pub mod constants;
pub mod notice;
pub mod parse;
pub mod request;

pub use notice::{IconKind, Notice, NoticeBatch, SessionInfo};
pub use parse::{ParseError, parse};
pub use request::build_request;
