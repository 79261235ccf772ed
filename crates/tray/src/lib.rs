//! System tray interface for the notice applet.
//!
//! Defines the three tray states and a channel-based handle the applet core
//! uses to drive whichever tray backend the binary wires in:
//! - [`TrayEvent`]: events from tray to core (open notices, quit)
//! - [`TrayUpdate`]: updates from core to tray (status change, shutdown)
//!
//! # Platform notes
//! - Linux: the applet binary renders a StatusNotifierItem
//! - The tray backend runs on its own thread and never touches engine state

mod menu;
mod tray;

pub use menu::{MenuAction, MenuItem, MenuState};
pub use tray::{
    ATTENTION_TRAY_ICON, DEFAULT_TRAY_ICON, TrayConfig, TrayEvent, TrayHandle, TrayStatus, TrayUpdate,
};
