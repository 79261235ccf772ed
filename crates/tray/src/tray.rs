//! Tray handle, status, events, and update types.
//!
//! The actual tray widget lives in the applet binary. This module defines
//! the channel-based interface the applet core uses to talk to it,
//! independent of the backend.

use std::sync::mpsc;

use tokio::sync::mpsc as async_mpsc;

use crate::menu::MenuState;

/// Tray icon used while disconnected or connected without new notices.
pub const DEFAULT_TRAY_ICON: &str = "notice-indicator-panel";

/// Tray icon used while new notices are waiting to be read.
pub const ATTENTION_TRAY_ICON: &str = "notice-indicator-event-panel";

/// What the tray icon shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrayStatus {
    /// No network, or the agent service is unavailable.
    #[default]
    Passive,
    /// Connected, nothing new.
    Active,
    /// Connected with unread notices.
    Attention,
}

/// Configuration for the system tray.
#[derive(Debug, Clone)]
pub struct TrayConfig {
    /// Menu labels.
    pub menu: MenuState,
    /// Icon theme name for the passive and active states.
    pub icon_name: String,
    /// Icon theme name for the attention state.
    pub attention_icon_name: String,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            menu: MenuState::default(),
            icon_name: DEFAULT_TRAY_ICON.into(),
            attention_icon_name: ATTENTION_TRAY_ICON.into(),
        }
    }
}

/// Events emitted by the tray to the applet core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayEvent {
    /// User picked the notice item in the context menu.
    OpenNotices,
    /// User clicked "Quit" in the context menu.
    QuitRequested,
}

/// Updates sent from the applet core to the tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayUpdate {
    /// The derived tray status changed.
    Status(TrayStatus),
    /// Request tray shutdown.
    Shutdown,
}

/// Handle for communicating with the system tray from the applet core.
///
/// The tray backend runs on its own thread; updates travel over a std
/// channel it can block on, events come back over an async channel the
/// core awaits.
pub struct TrayHandle {
    /// Send updates to the tray.
    update_tx: mpsc::Sender<TrayUpdate>,
    /// Receive events from the tray. Taken once by the core.
    event_rx: Option<async_mpsc::UnboundedReceiver<TrayEvent>>,
    /// Last status sent to the tray.
    status: TrayStatus,
}

impl TrayHandle {
    /// Creates a new tray handle with its channel pair.
    ///
    /// Returns `(handle, event_sender, update_receiver)`; the sender/receiver
    /// pair is given to the tray backend.
    pub fn new(
        config: &TrayConfig,
    ) -> (
        Self,
        async_mpsc::UnboundedSender<TrayEvent>,
        mpsc::Receiver<TrayUpdate>,
    ) {
        let (update_tx, update_rx) = mpsc::channel();
        let (event_tx, event_rx) = async_mpsc::unbounded_channel();

        tracing::debug!(icon = %config.icon_name, "tray handle created");

        let handle = Self {
            update_tx,
            event_rx: Some(event_rx),
            status: TrayStatus::default(),
        };

        (handle, event_tx, update_rx)
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<async_mpsc::UnboundedReceiver<TrayEvent>> {
        self.event_rx.take()
    }

    /// Sends a new status to the tray.
    pub fn set_status(&mut self, status: TrayStatus) {
        self.status = status;
        if self.update_tx.send(TrayUpdate::Status(status)).is_err() {
            tracing::debug!(?status, "tray backend gone, status update dropped");
        }
    }

    /// Requests the tray to shut down.
    pub fn shutdown(&self) {
        let _ = self.update_tx.send(TrayUpdate::Shutdown);
    }

    /// Returns the last status sent to the tray.
    pub fn status(&self) -> TrayStatus {
        self.status
    }
}
