//! Notification bubbles over `org.freedesktop.Notifications`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use notice_engine::{DisplayId, Event, EventSender, Messages, NoticeDisplay, Rendered};
use notice_protocol::IconKind;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zbus::Connection;
use zbus::zvariant::Value;

const DEFAULT_ACTION: &str = "default";
const CLOSE_ACTION: &str = "close";
const NORMAL_ICON: &str = "notice-indicator-msg";
const URGENT_ICON: &str = "notice-indicator-msg-urgency";
/// Freedesktop urgency level "normal".
const URGENCY_NORMAL: u8 = 1;

#[zbus::dbus_proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    #[dbus_proxy(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;

    #[dbus_proxy(signal)]
    fn action_invoked(&self, id: u32, action_key: &str) -> zbus::Result<()>;
}

/// Two-way map between engine ids and notification server ids, plus the
/// bubbles whose `Notify` call has not returned yet.
#[derive(Debug, Default)]
struct IdMap {
    by_display: HashMap<DisplayId, u32>,
    by_server: HashMap<u32, DisplayId>,
    in_flight: HashSet<DisplayId>,
    closed_in_flight: HashSet<DisplayId>,
}

impl IdMap {
    fn begin(&mut self, display: DisplayId) {
        self.in_flight.insert(display);
    }

    /// Records the server id once `Notify` returns. Returns `false` when the
    /// bubble was closed in the meantime and must be taken down.
    fn shown(&mut self, display: DisplayId, server: u32) -> bool {
        self.in_flight.remove(&display);
        if self.closed_in_flight.remove(&display) {
            return false;
        }
        self.insert(display, server);
        true
    }

    fn failed(&mut self, display: DisplayId) {
        self.in_flight.remove(&display);
        self.closed_in_flight.remove(&display);
    }

    /// Server id to close now, if the bubble is already up. A bubble still
    /// being shown is closed when its `Notify` call returns.
    fn close(&mut self, display: DisplayId) -> Option<u32> {
        if self.in_flight.contains(&display) {
            self.closed_in_flight.insert(display);
            return None;
        }
        self.remove_display(display)
    }

    fn insert(&mut self, display: DisplayId, server: u32) {
        self.by_display.insert(display, server);
        self.by_server.insert(server, display);
    }

    fn remove_display(&mut self, display: DisplayId) -> Option<u32> {
        let server = self.by_display.remove(&display)?;
        self.by_server.remove(&server);
        Some(server)
    }

    fn remove_server(&mut self, server: u32) -> Option<DisplayId> {
        let display = self.by_server.remove(&server)?;
        self.by_display.remove(&display);
        Some(display)
    }

    fn display_for(&self, server: u32) -> Option<DisplayId> {
        self.by_server.get(&server).copied()
    }
}

/// Settles a finished `Notify` call. A failed call is reported to the
/// runtime as a closed notification so its display slot is released.
/// Returns the server id of a bubble that was closed while being shown.
fn settle(
    ids: &Mutex<IdMap>,
    events: &EventSender,
    display_id: DisplayId,
    shown: zbus::Result<u32>,
) -> Option<u32> {
    let Ok(mut ids) = ids.lock() else {
        return None;
    };
    match shown {
        Ok(server_id) => {
            if ids.shown(display_id, server_id) {
                debug!(id = %display_id, server_id, "notification shown");
                None
            } else {
                debug!(id = %display_id, server_id, "notification closed while being shown");
                Some(server_id)
            }
        }
        Err(e) => {
            warn!(id = %display_id, error = %e, "could not show notification");
            ids.failed(display_id);
            let _ = events.send(Event::NotificationClosed(display_id));
            None
        }
    }
}

fn icon_for(kind: IconKind) -> &'static str {
    match kind {
        IconKind::Normal => NORMAL_ICON,
        IconKind::Urgent => URGENT_ICON,
    }
}

/// Shows engine notifications through the desktop notification server.
pub struct NotificationSink {
    proxy: NotificationsProxy<'static>,
    ids: Arc<Mutex<IdMap>>,
    events: EventSender,
    timeout_ms: i32,
    detail_label: &'static str,
    close_label: &'static str,
}

/// Listener half of [`NotificationSink`]: reports closed and activated
/// notifications back to the runtime.
pub struct NotificationEvents {
    proxy: NotificationsProxy<'static>,
    ids: Arc<Mutex<IdMap>>,
}

impl NotificationSink {
    pub async fn connect(
        conn: &Connection,
        timeout_ms: i32,
        messages: &Messages,
        events: EventSender,
    ) -> zbus::Result<(Self, NotificationEvents)> {
        let proxy = NotificationsProxy::new(conn).await?;
        let ids = Arc::new(Mutex::new(IdMap::default()));

        let sink = Self {
            proxy: proxy.clone(),
            ids: Arc::clone(&ids),
            events,
            timeout_ms,
            detail_label: messages.detail_view(),
            close_label: messages.close(),
        };
        Ok((sink, NotificationEvents { proxy, ids }))
    }
}

impl NoticeDisplay for NotificationSink {
    fn show(&mut self, notice: &Rendered) {
        if let Ok(mut ids) = self.ids.lock() {
            ids.begin(notice.id);
        }

        let proxy = self.proxy.clone();
        let ids = Arc::clone(&self.ids);
        let events = self.events.clone();
        let timeout_ms = self.timeout_ms;
        let detail_label = self.detail_label;
        let close_label = self.close_label;
        let notice = notice.clone();

        tokio::spawn(async move {
            let actions = [DEFAULT_ACTION, detail_label, CLOSE_ACTION, close_label];
            let hints = HashMap::from([("urgency", Value::from(URGENCY_NORMAL))]);
            let shown = proxy
                .notify(
                    env!("CARGO_PKG_NAME"),
                    0,
                    icon_for(notice.icon_kind),
                    &notice.title,
                    "",
                    &actions,
                    hints,
                    timeout_ms,
                )
                .await;

            if let Some(server_id) = settle(&ids, &events, notice.id, shown)
                && let Err(e) = proxy.close_notification(server_id).await
            {
                debug!(server_id, error = %e, "close notification failed");
            }
        });
    }

    fn close(&mut self, id: DisplayId) {
        let server_id = match self.ids.lock() {
            Ok(mut ids) => ids.close(id),
            Err(_) => None,
        };
        let Some(server_id) = server_id else {
            return;
        };

        let proxy = self.proxy.clone();
        tokio::spawn(async move {
            if let Err(e) = proxy.close_notification(server_id).await {
                debug!(server_id, error = %e, "close notification failed");
            }
        });
    }
}

impl NotificationEvents {
    /// Subscribes to the server's signals and forwards them until cancelled.
    pub async fn spawn(
        self,
        events: EventSender,
        cancel: CancellationToken,
    ) -> zbus::Result<JoinHandle<()>> {
        let mut closed = self.proxy.receive_notification_closed().await?;
        let mut invoked = self.proxy.receive_action_invoked().await?;
        let ids = self.ids;

        Ok(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    Some(sig) = closed.next() => {
                        let Ok(args) = sig.args() else { continue };
                        match ids.lock() {
                            Ok(mut ids) => {
                                ids.remove_server(args.id).map(Event::NotificationClosed)
                            }
                            Err(_) => None,
                        }
                    }
                    Some(sig) = invoked.next() => {
                        let Ok(args) = sig.args() else { continue };
                        if args.action_key != DEFAULT_ACTION {
                            continue;
                        }
                        match ids.lock() {
                            Ok(ids) => ids.display_for(args.id).map(Event::NotificationActivated),
                            Err(_) => None,
                        }
                    }
                    else => break,
                };

                if let Some(event) = event
                    && events.send(event).is_err()
                {
                    break;
                }
            }
        }))
    }
}
