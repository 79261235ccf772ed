//! Network and agent availability monitors.
//!
//! Both forward transitions to the runtime as events; the engine ignores
//! repeats of the current value.

use futures_util::StreamExt;
use notice_engine::{Event, EventSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::Connection;

use crate::error::Result;

/// `NM_STATE_CONNECTED_LOCAL`: only local network access.
const NM_STATE_CONNECTED_LOCAL: u32 = 50;
/// `NM_STATE_CONNECTED_SITE`: site-wide access, no global connectivity.
const NM_STATE_CONNECTED_SITE: u32 = 60;
/// `NM_STATE_CONNECTED_GLOBAL`: full connectivity.
const NM_STATE_CONNECTED_GLOBAL: u32 = 70;

#[zbus::dbus_proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
trait NetworkManager {
    #[dbus_proxy(property)]
    fn state(&self) -> zbus::Result<u32>;
}

/// Whether a NetworkManager state counts as "network available".
pub fn is_connected_state(state: u32, include_local: bool) -> bool {
    match state {
        NM_STATE_CONNECTED_SITE | NM_STATE_CONNECTED_GLOBAL => true,
        NM_STATE_CONNECTED_LOCAL => include_local,
        _ => false,
    }
}

/// Watches NetworkManager's global state.
pub struct NetworkMonitor {
    proxy: NetworkManagerProxy<'static>,
    include_local: bool,
}

impl NetworkMonitor {
    pub async fn connect(conn: &Connection, include_local: bool) -> Result<Self> {
        let proxy = NetworkManagerProxy::new(conn).await?;
        Ok(Self {
            proxy,
            include_local,
        })
    }

    /// Current reachability.
    pub async fn connected(&self) -> Result<bool> {
        let state = self.proxy.state().await?;
        debug!(state, "network manager state");
        Ok(is_connected_state(state, self.include_local))
    }

    /// Forwards every state change as [`Event::NetworkChanged`] until the
    /// runtime goes away.
    pub fn spawn(self, events: EventSender) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut changes = self.proxy.receive_state_changed().await;
            while let Some(change) = changes.next().await {
                let state = match change.get().await {
                    Ok(state) => state,
                    Err(e) => {
                        warn!(error = %e, "could not read network manager state");
                        continue;
                    }
                };
                let up = is_connected_state(state, self.include_local);
                debug!(state, up, "network manager state changed");
                if events.send(Event::NetworkChanged(up)).is_err() {
                    break;
                }
            }
        })
    }
}

/// Watches the agent's bus name and reports it appearing or vanishing as
/// [`Event::AvailabilityChanged`].
pub async fn watch_availability(
    conn: &Connection,
    bus_name: &str,
    events: EventSender,
) -> Result<JoinHandle<()>> {
    let dbus = zbus::fdo::DBusProxy::new(conn).await?;
    let mut owner_changes = dbus
        .receive_name_owner_changed_with_args(&[(0, bus_name)])
        .await?;

    Ok(tokio::spawn(async move {
        while let Some(sig) = owner_changes.next().await {
            let present = match sig.args() {
                Ok(args) => args.new_owner().is_some(),
                Err(e) => {
                    warn!(error = %e, "malformed NameOwnerChanged signal");
                    continue;
                }
            };
            info!(present, "agent bus name owner changed");
            if events.send(Event::AvailabilityChanged(present)).is_err() {
                break;
            }
        }
    }))
}
