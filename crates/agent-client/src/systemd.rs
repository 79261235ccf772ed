//! Agent availability probe against the systemd manager.

use zbus::Connection;

#[zbus::dbus_proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1"
)]
trait SystemdManager {
    fn get_unit_file_state(&self, file: &str) -> zbus::Result<String>;
}

/// Whether systemd knows the unit file. Any failure, including an
/// unreachable manager, counts as unavailable.
pub async fn unit_available(conn: &Connection, unit: &str) -> bool {
    let manager = match SystemdManagerProxy::new(conn).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::debug!(error = %e, "systemd manager unreachable");
            return false;
        }
    };

    match manager.get_unit_file_state(unit).await {
        Ok(state) => {
            tracing::debug!(unit, %state, "agent unit found");
            true
        }
        Err(e) => {
            tracing::debug!(unit, error = %e, "agent unit not found");
            false
        }
    }
}
