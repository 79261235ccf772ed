//! Tray status derivation.

use notice_tray::TrayStatus;

/// Derives the tray status from the three flags that drive it.
pub fn derive_status(connectivity: bool, service_available: bool, pending: bool) -> TrayStatus {
    match (connectivity && service_available, pending) {
        (false, _) => TrayStatus::Passive,
        (true, true) => TrayStatus::Attention,
        (true, false) => TrayStatus::Active,
    }
}
