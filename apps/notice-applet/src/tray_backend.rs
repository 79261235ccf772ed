//! StatusNotifierItem tray backed by `ksni`.
//!
//! ksni runs its own D-Bus thread. A second thread drains the
//! [`TrayUpdate`] channel and applies each update to the service handle.

use std::sync::mpsc;
use std::thread;

use ksni::menu::StandardItem;
use notice_tray::{MenuAction, MenuItem, TrayConfig, TrayEvent, TrayStatus, TrayUpdate};
use tokio::sync::mpsc::UnboundedSender;

struct NoticeTray {
    config: TrayConfig,
    status: TrayStatus,
    events: UnboundedSender<TrayEvent>,
}

impl NoticeTray {
    fn trigger(&self, action: &MenuAction) {
        let event = match action {
            MenuAction::OpenNotices => TrayEvent::OpenNotices,
            MenuAction::Quit => TrayEvent::QuitRequested,
        };
        if self.events.send(event).is_err() {
            tracing::debug!(?action, "applet core gone, tray action dropped");
        }
    }
}

impl ksni::Tray for NoticeTray {
    fn id(&self) -> String {
        env!("CARGO_PKG_NAME").into()
    }

    fn title(&self) -> String {
        self.config.menu.title.clone()
    }

    fn icon_name(&self) -> String {
        // Attention swaps the regular icon as well.
        match self.status {
            TrayStatus::Attention => self.config.attention_icon_name.clone(),
            TrayStatus::Passive | TrayStatus::Active => self.config.icon_name.clone(),
        }
    }

    fn attention_icon_name(&self) -> String {
        self.config.attention_icon_name.clone()
    }

    fn status(&self) -> ksni::Status {
        match self.status {
            TrayStatus::Passive => ksni::Status::Passive,
            TrayStatus::Active => ksni::Status::Active,
            TrayStatus::Attention => ksni::Status::NeedsAttention,
        }
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        self.config
            .menu
            .build_menu()
            .into_iter()
            .map(menu_item)
            .collect()
    }
}

fn menu_item(item: MenuItem) -> ksni::MenuItem<NoticeTray> {
    if item.is_separator() {
        return ksni::MenuItem::Separator;
    }

    let action = item.action;
    StandardItem {
        label: item.label,
        enabled: item.enabled,
        activate: Box::new(move |tray: &mut NoticeTray| {
            if let Some(action) = &action {
                tray.trigger(action);
            }
        }),
        ..Default::default()
    }
    .into()
}

/// Starts the tray service and the thread applying updates to it.
pub fn spawn(
    config: &TrayConfig,
    events: UnboundedSender<TrayEvent>,
    updates: mpsc::Receiver<TrayUpdate>,
) -> std::io::Result<thread::JoinHandle<()>> {
    let service = ksni::TrayService::new(NoticeTray {
        config: config.clone(),
        status: TrayStatus::default(),
        events,
    });
    let handle = service.handle();
    service.spawn();

    thread::Builder::new()
        .name("tray-updates".into())
        .spawn(move || {
            for update in updates {
                match update {
                    TrayUpdate::Status(status) => {
                        handle.update(|tray: &mut NoticeTray| tray.status = status);
                    }
                    TrayUpdate::Shutdown => break,
                }
            }
            handle.shutdown();
            tracing::debug!("tray stopped");
        })
}
