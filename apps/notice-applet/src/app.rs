//! Application orchestrator: wires the engine runtime to the buses and the tray.

use std::sync::Arc;

use anyhow::Context;
use notice_agent_client::{AgentClient, NetworkMonitor, current_login, watch_availability};
use notice_engine::{Engine, Event, EventSender, Locale, Messages, Runtime, Sinks, event_channel};
use notice_tray::{MenuState, TrayConfig, TrayEvent, TrayHandle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::notifications::NotificationSink;
use crate::tray_backend;
use crate::viewer::BrowserViewer;

/// Runs the applet until shutdown is requested.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let messages = Messages::new(Locale::from_env());
    let login = current_login();
    info!(%login, locale = ?messages.locale(), "session identity resolved");

    // -- Tray --
    let tray_config = TrayConfig {
        menu: MenuState {
            title: messages.notice().into(),
            notice_label: messages.notice().into(),
            quit_label: messages.quit().into(),
        },
        ..TrayConfig::default()
    };
    let (mut tray_handle, tray_event_tx, tray_update_rx) = TrayHandle::new(&tray_config);
    let tray_events = tray_handle
        .take_events()
        .context("tray event receiver already taken")?;
    tray_backend::spawn(&tray_config, tray_event_tx, tray_update_rx)
        .context("starting tray update thread")?;

    let (events, events_rx) = event_channel();

    // -- Notifications --
    let session = zbus::Connection::session()
        .await
        .context("connecting to the session bus")?;
    let (display, notification_events) =
        NotificationSink::connect(
            &session,
            config.notification_timeout_ms,
            &messages,
            events.clone(),
        )
        .await
        .context("connecting to the notification server")?;

    // -- Engine runtime --
    let agent = AgentClient::new(config.agent_settings());
    let runtime = Runtime::with_events(
        Engine::new(config.engine_config(), messages),
        Arc::new(agent),
        Sinks {
            display: Box::new(display),
            tray: Box::new(tray_handle),
            viewer: Box::new(BrowserViewer),
        },
        config.timing(),
        &login,
        (events.clone(), events_rx),
    );

    notification_events
        .spawn(events.clone(), cancel.clone())
        .await
        .context("subscribing to notification signals")?;

    // -- System bus monitors --
    let connectivity = match zbus::Connection::system().await {
        Ok(system) => {
            if let Err(e) =
                watch_availability(&system, &config.agent_bus_name, events.clone()).await
            {
                warn!(error = %e, "agent availability watch not started");
            }
            network_state(&system, config.treat_local_network_as_connected, &events).await
        }
        Err(e) => {
            warn!(error = %e, "system bus unreachable, assuming network is up");
            true
        }
    };

    tokio::spawn(forward_tray_events(tray_events, events.clone(), cancel.clone()));
    tokio::spawn(forward_shutdown_signals(events, cancel.clone()));

    info!("applet ready");
    let engine = runtime.run(connectivity).await;

    cancel.cancel();
    info!(
        pending = engine.pending().len(),
        displayed = engine.displayed_count(),
        "runtime finished"
    );
    Ok(())
}

/// Reads the current network state and starts forwarding changes. Falls
/// back to "connected" when NetworkManager cannot be asked.
async fn network_state(
    system: &zbus::Connection,
    include_local: bool,
    events: &EventSender,
) -> bool {
    let monitor = match NetworkMonitor::connect(system, include_local).await {
        Ok(monitor) => monitor,
        Err(e) => {
            warn!(error = %e, "NetworkManager unavailable, assuming network is up");
            return true;
        }
    };

    let up = monitor.connected().await.unwrap_or_else(|e| {
        warn!(error = %e, "could not read network state, assuming network is up");
        true
    });
    monitor.spawn(events.clone());
    up
}

fn tray_event(event: TrayEvent) -> Event {
    match event {
        TrayEvent::OpenNotices => Event::OpenDetail,
        TrayEvent::QuitRequested => Event::Shutdown,
    }
}

async fn forward_tray_events(
    mut tray_events: UnboundedReceiver<TrayEvent>,
    events: EventSender,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            received = tray_events.recv() => match received {
                Some(event) => event,
                None => break,
            },
        };

        if event == TrayEvent::QuitRequested {
            info!("quit requested via tray");
        }
        if events.send(tray_event(event)).is_err() {
            break;
        }
    }
}

async fn forward_shutdown_signals(events: EventSender, cancel: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler not installed");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
    let _ = events.send(Event::Shutdown);
}
