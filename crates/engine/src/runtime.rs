//! Single-consumer event loop driving the [`Engine`].
//!
//! Agent replies, push signals, timer ticks, and UI callbacks all arrive as
//! [`Event`]s on one unbounded channel and are applied one at a time.
//! Anything that has to wait (a bus call, a 500 ms timer) runs in a spawned
//! task that posts its result back as another event.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use notice_protocol::{NoticeBatch, ParseError, build_request, parse};
use notice_tray::{TrayHandle, TrayStatus};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::detail::DetailRequest;
use crate::dispatch::{DisplayId, Rendered};
use crate::error::{ConnectFailure, RequestError};
use crate::retry::{RequestId, RequestMachine};
use crate::state::{DetailOpen, Engine};

/// A boxed future returned by [`AgentTransport`] methods.
pub type AgentFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Sending half of the runtime's event channel.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Receiving half of the runtime's event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Creates the runtime's event channel ahead of the runtime, for sinks that
/// need to post events back.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Connection to the notice agent.
pub trait AgentTransport: Send + Sync + 'static {
    /// Returns once a live connection exists. Must reuse an existing one.
    fn connect(&self) -> AgentFuture<Result<(), ConnectFailure>>;

    /// Sends one request document and resolves to the raw reply.
    fn request(&self, body: String) -> AgentFuture<Result<String, RequestError>>;

    /// Subscribes to push signals; each item is one raw payload.
    fn subscribe(&self) -> AgentFuture<Result<BoxStream<'static, String>, RequestError>>;
}

/// On-screen notification renderer.
///
/// Closed and activated notifications are reported back through
/// [`Event::NotificationClosed`] and [`Event::NotificationActivated`]. A
/// notification that could not be shown must be reported as closed, or it
/// keeps holding a display slot.
pub trait NoticeDisplay: Send {
    fn show(&mut self, notice: &Rendered);
    fn close(&mut self, id: DisplayId);
    fn shutdown(&mut self) {}
}

/// Tray icon.
pub trait TraySink: Send {
    fn set_status(&mut self, status: TrayStatus);
    fn shutdown(&mut self) {}
}

impl TraySink for TrayHandle {
    fn set_status(&mut self, status: TrayStatus) {
        TrayHandle::set_status(self, status);
    }

    fn shutdown(&mut self) {
        TrayHandle::shutdown(self);
    }
}

/// Detail view window.
pub trait DetailViewer: Send {
    fn open(&mut self, request: DetailRequest);
}

/// Output side of the runtime.
pub struct Sinks {
    pub display: Box<dyn NoticeDisplay>,
    pub tray: Box<dyn TraySink>,
    pub viewer: Box<dyn DetailViewer>,
}

/// Timer periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay before a failed poll is retried.
    pub retry_delay: Duration,
    /// Period of the dispatch loop.
    pub dispatch_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(500),
            dispatch_interval: Duration::from_millis(500),
        }
    }
}

/// Everything the runtime reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Network reachability changed.
    NetworkChanged(bool),
    /// The agent appeared on or vanished from the bus.
    AvailabilityChanged(bool),
    /// Retry timer fired.
    PollDue,
    /// Connection attempt finished.
    Connected(RequestId, Result<(), ConnectFailure>),
    /// Poll request finished.
    PollFinished(RequestId, Result<String, RequestError>),
    /// Push signal payload.
    Push(String),
    /// Dispatch timer fired.
    DispatchTick,
    /// A notification was dismissed or expired.
    NotificationClosed(DisplayId),
    /// The detail action of a notification was invoked.
    NotificationActivated(DisplayId),
    /// Open the detail view on the default notice page.
    OpenDetail,
    Shutdown,
}

/// Owns the engine and applies events to it.
pub struct Runtime {
    engine: Engine,
    machine: RequestMachine,
    transport: Arc<dyn AgentTransport>,
    sinks: Sinks,
    timing: Timing,
    request: String,
    events_tx: EventSender,
    events_rx: EventReceiver,
    published: Option<TrayStatus>,
}

impl Runtime {
    pub fn new(
        engine: Engine,
        transport: Arc<dyn AgentTransport>,
        sinks: Sinks,
        timing: Timing,
        login: &str,
    ) -> Self {
        Self::with_events(engine, transport, sinks, timing, login, event_channel())
    }

    /// Like [`Runtime::new`], on a channel made with [`event_channel`].
    pub fn with_events(
        engine: Engine,
        transport: Arc<dyn AgentTransport>,
        sinks: Sinks,
        timing: Timing,
        login: &str,
        (events_tx, events_rx): (EventSender, EventReceiver),
    ) -> Self {
        Self {
            engine,
            machine: RequestMachine::new(),
            transport,
            sinks,
            timing,
            request: build_request(login),
            events_tx,
            events_rx,
            published: None,
        }
    }

    /// Handle for posting events from other tasks.
    pub fn sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    /// Processes events until [`Event::Shutdown`], then returns the final
    /// engine state.
    pub async fn run(mut self, connectivity: bool) -> Engine {
        info!(connectivity, "notice runtime started");

        self.handle(Event::NetworkChanged(connectivity));
        self.publish_tray();

        while let Some(event) = self.events_rx.recv().await {
            if event == Event::Shutdown {
                break;
            }
            self.handle(event);
            self.publish_tray();
        }

        info!("notice runtime stopping");
        self.sinks.display.shutdown();
        self.sinks.tray.shutdown();
        self.engine
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::NetworkChanged(up) => {
                if !self.engine.set_connectivity(up) {
                    return;
                }
                info!(up, "network connectivity changed");
                if up {
                    self.start_poll();
                } else {
                    self.machine.connectivity_lost();
                }
            }
            Event::AvailabilityChanged(available) => {
                if !self.engine.set_service_available(available) {
                    return;
                }
                info!(available, "agent availability changed");
                if available && self.engine.connectivity() {
                    self.start_poll();
                }
            }
            Event::PollDue => {
                if self.engine.connectivity() {
                    self.start_poll();
                }
            }
            Event::Connected(id, Ok(())) => {
                if self.machine.connected(id) {
                    self.send_request(id);
                }
            }
            Event::Connected(id, Err(failure)) => {
                match &failure {
                    ConnectFailure::Unavailable => {
                        warn!(%failure, "agent service unavailable");
                        self.engine.set_service_available(false);
                    }
                    ConnectFailure::Bus(_) => debug!(%failure, "could not reach agent"),
                }
                if let Some(attempt) = self
                    .machine
                    .connect_failed(id, &failure, self.engine.connectivity())
                {
                    self.schedule_retry(attempt);
                }
            }
            Event::PollFinished(id, Ok(reply)) => self.on_reply(id, &reply),
            Event::PollFinished(id, Err(err)) => {
                debug!(%err, "poll request failed");
                if let Some(attempt) = self.machine.failed(id, self.engine.connectivity()) {
                    self.schedule_retry(attempt);
                }
            }
            Event::Push(payload) => {
                debug!(bytes = payload.len(), "push signal received");
                self.ingest(parse(payload.as_bytes(), true));
            }
            Event::DispatchTick => {
                let outcome = self.engine.tick();
                if let Some(rendered) = outcome.rendered() {
                    self.sinks.display.show(rendered);
                }
                if outcome.keeps_running() {
                    self.schedule(self.timing.dispatch_interval, Event::DispatchTick);
                }
            }
            Event::NotificationClosed(id) => {
                if !self.engine.close(id) {
                    debug!(%id, "close for notification no longer tracked");
                }
            }
            Event::NotificationActivated(id) => {
                if let Some(open) = self.engine.open_detail(Some(id)) {
                    self.open_detail(open);
                }
            }
            Event::OpenDetail => {
                if let Some(open) = self.engine.open_detail(None) {
                    self.open_detail(open);
                }
            }
            Event::Shutdown => {}
        }
    }

    fn on_reply(&mut self, id: RequestId, reply: &str) {
        if !self.machine.succeeded(id) {
            debug!(?id, "reply for an abandoned or finished poll ignored");
            return;
        }

        self.engine.set_service_available(true);
        self.subscribe();
        self.ingest(parse(reply.as_bytes(), false));
    }

    fn ingest(&mut self, decoded: Result<NoticeBatch, ParseError>) {
        match decoded {
            Ok(batch) => {
                self.engine.ingest(batch);
                if self.engine.has_work() && self.engine.start_dispatch() {
                    self.schedule(self.timing.dispatch_interval, Event::DispatchTick);
                }
            }
            Err(err) => debug!(%err, "notice payload discarded"),
        }
    }

    fn open_detail(&mut self, open: DetailOpen) {
        let DetailOpen {
            url,
            session,
            closed,
        } = open;

        for id in closed {
            self.sinks.display.close(id);
        }

        match url {
            Some(url) => {
                let lang = self.engine.messages().locale().lang_code();
                self.sinks
                    .viewer
                    .open(DetailRequest::new(url, &session, lang));
            }
            None => warn!("no notice URL or default domain known, detail view not opened"),
        }
    }

    fn start_poll(&mut self) {
        let Some(id) = self.machine.start() else {
            return;
        };
        debug!(?id, "connecting to agent");
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = transport.connect().await;
            let _ = tx.send(Event::Connected(id, result));
        });
    }

    fn send_request(&self, id: RequestId) {
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        let body = self.request.clone();
        tokio::spawn(async move {
            let result = transport.request(body).await;
            let _ = tx.send(Event::PollFinished(id, result));
        });
    }

    fn subscribe(&self) {
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let mut payloads = match transport.subscribe().await {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(%err, "push subscription failed");
                    return;
                }
            };
            info!("subscribed to agent push signals");
            while let Some(payload) = payloads.next().await {
                if tx.send(Event::Push(payload)).is_err() {
                    break;
                }
            }
        });
    }

    fn schedule_retry(&self, attempt: u32) {
        debug!(attempt, delay = ?self.timing.retry_delay, "retrying agent poll");
        self.schedule(self.timing.retry_delay, Event::PollDue);
    }

    fn schedule(&self, delay: Duration, event: Event) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }

    fn publish_tray(&mut self) {
        let status = self.engine.tray_status();
        if self.published == Some(status) {
            return;
        }
        info!(?status, "tray status changed");
        self.sinks.tray.set_status(status);
        self.published = Some(status);
    }
}
