//! Runtime flows against a scripted agent and recording sinks.
//!
//! Tests run on a paused clock, so the 500 ms timers advance instantly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use notice_engine::{
    AgentFuture, AgentTransport, ConnectFailure, DetailRequest, DetailViewer, DisplayId, Engine,
    Event, EventSender, NoticeDisplay, Rendered, RequestError, Runtime, Sinks, Timing, TraySink,
    event_channel,
};
use notice_protocol::IconKind;
use notice_tray::TrayStatus;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Default)]
struct ScriptedAgent {
    connect_results: Mutex<VecDeque<Result<(), ConnectFailure>>>,
    replies: Mutex<VecDeque<Result<String, RequestError>>>,
    requests: Mutex<Vec<String>>,
    reply_delays: Mutex<VecDeque<u64>>,
    connects: AtomicUsize,
    subscribes: AtomicUsize,
    push_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl ScriptedAgent {
    fn requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl AgentTransport for ScriptedAgent {
    fn connect(&self) -> AgentFuture<Result<(), ConnectFailure>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let result = self
            .connect_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        Box::pin(async move { result })
    }

    fn request(&self, body: String) -> AgentFuture<Result<String, RequestError>> {
        self.requests.lock().unwrap().push(body);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RequestError::Transport("no reply".into())));
        let delay = self.reply_delays.lock().unwrap().pop_front().unwrap_or(0);
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            reply
        })
    }

    fn subscribe(&self) -> AgentFuture<Result<BoxStream<'static, String>, RequestError>> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let rx = self.push_rx.lock().unwrap().take();
        Box::pin(async move {
            let rx = rx.ok_or_else(|| RequestError::Transport("already subscribed".into()))?;
            let payloads = stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|payload| (payload, rx))
            });
            Ok(payloads.boxed())
        })
    }
}

#[derive(Default)]
struct Recorded {
    shown: Vec<Rendered>,
    closed: Vec<DisplayId>,
    statuses: Vec<TrayStatus>,
    opened: Vec<DetailRequest>,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Recorded>>);

impl NoticeDisplay for Recorder {
    fn show(&mut self, notice: &Rendered) {
        self.0.lock().unwrap().shown.push(notice.clone());
    }

    fn close(&mut self, id: DisplayId) {
        self.0.lock().unwrap().closed.push(id);
    }
}

/// A display whose notification server rejects every bubble and reports it
/// closed, the way the desktop sink does when `Notify` fails.
struct RejectingDisplay {
    events: EventSender,
    recorder: Recorder,
}

impl NoticeDisplay for RejectingDisplay {
    fn show(&mut self, notice: &Rendered) {
        self.recorder.0.lock().unwrap().shown.push(notice.clone());
        let _ = self.events.send(Event::NotificationClosed(notice.id));
    }

    fn close(&mut self, id: DisplayId) {
        self.recorder.0.lock().unwrap().closed.push(id);
    }
}

impl TraySink for Recorder {
    fn set_status(&mut self, status: TrayStatus) {
        self.0.lock().unwrap().statuses.push(status);
    }
}

impl DetailViewer for Recorder {
    fn open(&mut self, request: DetailRequest) {
        self.0.lock().unwrap().opened.push(request);
    }
}

/// Counts `WARN` events.
#[derive(Clone, Default)]
struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct Harness {
    agent: Arc<ScriptedAgent>,
    recorder: Recorder,
    events: EventSender,
    push_tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<Engine>,
}

impl Harness {
    fn start(agent: ScriptedAgent, connectivity: bool) -> Self {
        Self::start_with_display(agent, connectivity, |_, recorder| Box::new(recorder))
    }

    fn start_with_display(
        agent: ScriptedAgent,
        connectivity: bool,
        display: impl FnOnce(EventSender, Recorder) -> Box<dyn NoticeDisplay>,
    ) -> Self {
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        *agent.push_rx.lock().unwrap() = Some(push_rx);
        let agent = Arc::new(agent);
        let recorder = Recorder::default();
        let (events, events_rx) = event_channel();

        let runtime = Runtime::with_events(
            Engine::default(),
            agent.clone(),
            Sinks {
                display: display(events.clone(), recorder.clone()),
                tray: Box::new(recorder.clone()),
                viewer: Box::new(recorder.clone()),
            },
            Timing::default(),
            "alice",
            (events.clone(), events_rx),
        );
        let task = tokio::spawn(runtime.run(connectivity));

        Self {
            agent,
            recorder,
            events,
            push_tx,
            task,
        }
    }

    fn send(&self, event: Event) {
        self.events.send(event).unwrap();
    }

    fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorder.0.lock().unwrap()
    }

    async fn stop(self) -> (Engine, Recorder) {
        self.send(Event::Shutdown);
        let engine = self.task.await.unwrap();
        (engine, self.recorder)
    }
}

fn reply(notis: &[(&str, &str)], disabled: u32) -> String {
    let notis: Vec<serde_json::Value> = notis
        .iter()
        .map(|(title, url)| serde_json::json!({ "title": title, "url": url }))
        .collect();
    serde_json::json!({
        "module": { "task": { "out": {
            "status": "200",
            "noti_info": {
                "enabled_title_view_notis": notis,
                "disabled_title_view_cnt": disabled,
                "signing": "sig",
                "client_id": "cid",
                "session_id": "sid",
                "default_noti_domain": "https://notice.example"
            }
        }}}
    })
    .to_string()
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn poll_reply_is_dispatched_one_per_tick() {
    let agent = ScriptedAgent::default();
    agent.replies.lock().unwrap().push_back(Ok(reply(
        &[("one", "u1"), ("two", "u2"), ("three", "u3")],
        2,
    )));
    let h = Harness::start(agent, true);

    wait(10).await;
    assert!(h.recorded().shown.is_empty());

    for expected in 1..=3 {
        wait(500).await;
        assert_eq!(h.recorded().shown.len(), expected);
    }

    wait(500).await;
    let titles: Vec<String> = h.recorded().shown.iter().map(|r| r.title.clone()).collect();
    assert_eq!(titles, vec!["one", "two", "three", "Notice other 2 cases"]);

    wait(2000).await;
    assert_eq!(h.recorded().shown.len(), 4);

    let request = h.agent.requests.lock().unwrap()[0].clone();
    assert!(request.contains("\"login_id\":\"alice\""));

    let (engine, recorder) = h.stop().await;
    assert_eq!(engine.displayed_count(), 4);
    assert!(!engine.dispatch_running());
    assert_eq!(
        recorder.0.lock().unwrap().statuses,
        vec![TrayStatus::Passive, TrayStatus::Attention]
    );
}

#[tokio::test(start_paused = true)]
async fn transport_failures_are_retried_until_success() {
    let agent = ScriptedAgent::default();
    {
        let mut replies = agent.replies.lock().unwrap();
        replies.push_back(Err(RequestError::Transport("timeout".into())));
        replies.push_back(Err(RequestError::Transport("timeout".into())));
        replies.push_back(Ok(reply(&[("late", "u")], 0)));
    }
    let h = Harness::start(agent, true);

    wait(1200).await;
    assert_eq!(h.agent.requests(), 3);
    assert_eq!(h.agent.subscribes.load(Ordering::SeqCst), 1);

    wait(5000).await;
    assert_eq!(h.agent.requests(), 3);
    assert_eq!(h.recorded().shown.len(), 1);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn non_success_reply_ingests_nothing() {
    let agent = ScriptedAgent::default();
    agent.replies.lock().unwrap().push_back(Ok(serde_json::json!({
        "module": { "task": { "out": {
            "status": "500",
            "noti_info": { "enabled_title_view_notis": [{ "title": "x", "url": "y" }] }
        }}}
    })
    .to_string()));
    let h = Harness::start(agent, true);

    wait(3000).await;
    assert!(h.recorded().shown.is_empty());

    let (engine, _) = h.stop().await;
    assert!(!engine.has_work());
    assert!(engine.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn push_notices_are_urgent() {
    let agent = ScriptedAgent::default();
    agent
        .replies
        .lock()
        .unwrap()
        .push_back(Ok(reply(&[], 0)));
    let h = Harness::start(agent, true);

    wait(100).await;
    h.push_tx
        .send(r#"{"enabled_title_view_notis":[{"title":"pushed","url":"u"}]}"#.into())
        .unwrap();

    wait(600).await;
    {
        let recorded = h.recorded();
        assert_eq!(recorded.shown.len(), 1);
        assert_eq!(recorded.shown[0].title, "pushed");
        assert_eq!(recorded.shown[0].icon_kind, IconKind::Urgent);
    }

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn detail_action_clears_queue_and_displayed() {
    let agent = ScriptedAgent::default();
    agent.replies.lock().unwrap().push_back(Ok(reply(
        &[("a", "https://notice.example/a"), ("b", "u"), ("c", "u")],
        0,
    )));
    let h = Harness::start(agent, true);

    wait(600).await;
    let first = h.recorded().shown[0].id;
    h.send(Event::NotificationActivated(first));

    wait(3000).await;
    let (engine, recorder) = h.stop().await;
    let recorded = recorder.0.lock().unwrap();

    assert_eq!(recorded.shown.len(), 1);
    assert_eq!(recorded.closed, vec![first]);
    assert!(engine.pending().is_empty());
    assert_eq!(engine.displayed_count(), 0);

    assert_eq!(recorded.opened.len(), 1);
    let opened = &recorded.opened[0];
    assert_eq!(opened.url, "https://notice.example/a");
    assert_eq!(opened.cookie("SIGNING"), Some("sig"));
    assert_eq!(opened.cookie("LANG_CODE"), Some("en"));

    assert_eq!(
        recorded.statuses,
        vec![
            TrayStatus::Passive,
            TrayStatus::Attention,
            TrayStatus::Active
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn tray_open_uses_default_domain() {
    let agent = ScriptedAgent::default();
    agent
        .replies
        .lock()
        .unwrap()
        .push_back(Ok(reply(&[], 0)));
    let h = Harness::start(agent, true);

    wait(100).await;
    h.send(Event::OpenDetail);
    wait(100).await;

    let (_, recorder) = h.stop().await;
    let recorded = recorder.0.lock().unwrap();
    assert_eq!(recorded.opened.len(), 1);
    assert_eq!(recorded.opened[0].url, "https://notice.example");
}

#[tokio::test(start_paused = true)]
async fn unavailable_agent_waits_for_availability() {
    let agent = ScriptedAgent::default();
    agent
        .connect_results
        .lock()
        .unwrap()
        .push_back(Err(ConnectFailure::Unavailable));
    agent
        .replies
        .lock()
        .unwrap()
        .push_back(Ok(reply(&[("x", "u")], 0)));
    let h = Harness::start(agent, true);

    wait(3000).await;
    assert_eq!(h.agent.connects.load(Ordering::SeqCst), 1);
    assert_eq!(h.agent.requests(), 0);

    h.send(Event::AvailabilityChanged(true));
    wait(100).await;
    assert_eq!(h.agent.connects.load(Ordering::SeqCst), 2);
    assert_eq!(h.agent.requests(), 1);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn lost_network_stops_retrying() {
    let h = Harness::start(ScriptedAgent::default(), true);

    wait(1200).await;
    h.send(Event::NetworkChanged(false));
    wait(10).await;
    let before = h.agent.requests();
    assert!(before >= 3);

    wait(5000).await;
    assert_eq!(h.agent.requests(), before);

    h.send(Event::NetworkChanged(true));
    wait(10).await;
    assert_eq!(h.agent.requests(), before + 1);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn offline_start_does_not_poll() {
    let h = Harness::start(ScriptedAgent::default(), false);

    wait(2000).await;
    assert_eq!(h.agent.connects.load(Ordering::SeqCst), 0);
    assert_eq!(h.recorded().statuses, vec![TrayStatus::Passive]);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failed_bubbles_do_not_hold_display_slots() {
    let agent = ScriptedAgent::default();
    let notis: Vec<(String, String)> = (1..=7).map(|n| (format!("n{n}"), "u".into())).collect();
    let notis: Vec<(&str, &str)> = notis.iter().map(|(t, u)| (t.as_str(), u.as_str())).collect();
    agent.replies.lock().unwrap().push_back(Ok(reply(&notis, 0)));
    let h = Harness::start_with_display(agent, true, |events, recorder| {
        Box::new(RejectingDisplay { events, recorder })
    });

    wait(7 * 500 + 100).await;
    assert_eq!(h.recorded().shown.len(), 7);

    wait(2000).await;
    let (engine, _) = h.stop().await;
    assert!(engine.pending().is_empty());
    assert_eq!(engine.displayed_count(), 0);
    assert!(!engine.dispatch_running());
}

#[tokio::test(start_paused = true)]
async fn late_failure_of_abandoned_poll_is_ignored() {
    let agent = ScriptedAgent::default();
    {
        let mut replies = agent.replies.lock().unwrap();
        replies.push_back(Err(RequestError::Transport("reset".into())));
        replies.push_back(Ok(reply(&[("kept", "u")], 0)));
    }
    agent.reply_delays.lock().unwrap().extend([300, 500]);
    let h = Harness::start(agent, true);

    wait(100).await;
    h.send(Event::NetworkChanged(false));
    wait(100).await;
    h.send(Event::NetworkChanged(true));

    wait(3000).await;
    assert_eq!(h.agent.requests(), 2);
    assert_eq!(h.agent.subscribes.load(Ordering::SeqCst), 1);
    assert_eq!(h.recorded().shown.len(), 1);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn bus_failures_retry_quietly() {
    let warnings = WarnCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(warnings.clone()));

    let agent = ScriptedAgent::default();
    {
        let mut results = agent.connect_results.lock().unwrap();
        for _ in 0..10 {
            results.push_back(Err(ConnectFailure::Bus("connection refused".into())));
        }
    }
    agent.replies.lock().unwrap().push_back(Ok(reply(&[], 0)));
    let h = Harness::start(agent, true);

    wait(6000).await;
    assert_eq!(h.agent.connects.load(Ordering::SeqCst), 11);
    assert_eq!(h.agent.requests(), 1);
    assert_eq!(warnings.0.load(Ordering::SeqCst), 0);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unavailable_agent_warns_once() {
    let warnings = WarnCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(warnings.clone()));

    let agent = ScriptedAgent::default();
    agent
        .connect_results
        .lock()
        .unwrap()
        .push_back(Err(ConnectFailure::Unavailable));
    let h = Harness::start(agent, true);

    wait(3000).await;
    assert_eq!(warnings.0.load(Ordering::SeqCst), 1);

    h.stop().await;
}
