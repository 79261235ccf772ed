//! Client for the notice agent on the system bus.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use notice_engine::{AgentFuture, AgentTransport, ConnectFailure, RequestError};
use notice_protocol::constants::{
    AGENT_BUS_NAME, AGENT_INTERFACE, AGENT_OBJECT_PATH, DO_TASK_METHOD, PUSH_SIGNAL,
};
use tracing::{debug, warn};
use zbus::zvariant::OwnedValue;
use zbus::{Connection, Message, Proxy};

use crate::error::{Error, Result};
use crate::slot::ConnectionSlot;
use crate::systemd::unit_available;

/// How long a `do_task` call may take before it counts as a transport failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Where to find the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub bus_name: String,
    pub object_path: String,
    /// systemd unit probed before connecting.
    pub unit: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            bus_name: AGENT_BUS_NAME.into(),
            object_path: AGENT_OBJECT_PATH.into(),
            unit: "gooroom-agent.service".into(),
        }
    }
}

/// Cloneable handle to the agent connection.
#[derive(Clone)]
pub struct AgentClient {
    inner: Arc<Inner>,
}

struct Inner {
    settings: AgentSettings,
    proxy: ConnectionSlot<Proxy<'static>>,
}

impl AgentClient {
    pub fn new(settings: AgentSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                proxy: ConnectionSlot::new(),
            }),
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.inner.settings
    }
}

impl Inner {
    async fn open(&self) -> std::result::Result<Proxy<'static>, ConnectFailure> {
        let conn = Connection::system().await.map_err(bus_failure)?;
        if !unit_available(&conn, &self.settings.unit).await {
            return Err(ConnectFailure::Unavailable);
        }

        let proxy = Proxy::new(
            &conn,
            self.settings.bus_name.clone(),
            self.settings.object_path.clone(),
            AGENT_INTERFACE,
        )
        .await
        .map_err(bus_failure)?;

        debug!(bus = %self.settings.bus_name, "agent proxy created");
        Ok(proxy)
    }

    async fn proxy(&self) -> std::result::Result<Proxy<'static>, RequestError> {
        self.proxy
            .current()
            .await
            .ok_or_else(|| RequestError::Transport("not connected".into()))
    }
}

impl AgentTransport for AgentClient {
    fn connect(&self) -> AgentFuture<std::result::Result<(), ConnectFailure>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.proxy.get_or_try_connect(|| inner.open()).await?;
            Ok(())
        })
    }

    fn request(&self, body: String) -> AgentFuture<std::result::Result<String, RequestError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let proxy = inner.proxy().await?;
            let args = (body,);
            let call = proxy.call_method(DO_TASK_METHOD, &args);

            let reply = match tokio::time::timeout(REQUEST_TIMEOUT, call).await {
                Ok(Ok(reply)) => reply,
                Ok(Err(e)) => {
                    if matches!(e, zbus::Error::InputOutput(_)) {
                        inner.proxy.invalidate().await;
                    }
                    return Err(RequestError::Transport(e.to_string()));
                }
                Err(_) => return Err(RequestError::Transport("request timed out".into())),
            };

            message_text(&reply).map_err(|e| RequestError::Transport(e.to_string()))
        })
    }

    fn subscribe(
        &self,
    ) -> AgentFuture<std::result::Result<BoxStream<'static, String>, RequestError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let proxy = inner.proxy().await?;
            let signals = proxy
                .receive_signal(PUSH_SIGNAL)
                .await
                .map_err(|e| RequestError::Transport(e.to_string()))?;

            let payloads = signals.filter_map(|msg| async move {
                match message_text(&msg) {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(error = %e, "undecodable push signal dropped");
                        None
                    }
                }
            });
            Ok(payloads.boxed())
        })
    }
}

/// Extracts the single string a reply or signal carries, either bare or
/// wrapped in a variant.
fn message_text(msg: &Message) -> Result<String> {
    if let Ok(text) = msg.body::<String>() {
        return Ok(text);
    }
    let value: OwnedValue = msg.body()?;
    String::try_from(value).map_err(|e| Error::UnexpectedReply(e.to_string()))
}

fn bus_failure(e: zbus::Error) -> ConnectFailure {
    ConnectFailure::Bus(e.to_string())
}
