//! Error types for agent exchanges.

/// No live handle to the agent could be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectFailure {
    #[error("agent service is not available")]
    Unavailable,

    #[error("bus connection failed: {0}")]
    Bus(String),
}

/// A request to the agent did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("transport error: {0}")]
    Transport(String),
}
