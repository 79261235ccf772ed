use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("dbus error: {0}")]
    Dbus(#[from] zbus::Error),
    #[error("unexpected reply signature: {0}")]
    UnexpectedReply(String),
}

pub type Result<T> = std::result::Result<T, Error>;
