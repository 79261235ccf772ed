//! Lazily created, shared connection handle.

use std::future::Future;

use tokio::sync::Mutex;

/// Holds at most one live handle.
///
/// The lock is held while connecting, so concurrent callers wait for the
/// first attempt instead of opening a second handle.
#[derive(Debug)]
pub struct ConnectionSlot<T> {
    handle: Mutex<Option<T>>,
}

impl<T> Default for ConnectionSlot<T> {
    fn default() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }
}

impl<T: Clone> ConnectionSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing handle, or runs `connect` and stores its result.
    /// A failed attempt leaves the slot empty.
    pub async fn get_or_try_connect<F, Fut, E>(&self, connect: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.handle.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        let handle = connect().await?;
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// The live handle, if any.
    pub async fn current(&self) -> Option<T> {
        self.handle.lock().await.clone()
    }

    /// Drops the stored handle. Returns whether one was stored.
    pub async fn invalidate(&self) -> bool {
        self.handle.lock().await.take().is_some()
    }
}
