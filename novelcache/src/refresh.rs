//! Handle to the auto-refresh task.

use tokio::task::JoinHandle;

/// Shortest accepted auto-refresh period.
pub const MIN_REFRESH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Handle to a running auto-refresh loop.
///
/// The loop stops when the handle is dropped or [`stop`](Self::stop) is
/// called. Use [`detach`](Self::detach) to keep it running for the lifetime
/// of the runtime.
#[derive(Debug)]
#[must_use = "dropping the handle stops the refresh loop"]
pub struct RefreshHandle {
    handle: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Whether the loop has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stops the loop.
    pub fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Lets the loop run without a handle.
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
