//! Callback adapter for the awaitable client operations.
//!
//! Every operation is written once as an `async fn`. The `*_with` variants
//! hand that same future to [`CallHandle::spawn`], which runs it on the
//! Tokio runtime and passes its output to the caller's callback.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::error::Result;

/// A pending callback-style call.
///
/// Dropping the handle does not cancel the call. Use
/// [`abandon`](CallHandle::abandon) to stop waiting; the callback is then
/// never invoked. Work already sent to the server is not recalled.
#[derive(Debug)]
#[must_use = "dropping a CallHandle detaches the call; use abandon() to cancel it"]
pub struct CallHandle {
    task: JoinHandle<()>,
}

impl CallHandle {
    /// Run `future` in the background and pass its output to `callback`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<T, Fut, F>(future: Fut, callback: F) -> Self
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let outcome = future.await;
            callback(outcome);
        });
        Self { task }
    }

    /// Stop waiting for the call. The callback will not run if it has not
    /// already.
    pub fn abandon(self) {
        self.task.abort();
    }

    /// Whether the call has completed or was aborted.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the callback has returned. Returns `false` if the call
    /// was abandoned or the callback panicked.
    pub async fn finished(self) -> bool {
        self.task.await.is_ok()
    }
}
