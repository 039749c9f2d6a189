use chainwire_types::{ChainwireError, ChainwireResult};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Context;

/// A spawned task paired with the context that stops it.
pub struct BackgroundTask {
    name: String,
    ctx: Context,
    handle: JoinHandle<ChainwireResult<()>>,
}

impl BackgroundTask {
    pub fn spawn<F, Fut>(name: &str, parent: &Context, factory: F) -> Self
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = ChainwireResult<()>> + Send + 'static,
    {
        let ctx = parent.child();
        let handle = tokio::spawn(factory(ctx.clone()));
        debug!("Spawned background task: {}", name);

        Self {
            name: name.to_string(),
            ctx,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the task and waits for it to return. The task is aborted if it
    /// ignores cancellation for longer than `timeout`.
    pub async fn stop(self, timeout: Duration) -> ChainwireResult<()> {
        self.ctx.cancel();
        let mut handle = self.handle;

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => {
                debug!("Task '{}' shut down cleanly", self.name);
                Ok(())
            }
            Ok(Ok(Err(e))) if e.is_context_error() => Ok(()),
            Ok(Ok(Err(e))) => {
                warn!("Task '{}' exited with error: {}", self.name, e);
                Err(e)
            }
            Ok(Err(e)) => Err(ChainwireError::Internal(format!(
                "Task '{}' panicked: {}",
                self.name, e
            ))),
            Err(_) => {
                warn!("Task '{}' did not stop in time, aborting", self.name);
                handle.abort();
                Err(ChainwireError::Internal(format!(
                    "Task '{}' did not stop within {:?}",
                    self.name, timeout
                )))
            }
        }
    }
}
