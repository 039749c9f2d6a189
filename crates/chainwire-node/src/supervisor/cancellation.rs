use chainwire_types::{ChainwireError, ChainwireResult};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancellation signal plus an optional deadline, passed down every call
/// chain that can block on the network or the store.
///
/// Children observe their parent's cancellation; cancelling a child never
/// affects the parent. A child's deadline is never later than its parent's.
#[derive(Clone, Debug)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels this context when the guard is dropped.
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Why the context ended. Cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<ChainwireError> {
        if self.token.is_cancelled() {
            return Some(ChainwireError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ChainwireError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> ChainwireResult<()> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_child_observes_parent_cancel() {
        let parent = Context::background();
        let child = parent.child();
        assert!(child.err().is_none());

        parent.cancel();
        child.done().await;
        assert!(matches!(child.err(), Some(ChainwireError::Cancelled)));
    }

    #[tokio::test]
    async fn test_child_cancel_leaves_parent() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert!(child.is_done());
        assert!(parent.check().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        assert!(ctx.check().is_ok());
        ctx.done().await;
        assert!(matches!(ctx.err(), Some(ChainwireError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_capped_by_parent() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;
        ctx.cancel();
        assert!(matches!(ctx.err(), Some(ChainwireError::Cancelled)));
    }

    #[tokio::test]
    async fn test_drop_guard_cancels() {
        let parent = Context::background();
        let child = parent.child();
        {
            let _guard = child.cancel_on_drop();
        }
        assert!(child.is_done());
        assert!(!parent.is_done());
    }
}
