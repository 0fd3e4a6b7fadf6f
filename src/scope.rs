use std::future::Future;

use tokio::sync::watch;

/// Lives as long as one screen. Dropping or cancelling it turns every
/// outstanding [`ScopeToken::run`] into `None`, so a late response is
/// discarded instead of landing on a closed screen.
pub struct ScreenScope {
    cancel: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ScopeToken {
    cancelled: watch::Receiver<bool>,
}

impl ScreenScope {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self { cancel }
    }

    pub fn token(&self) -> ScopeToken {
        ScopeToken {
            cancelled: self.cancel.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

impl ScopeToken {
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow() || self.cancelled.has_changed().is_err()
    }

    /// Resolves once the owning scope is cancelled or gone.
    pub async fn cancelled(&mut self) {
        loop {
            let cancelled = *self.cancelled.borrow_and_update();
            if cancelled {
                return;
            }
            if self.cancelled.changed().await.is_err() {
                return;
            }
        }
    }

    /// The request itself is not aborted on the backend; only its result
    /// is dropped.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut token = self.clone();
        if token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = fut => Some(out),
        }
    }
}
