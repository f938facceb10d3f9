//! Cooperative cancellation between protocol steps

use tokio_util::sync::CancellationToken;

/// Cancellation handle checked by the runner before every protocol step.
///
/// Clones share one underlying token. The runner only polls it, so it works
/// from a blocking thread while a signal task on the runtime cancels it.
#[derive(Debug, Clone)]
pub struct CancelToken {
    token: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A token that is cancelled with this one but can also be cancelled alone.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CancellationToken> for CancelToken {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}
