//! Start destination resolution off the UI task.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use appshell_core::{DestinationId, StartPolicy};
use appshell_store::SessionStore;

use crate::supervisor::BackgroundTasks;

pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Timeout,
    Store(String),
    Worker(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("session store read timed out"),
            Self::Store(e) => write!(f, "session store error: {e}"),
            Self::Worker(e) => write!(f, "session read worker failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub destination: DestinationId,
    /// Set when the signed-out destination was chosen without a successful read.
    pub fallback: Option<FallbackReason>,
}

#[derive(Clone)]
pub struct StartResolver {
    store: Arc<dyn SessionStore>,
    background: BackgroundTasks,
    policy: StartPolicy,
    timeout: Duration,
}

impl StartResolver {
    pub fn new(store: Arc<dyn SessionStore>, background: BackgroundTasks, policy: StartPolicy) -> Self {
        Self {
            store,
            background,
            policy,
            timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the token once and pick the start destination.
    ///
    /// Waits for in-flight background cleanup first, so a relaunch never
    /// sees a half-cleared session. A read that fails or outlasts the
    /// timeout falls back to the signed-out destination.
    pub async fn resolve(&self) -> Resolution {
        let store = Arc::clone(&self.store);
        let background = self.background.clone();
        let read = async move {
            background.wait_idle().await;
            tokio::task::spawn_blocking(move || store.read_token()).await
        };

        let fallback = match tokio::time::timeout(self.timeout, read).await {
            Ok(Ok(Ok(token))) => {
                let destination = self.policy.resolve(token.as_ref()).clone();
                tracing::info!(%destination, signed_in = token.is_some(), "start destination resolved");
                return Resolution {
                    destination,
                    fallback: None,
                };
            }
            Ok(Ok(Err(e))) => FallbackReason::Store(e.to_string()),
            Ok(Err(e)) => FallbackReason::Worker(e.to_string()),
            Err(_) => FallbackReason::Timeout,
        };

        let destination = self.policy.signed_out.clone();
        tracing::warn!(%destination, "falling back to signed-out start: {fallback}");
        Resolution {
            destination,
            fallback: Some(fallback),
        }
    }
}
