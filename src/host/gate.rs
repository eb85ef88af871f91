use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use super::HostApi;
use crate::config::HostConfig;
use crate::error::{PreviewError, Result};

type Slot = Option<Arc<dyn HostApi>>;

/// Readiness future for the host API
///
/// Cloneable; every clone resolves to the same API once the paired
/// [`HostProvider`] has been fulfilled.
#[derive(Clone)]
pub struct HostGate {
    rx: watch::Receiver<Slot>,
    timeout: Option<Duration>,
}

/// Write side of a [`HostGate`]; consumed when the API is provided, so the
/// gate resolves exactly once.
pub struct HostProvider {
    tx: watch::Sender<Slot>,
}

impl HostGate {
    /// Create an unresolved gate. `timeout` bounds every [`HostGate::ready`] call.
    pub fn new(timeout: Option<Duration>) -> (Self, HostProvider) {
        let (tx, rx) = watch::channel(None);
        (Self { rx, timeout }, HostProvider { tx })
    }

    /// Create an unresolved gate bounded by `host.ready_timeout_ms`
    pub fn from_config(config: &HostConfig) -> (Self, HostProvider) {
        Self::new(config.ready_timeout())
    }

    /// A gate that is already resolved
    pub fn ready_with(api: Arc<dyn HostApi>) -> Self {
        let (gate, provider) = Self::new(None);
        provider.provide(api);
        gate
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait until the host API is available
    pub async fn ready(&self) -> Result<Arc<dyn HostApi>> {
        let current = self.rx.borrow().clone();
        if let Some(api) = current {
            return Ok(api);
        }

        debug!("Waiting for host API");
        let mut rx = self.rx.clone();
        let wait = async move {
            rx.wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|slot| slot.as_ref().map(Arc::clone))
        };

        let api = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.ok().flatten(),
            None => wait.await,
        };

        api.ok_or(PreviewError::HostUnavailable {
            waited_ms: self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0),
        })
    }
}

impl HostProvider {
    pub fn provide(self, api: Arc<dyn HostApi>) {
        info!("Host API ready");
        self.tx.send_replace(Some(api));
    }
}
