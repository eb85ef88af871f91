use anyhow::Result;

use crate::error::PreviewError;
use crate::host::HostGate;

/// Out-of-band check of whether capture is working
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    /// Resolves once the probe can be asked at all. Time spent here is not
    /// counted against the probe timeout, and a failure leaves the health
    /// status as it was.
    async fn ready(&self) -> std::result::Result<(), PreviewError> {
        Ok(())
    }

    async fn check(&self) -> Result<bool>;
}

/// Probe backed by the host's `capture_health` call
pub struct HostProbe {
    host: HostGate,
}

impl HostProbe {
    pub fn new(host: HostGate) -> Self {
        Self { host }
    }
}

#[async_trait::async_trait]
impl HealthProbe for HostProbe {
    async fn ready(&self) -> std::result::Result<(), PreviewError> {
        self.host.ready().await.map(drop)
    }

    async fn check(&self) -> Result<bool> {
        let api = self.host.ready().await?;
        api.capture_health().await
    }
}
