//! Screen/camera preview coordination
//!
//! The [`SessionCoordinator`] is what the capture page talks to. It owns one
//! [`StreamSession`] per capture feed plus the shared [`HealthMonitor`],
//! turns device selections into recorder starts and stream attaches, and
//! decides whether the user may move on to the exam.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{PreviewError, Result};
use crate::events::{EventPayload, EventSink, PreviewEvent};
use crate::health::{HealthMonitor, HealthProbe, HostProbe};
use crate::host::{Devices, HostGate, HostProvider};
use crate::playback::{EngineFactory, MediaSurface, StreamSession};
use crate::stream_url::stream_url_with;
use crate::types::{HealthStatus, StreamKind, StreamStatus};

/// Where to send the user once capture has been confirmed healthy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStage {
    pub endpoint: String,
    pub url: String,
}

impl NextStage {
    pub fn exam(endpoint: String) -> Self {
        let url = format!("http://{}/exam", endpoint);
        Self { endpoint, url }
    }
}

pub struct SessionCoordinator {
    config: Config,
    host: HostGate,
    screen: StreamSession,
    camera: StreamSession,
    health: HealthMonitor,
    events: EventSink,
    shut_down: AtomicBool,
}

impl SessionCoordinator {
    /// Build both stream sessions and start health polling against the host.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(host: HostGate, engines: Arc<dyn EngineFactory>, config: Config) -> Self {
        let probe: Arc<dyn HealthProbe> = Arc::new(HostProbe::new(host.clone()));
        Self::with_probe(host, engines, probe, config)
    }

    /// Build a coordinator before the host API exists. The returned provider
    /// is handed to the host integration layer; until it is fulfilled, host
    /// calls wait up to `host.ready_timeout_ms` and health stays unknown.
    pub fn awaiting_host(engines: Arc<dyn EngineFactory>, config: Config) -> (Self, HostProvider) {
        let (host, provider) = HostGate::from_config(&config.host);
        (Self::new(host, engines, config), provider)
    }

    /// Like [`SessionCoordinator::new`] with a custom health probe
    pub fn with_probe(
        host: HostGate,
        engines: Arc<dyn EngineFactory>,
        probe: Arc<dyn HealthProbe>,
        config: Config,
    ) -> Self {
        let events = EventSink::new();
        let screen = StreamSession::new(
            StreamKind::Screen,
            Arc::clone(&engines),
            &config.retry,
            events.clone(),
        );
        let camera = StreamSession::new(StreamKind::Camera, engines, &config.retry, events.clone());

        let health = HealthMonitor::new(probe, &config.health, events.clone());
        health.start(config.health.interval());

        Self {
            config,
            host,
            screen,
            camera,
            health,
            events,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn session(&self, kind: StreamKind) -> &StreamSession {
        match kind {
            StreamKind::Screen => &self.screen,
            StreamKind::Camera => &self.camera,
        }
    }

    pub fn stream_status(&self, kind: StreamKind) -> StreamStatus {
        self.session(kind).status()
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    pub fn health_status(&self) -> HealthStatus {
        self.health.status()
    }

    /// Whether the "next" action should be enabled
    pub fn can_proceed(&self) -> bool {
        self.health.can_proceed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreviewEvent> {
        self.events.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// List the monitors and cameras the host can record
    pub async fn devices(&self) -> Result<Devices> {
        self.ensure_running()?;
        let api = self.host.ready().await?;
        let devices = api.get_available_devices().await.map_err(|e| {
            error!("Failed to list capture devices: {:#}", e);
            PreviewError::Devices(format!("{:#}", e))
        })?;

        for kind in [StreamKind::Screen, StreamKind::Camera] {
            info!("Found {} {} devices", devices.for_kind(kind).len(), kind);
        }
        Ok(devices)
    }

    /// Start recording device `index` and preview it on `surface`.
    ///
    /// If the host refuses or fails to start the recorder, the stream keeps
    /// whatever it was showing before. Either way capture health is
    /// re-checked right away. Returns the attached stream URL.
    pub async fn select_source(
        &self,
        kind: StreamKind,
        index: u32,
        name: &str,
        surface: Arc<dyn MediaSurface>,
    ) -> Result<String> {
        self.ensure_running()?;

        let result = self.start_and_attach(kind, index, name, surface).await;
        if let Err(e) = &result {
            warn!("Selecting {} source {:?} failed: {}", kind, name, e);
            self.events.emit(EventPayload::SourceRejected {
                stream: kind,
                reason: e.to_string(),
            });
        }

        self.health.poll_once().await;
        result
    }

    async fn start_and_attach(
        &self,
        kind: StreamKind,
        index: u32,
        name: &str,
        surface: Arc<dyn MediaSurface>,
    ) -> Result<String> {
        let api = self.host.ready().await?;

        info!("Starting {} recorder for {:?} (index {})", kind, name, index);
        let started = api
            .start_recorder(kind, index, name)
            .await
            .map_err(|e| PreviewError::Upstream {
                stream: kind,
                reason: format!("{:#}", e),
            })?;
        if !started {
            return Err(PreviewError::Upstream {
                stream: kind,
                reason: "host refused to start the recorder".to_string(),
            });
        }

        // Shutdown may have happened while the host was busy.
        self.ensure_running()?;

        let url = stream_url_with(&self.config.stream, name, index);
        self.session(kind).attach(surface, &url);
        Ok(url)
    }

    /// Confirm capture is healthy with a fresh probe and return the next stage.
    pub async fn proceed(&self) -> Result<NextStage> {
        self.ensure_running()?;

        if !self.health.check().await? {
            warn!("Capture is not healthy, staying on the capture page");
            return Err(PreviewError::CaptureUnhealthy);
        }

        let api = self.host.ready().await?;
        let endpoint = match api.get_endpoint().await {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => return Err(PreviewError::NoEndpoint),
            Err(e) => {
                error!("Failed to read exam endpoint: {:#}", e);
                return Err(PreviewError::NoEndpoint);
            }
        };

        let next = NextStage::exam(endpoint);
        info!("Capture healthy, proceeding to {}", next.url);
        Ok(next)
    }

    /// Stop health polling and tear down both streams. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down capture preview");
        self.health.stop();
        self.screen.teardown();
        self.camera.teardown();
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(PreviewError::ShutDown);
        }
        Ok(())
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
