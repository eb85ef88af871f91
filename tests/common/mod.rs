// Hand-written fakes for the traits the UI implements.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use capture_preview::{
    Devices, EngineError, EngineEvent, EngineFactory, EngineHandle, HostApi, MediaSurface,
    PlaybackEngine,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Route crate logs to the test output; `RUST_LOG` overrides.
pub fn init_logging() {
    capture_preview::telemetry::init_with("capture_preview=debug");
}

/// Let spawned tasks run until the runtime is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ----------------------------------------------------------------------------
// Playback engine
// ----------------------------------------------------------------------------

#[derive(Default)]
struct EngineLog {
    created: Vec<(String, String)>,
    destroyed: usize,
    senders: Vec<mpsc::UnboundedSender<EngineEvent>>,
    recover_calls: usize,
    start_load_calls: usize,
}

pub struct FakeEngines {
    supported: bool,
    fail_create: AtomicBool,
    recover_fails: AtomicBool,
    start_load_fails: AtomicBool,
    log: Arc<Mutex<EngineLog>>,
}

impl FakeEngines {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_support(true))
    }

    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self::with_support(false))
    }

    fn with_support(supported: bool) -> Self {
        Self {
            supported,
            fail_create: AtomicBool::new(false),
            recover_fails: AtomicBool::new(false),
            start_load_fails: AtomicBool::new(false),
            log: Arc::new(Mutex::new(EngineLog::default())),
        }
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_recovery(&self, fail: bool) {
        self.recover_fails.store(fail, Ordering::SeqCst);
        self.start_load_fails.store(fail, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.log.lock().unwrap().created.len()
    }

    /// Engines created and not yet destroyed
    pub fn live(&self) -> usize {
        let log = self.log.lock().unwrap();
        log.created.len() - log.destroyed
    }

    pub fn last_created(&self) -> Option<(String, String)> {
        self.log.lock().unwrap().created.last().cloned()
    }

    pub fn recover_calls(&self) -> usize {
        self.log.lock().unwrap().recover_calls
    }

    pub fn start_load_calls(&self) -> usize {
        self.log.lock().unwrap().start_load_calls
    }

    /// Emit an event from the most recently created engine
    pub fn emit(&self, event: EngineEvent) {
        let log = self.log.lock().unwrap();
        let tx = log.senders.last().expect("no engine created");
        let _ = tx.send(event);
    }

    /// Emit an event from the engine created `index`-th (0-based)
    pub fn emit_from(&self, index: usize, event: EngineEvent) {
        let log = self.log.lock().unwrap();
        let _ = log.senders[index].send(event);
    }

    pub fn emit_error(&self, error: EngineError) {
        self.emit(EngineEvent::Error(error));
    }
}

impl EngineFactory for FakeEngines {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, url: &str, surface: Arc<dyn MediaSurface>) -> Result<EngineHandle> {
        if self.fail_create.load(Ordering::SeqCst) {
            bail!("engine construction failed");
        }
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut log = self.log.lock().unwrap();
            log.created.push((url.to_string(), surface.id().to_string()));
            log.senders.push(tx);
        }
        Ok(EngineHandle {
            engine: Box::new(FakeEngine {
                log: Arc::clone(&self.log),
                recover_fails: self.recover_fails.load(Ordering::SeqCst),
                start_load_fails: self.start_load_fails.load(Ordering::SeqCst),
                destroyed: false,
            }),
            events: rx,
        })
    }
}

struct FakeEngine {
    log: Arc<Mutex<EngineLog>>,
    recover_fails: bool,
    start_load_fails: bool,
    destroyed: bool,
}

impl PlaybackEngine for FakeEngine {
    fn recover_media_error(&mut self) -> Result<()> {
        self.log.lock().unwrap().recover_calls += 1;
        if self.recover_fails {
            bail!("recoverMediaError threw");
        }
        Ok(())
    }

    fn start_load(&mut self) -> Result<()> {
        self.log.lock().unwrap().start_load_calls += 1;
        if self.start_load_fails {
            bail!("startLoad threw");
        }
        Ok(())
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.log.lock().unwrap().destroyed += 1;
        }
    }
}

// ----------------------------------------------------------------------------
// Media surface
// ----------------------------------------------------------------------------

pub struct FakeSurface {
    id: String,
    reject_play: bool,
    stall_play: bool,
    plays: AtomicUsize,
    native_source: Mutex<Option<String>>,
}

impl FakeSurface {
    pub fn new(id: &str) -> Arc<Self> {
        Self::build(id, false, false)
    }

    /// A surface whose autoplay is always blocked
    pub fn rejecting(id: &str) -> Arc<Self> {
        Self::build(id, true, false)
    }

    /// A surface whose `play()` never settles, like a video element still
    /// waiting for its first frame
    pub fn stalled(id: &str) -> Arc<Self> {
        Self::build(id, false, true)
    }

    fn build(id: &str, reject_play: bool, stall_play: bool) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            reject_play,
            stall_play,
            plays: AtomicUsize::new(0),
            native_source: Mutex::new(None),
        })
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn native_source(&self) -> Option<String> {
        self.native_source.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaSurface for FakeSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_source(&self, url: &str) {
        *self.native_source.lock().unwrap() = Some(url.to_string());
    }

    async fn play(&self) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.stall_play {
            std::future::pending::<()>().await;
        }
        if self.reject_play {
            bail!("NotAllowedError: play() failed because the user didn't interact");
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Host API
// ----------------------------------------------------------------------------

/// Scripted answer for one `capture_health` call
pub enum HealthReply {
    Now(Result<bool>),
    /// Resolves when the test sends on the paired channel
    Deferred(oneshot::Receiver<Result<bool>>),
}

pub struct FakeHost {
    pub devices: Devices,
    recorder_result: Mutex<Option<Result<bool>>>,
    recorder_calls: Mutex<Vec<(String, u32, String)>>,
    health_queue: Mutex<VecDeque<HealthReply>>,
    default_health: AtomicBool,
    health_calls: AtomicUsize,
    endpoint: Mutex<Option<String>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        let mut devices = Devices::default();
        devices.monitors.insert(0, "Display 1".to_string());
        devices.cameras.insert(0, "Cam 1".to_string());
        devices.cameras.insert(2, "前置摄像头".to_string());
        Arc::new(Self {
            devices,
            recorder_result: Mutex::new(None),
            recorder_calls: Mutex::new(Vec::new()),
            health_queue: Mutex::new(VecDeque::new()),
            default_health: AtomicBool::new(true),
            health_calls: AtomicUsize::new(0),
            endpoint: Mutex::new(Some("exam.example.org:8080".to_string())),
        })
    }

    /// Override the next recorder start result; defaults to `Ok(true)`
    pub fn recorder_returns(&self, result: Result<bool>) {
        *self.recorder_result.lock().unwrap() = Some(result);
    }

    pub fn recorder_calls(&self) -> Vec<(String, u32, String)> {
        self.recorder_calls.lock().unwrap().clone()
    }

    /// Answer for health calls once the scripted queue is empty
    pub fn set_healthy(&self, healthy: bool) {
        self.default_health.store(healthy, Ordering::SeqCst);
    }

    pub fn push_health(&self, reply: HealthReply) {
        self.health_queue.lock().unwrap().push_back(reply);
    }

    /// Queue a health answer the test resolves later
    pub fn defer_health(&self) -> oneshot::Sender<Result<bool>> {
        let (tx, rx) = oneshot::channel();
        self.push_health(HealthReply::Deferred(rx));
        tx
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn set_endpoint(&self, endpoint: Option<&str>) {
        *self.endpoint.lock().unwrap() = endpoint.map(str::to_string);
    }

    fn record_start(&self, kind: &str, index: u32, name: &str) -> Result<bool> {
        self.recorder_calls
            .lock()
            .unwrap()
            .push((kind.to_string(), index, name.to_string()));
        self.recorder_result.lock().unwrap().take().unwrap_or(Ok(true))
    }
}

#[async_trait::async_trait]
impl HostApi for FakeHost {
    async fn get_available_devices(&self) -> Result<Devices> {
        Ok(self.devices.clone())
    }

    async fn start_screen_recorder(&self, index: u32, name: &str) -> Result<bool> {
        self.record_start("screen", index, name)
    }

    async fn start_camera_recorder(&self, index: u32, name: &str) -> Result<bool> {
        self.record_start("camera", index, name)
    }

    async fn capture_health(&self) -> Result<bool> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.health_queue.lock().unwrap().pop_front();
        match reply {
            Some(HealthReply::Now(result)) => result,
            Some(HealthReply::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(anyhow!("health reply dropped"))),
            None => Ok(self.default_health.load(Ordering::SeqCst)),
        }
    }

    async fn get_endpoint(&self) -> Result<Option<String>> {
        Ok(self.endpoint.lock().unwrap().clone())
    }
}
