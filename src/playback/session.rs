use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::classify::{classify, Classification};
use super::engine::{EngineError, EngineEvent, EngineFactory, MediaSurface, PlaybackEngine};
use super::retry::RetryPolicy;
use crate::config::RetryConfig;
use crate::error::PreviewError;
use crate::events::{EventPayload, EventSink};
use crate::types::{StreamKind, StreamStatus};

/// Playback of one live stream onto one surface
///
/// The session owns at most one engine at a time and recovers from engine
/// failures: decode and network faults are repaired in place, anything else
/// destroys the engine and re-attaches with exponential backoff until the
/// retry budget runs out.
///
/// Every attach and teardown starts a new epoch. Engine events and retry
/// timers remember the epoch they were created in and do nothing once it has
/// passed, so a late callback can never revive a torn-down session.
pub struct StreamSession {
    shared: Arc<Shared>,
}

struct Shared {
    me: Weak<Shared>,
    stream: StreamKind,
    engines: Arc<dyn EngineFactory>,
    events: EventSink,
    state: Mutex<SessionState>,
}

struct SessionState {
    status: StreamStatus,
    source_url: Option<String>,
    surface: Option<Arc<dyn MediaSurface>>,
    engine: Option<Box<dyn PlaybackEngine>>,
    /// Task forwarding the current engine's events
    pump: Option<JoinHandle<()>>,
    retry: RetryPolicy,
    epoch: u64,
    /// Playing through the surface's native player, without an engine
    native: bool,
}

impl StreamSession {
    pub fn new(
        stream: StreamKind,
        engines: Arc<dyn EngineFactory>,
        retry: &RetryConfig,
        events: EventSink,
    ) -> Self {
        Self {
            shared: Arc::new_cyclic(|me| Shared {
                me: me.clone(),
                stream,
                engines,
                events,
                state: Mutex::new(SessionState {
                    status: StreamStatus::Idle,
                    source_url: None,
                    surface: None,
                    engine: None,
                    pump: None,
                    retry: RetryPolicy::new(retry),
                    epoch: 0,
                    native: false,
                }),
            }),
        }
    }

    pub fn stream(&self) -> StreamKind {
        self.shared.stream
    }

    pub fn status(&self) -> StreamStatus {
        self.shared.state().status
    }

    pub fn source_url(&self) -> Option<String> {
        self.shared.state().source_url.clone()
    }

    /// Re-attach attempts consumed since the last successful attach
    pub fn attempt_count(&self) -> u32 {
        self.shared.state().retry.attempt_count()
    }

    pub fn has_engine(&self) -> bool {
        self.shared.state().engine.is_some()
    }

    /// Whether the session fell back to native playback
    pub fn is_native(&self) -> bool {
        self.shared.state().native
    }

    /// Start playing `url` on `surface`, replacing whatever was attached
    /// before and resetting the retry budget.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(&self, surface: Arc<dyn MediaSurface>, url: &str) {
        info!(
            "Attaching {} stream: {} -> {}",
            self.shared.stream,
            url,
            surface.id()
        );
        let mut state = self.shared.state();
        state.retry.reset();
        self.shared.attach_locked(&mut state, surface, url.to_string());
    }

    /// Stop playback and return to `Idle`. Safe to call in any state, any
    /// number of times.
    pub fn teardown(&self) {
        let mut state = self.shared.state();
        if state.status != StreamStatus::Idle {
            info!("Tearing down {} stream", self.shared.stream);
        }
        state.epoch += 1;
        state.retry.reset();
        Shared::release_engine(&mut state);
        state.status = StreamStatus::Idle;
        state.source_url = None;
        state.surface = None;
        state.native = false;
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Destroy the engine and stop forwarding its events.
    fn release_engine(state: &mut SessionState) {
        if let Some(pump) = state.pump.take() {
            pump.abort();
        }
        if let Some(mut engine) = state.engine.take() {
            engine.destroy();
        }
    }

    /// Shared by fresh attaches and retries; the caller decides whether the
    /// retry budget is reset.
    fn attach_locked(
        &self,
        state: &mut SessionState,
        surface: Arc<dyn MediaSurface>,
        url: String,
    ) {
        Self::release_engine(state);
        state.epoch += 1;
        state.source_url = Some(url.clone());
        state.surface = Some(Arc::clone(&surface));

        if !self.engines.is_supported() {
            info!(
                "Playback engine unsupported, using native playback for {} stream",
                self.stream
            );
            state.native = true;
            state.status = StreamStatus::Playing;
            surface.set_source(&url);
            self.spawn_play(surface);
            self.events.emit(EventPayload::StreamPlaying {
                stream: self.stream,
            });
            return;
        }

        state.native = false;
        state.status = StreamStatus::Attaching;

        match self.engines.create(&url, surface) {
            Ok(handle) => {
                state.engine = Some(handle.engine);
                state.pump = Some(self.spawn_pump(state.epoch, handle.events));
            }
            Err(e) => {
                let err = PreviewError::Engine { url, source: e };
                error!("{} stream: {:#}", self.stream, err);
                self.fail_attempt(state);
            }
        }
    }

    fn spawn_pump(
        &self,
        epoch: u64,
        mut events: mpsc::UnboundedReceiver<EngineEvent>,
    ) -> JoinHandle<()> {
        let weak = self.me.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                if !shared.on_event(epoch, event) {
                    break;
                }
            }
        })
    }

    fn spawn_play(&self, surface: Arc<dyn MediaSurface>) {
        let stream = self.stream;
        tokio::spawn(async move {
            if let Err(e) = surface.play().await {
                warn!("{} stream: play() rejected: {:#}", stream, e);
            }
        });
    }

    /// Handle one engine event. Returns false once the epoch has moved on
    /// and the pump should stop.
    fn on_event(&self, epoch: u64, event: EngineEvent) -> bool {
        match event {
            EngineEvent::ManifestParsed => {
                let surface = {
                    let mut state = self.state();
                    if state.epoch != epoch {
                        return false;
                    }
                    state.status = StreamStatus::Playing;
                    state.retry.reset_attempts();
                    state.surface.clone()
                };

                info!("{} stream playing", self.stream);
                self.events.emit(EventPayload::StreamPlaying {
                    stream: self.stream,
                });

                // play() may not settle until the first frame; later engine
                // errors must still be handled meanwhile.
                if let Some(surface) = surface {
                    self.spawn_play(surface);
                }
                true
            }
            EngineEvent::Error(err) => {
                let mut state = self.state();
                if state.epoch != epoch {
                    return false;
                }
                self.on_engine_error(&mut state, err);
                state.epoch == epoch
            }
        }
    }

    fn on_engine_error(&self, state: &mut SessionState, err: EngineError) {
        let classification = classify(&err);
        debug!(
            "{} stream engine error {:?} ({}): {:?}",
            self.stream, err.kind, err.details, classification
        );

        let recovered = match classification {
            Classification::Ignored => return,
            Classification::RecoverableDecode => state
                .engine
                .as_mut()
                .map(|engine| engine.recover_media_error()),
            Classification::RecoverableNetwork => {
                state.engine.as_mut().map(|engine| engine.start_load())
            }
            Classification::Fatal => None,
        };

        match recovered {
            Some(Ok(())) => {
                let fault = PreviewError::TransientMedia {
                    stream: self.stream,
                    details: err.details,
                };
                warn!("{}, recovered in place", fault);
                return;
            }
            Some(Err(e)) => {
                warn!(
                    "{} stream: in-place recovery failed, escalating: {:#}",
                    self.stream, e
                );
            }
            None => {
                if !classification.consumes_attempt() {
                    // Recoverable error with no engine left to repair.
                    return;
                }
                warn!("{} stream fatal error: {}", self.stream, err.details);
            }
        }

        // Running inside the pump: detach it rather than abort it.
        state.pump = None;
        self.fail_attempt(state);
    }

    fn fail_attempt(&self, state: &mut SessionState) {
        Self::release_engine(state);
        self.consume_attempt(state);
    }

    /// Either schedule a re-attach or give up on the stream.
    fn consume_attempt(&self, state: &mut SessionState) {
        state.epoch += 1;

        if !state.retry.can_retry() {
            let attempts = state.retry.attempt_count();
            state.status = StreamStatus::Failed;
            let fault = PreviewError::Attachment {
                stream: self.stream,
                attempts,
            };
            error!("{}, giving up", fault);
            self.events.emit(EventPayload::StreamFailed {
                stream: self.stream,
                attempts,
            });
            return;
        }

        state.status = StreamStatus::Recovering;
        let epoch = state.epoch;
        let weak = self.me.clone();
        let delay = state.retry.schedule(async move {
            if let Some(shared) = weak.upgrade() {
                shared.on_retry_timer(epoch);
            }
        });

        info!(
            "{} stream re-attach {}/{} in {:?}",
            self.stream,
            state.retry.attempt_count(),
            state.retry.max_attempts(),
            delay
        );
        self.events.emit(EventPayload::StreamRecovering {
            stream: self.stream,
            attempt: state.retry.attempt_count(),
            delay_ms: delay.as_millis() as u64,
        });
    }

    fn on_retry_timer(&self, epoch: u64) {
        let mut state = self.state();
        if state.epoch != epoch {
            debug!("{} stream: stale retry timer ignored", self.stream);
            return;
        }
        state.retry.clear_pending();

        let (Some(surface), Some(url)) = (state.surface.clone(), state.source_url.clone()) else {
            return;
        };
        info!(
            "Re-attaching {} stream (attempt {}/{})",
            self.stream,
            state.retry.attempt_count(),
            state.retry.max_attempts()
        );
        self.attach_locked(&mut state, surface, url);
    }
}
