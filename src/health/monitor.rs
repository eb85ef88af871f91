use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::probe::HealthProbe;
use crate::config::HealthConfig;
use crate::error::{PreviewError, Result};
use crate::events::{EventPayload, EventSink};
use crate::types::HealthStatus;

/// Periodic capture health poller
///
/// The last result is published on a watch channel. Results are applied in
/// the order their probes were issued, and nothing is applied once the
/// monitor has been stopped.
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    probe: Arc<dyn HealthProbe>,
    probe_timeout: Duration,
    status_tx: watch::Sender<HealthStatus>,
    events: EventSink,
    state: Mutex<PollState>,
}

#[derive(Default)]
struct PollState {
    /// Bumped by `stop()`; probes issued under an older epoch are discarded
    epoch: u64,
    stopped: bool,
    /// Sequence number of the last probe issued
    issued: u64,
    /// Sequence number of the last probe whose result was applied
    applied: u64,
    ticker: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    pub fn new(probe: Arc<dyn HealthProbe>, config: &HealthConfig, events: EventSink) -> Self {
        let (status_tx, _) = watch::channel(HealthStatus::Unknown);
        Self {
            inner: Arc::new(Inner {
                probe,
                probe_timeout: config.probe_timeout(),
                status_tx,
                events,
                state: Mutex::new(PollState::default()),
            }),
        }
    }

    /// Poll now, then every `interval` until [`HealthMonitor::stop`].
    /// Calling it again replaces the running schedule.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        let weak = Arc::downgrade(&self.inner);

        let mut state = self.inner.state();
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        state.stopped = false;

        info!("Capture health polling every {:?}", interval);
        state.ticker = Some(tokio::spawn(async move {
            loop {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.poll_once().await;
                drop(inner);
                // Interval runs from the end of the previous poll.
                tokio::time::sleep(interval).await;
            }
        }));
    }

    /// Cancel polling. Probes still in flight are discarded when they finish.
    pub fn stop(&self) {
        let mut state = self.inner.state();
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        if !state.stopped {
            debug!("Capture health polling stopped");
        }
        state.stopped = true;
        state.epoch += 1;
    }

    /// Probe once and publish the result. Never fails: a probe error is
    /// logged and recorded as unhealthy, while a probe that never became
    /// ready leaves the status untouched.
    pub async fn poll_once(&self) {
        self.inner.poll_once().await;
    }

    /// Probe once, publish the result, and report it to the caller
    pub async fn check(&self) -> Result<bool> {
        self.inner.check().await
    }

    pub fn status(&self) -> HealthStatus {
        *self.inner.status_tx.borrow()
    }

    /// Unknown and healthy both allow proceeding; only a confirmed
    /// unhealthy result blocks.
    pub fn can_proceed(&self) -> bool {
        self.status().permits_proceed()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthStatus> {
        self.inner.status_tx.subscribe()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn poll_once(&self) {
        let _ = self.check().await;
    }

    async fn check(&self) -> Result<bool> {
        // Not knowing yet is not the same as unhealthy.
        if let Err(e) = self.probe.ready().await {
            warn!("Capture health unknown: {}", e);
            return Err(e);
        }

        let (epoch, seq) = {
            let mut state = self.state();
            state.issued += 1;
            (state.epoch, state.issued)
        };

        let outcome = match tokio::time::timeout(self.probe_timeout, self.probe.check()).await {
            Ok(Ok(ok)) => Ok(ok),
            Ok(Err(e)) => Err(PreviewError::Probe(format!("{:#}", e))),
            Err(_) => Err(PreviewError::Probe(format!(
                "no answer within {:?}",
                self.probe_timeout
            ))),
        };

        let status = match &outcome {
            Ok(ok) => HealthStatus::from_probe(*ok),
            Err(e) => {
                error!("{}", e);
                HealthStatus::Unhealthy
            }
        };
        self.publish(epoch, seq, status);

        outcome
    }

    fn publish(&self, epoch: u64, seq: u64, status: HealthStatus) {
        let mut state = self.state();
        if state.stopped || state.epoch != epoch {
            debug!("Discarding health result {:?} from a stopped poll", status);
            return;
        }
        if seq < state.applied {
            debug!("Discarding out-of-order health result {:?}", status);
            return;
        }
        state.applied = seq;

        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if changed {
            info!("Capture health: {:?}", status);
            self.events.emit(EventPayload::HealthChanged { status });
        }
    }
}
