use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{HealthStatus, StreamKind};

/// Capacity of the notification channel; slow receivers see `Lagged`.
pub const EVENT_CAPACITY: usize = 64;

/// Notification surfaced to the UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewEvent {
    pub at: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    StreamPlaying { stream: StreamKind },
    StreamRecovering { stream: StreamKind, attempt: u32, delay_ms: u64 },
    /// Terminal: the stream stays failed until the source is selected again
    StreamFailed { stream: StreamKind, attempts: u32 },
    SourceRejected { stream: StreamKind, reason: String },
    HealthChanged { status: HealthStatus },
}

impl PreviewEvent {
    pub fn now(payload: EventPayload) -> Self {
        Self {
            at: Utc::now(),
            payload,
        }
    }
}

/// Sender half shared by every component that notifies the UI
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<PreviewEvent>,
}

impl EventSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn emit(&self, payload: EventPayload) {
        // No receivers is fine: nobody is watching the UI yet.
        let _ = self.tx.send(PreviewEvent::now(payload));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreviewEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payloads_serialize_with_snake_case_tag() {
        let event = PreviewEvent::now(EventPayload::StreamRecovering {
            stream: StreamKind::Camera,
            attempt: 2,
            delay_ms: 2000,
        });
        let value = serde_json::to_value(&event).unwrap();

        assert!(value["at"].is_string());
        assert_eq!(value["payload"]["type"], json!("stream_recovering"));
        assert_eq!(value["payload"]["attempt"], json!(2));
        assert_eq!(value["payload"]["delay_ms"], json!(2000));
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let sink = EventSink::new();
        let mut rx = sink.subscribe();

        sink.emit(EventPayload::HealthChanged {
            status: HealthStatus::Unhealthy,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event.payload,
            EventPayload::HealthChanged {
                status: HealthStatus::Unhealthy
            }
        );
    }
}
