pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod health;
pub mod host;
pub mod playback;
pub mod stream_url;
pub mod telemetry;
pub mod types;

pub use config::Config;
pub use coordinator::{NextStage, SessionCoordinator};
pub use error::PreviewError;
pub use events::{EventPayload, EventSink, PreviewEvent};
pub use health::{HealthMonitor, HealthProbe, HostProbe};
pub use host::{Devices, HostApi, HostGate, HostProvider};
pub use playback::{
    classify, Classification, EngineError, EngineEvent, EngineFactory, EngineHandle, ErrorKind,
    MediaSurface, PlaybackEngine, RetryPolicy, StreamSession,
};
pub use stream_url::{stream_url, stream_url_with};
pub use types::{HealthStatus, StreamKind, StreamStatus};
