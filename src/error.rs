//! Fault taxonomy for the preview subsystem.
//!
//! Collaborators (host API, playback engine, probes) report failures as
//! `anyhow::Error`; they are folded into [`PreviewError`] where they cross
//! into this crate. No variant is ever allowed to take the process down:
//! each one ends up as a status value, an event, or an `Err` for the UI.

use crate::types::StreamKind;

pub type Result<T, E = PreviewError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// Decode or network fault the engine recovers from in place.
    #[error("transient media fault on {stream} stream: {details}")]
    TransientMedia { stream: StreamKind, details: String },

    /// Fatal engine fault that exhausted every re-attach attempt.
    #[error("{stream} stream failed after {attempts} re-attach attempts")]
    Attachment { stream: StreamKind, attempts: u32 },

    /// The playback engine could not be created for a source.
    #[error("failed to create playback engine for {url}: {source}")]
    Engine {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The capture health probe failed or timed out.
    #[error("capture health probe failed: {0}")]
    Probe(String),

    /// Starting the recorder on the host failed or was refused.
    #[error("failed to start {stream} recorder: {reason}")]
    Upstream { stream: StreamKind, reason: String },

    /// The host could not enumerate capture devices.
    #[error("failed to list capture devices: {0}")]
    Devices(String),

    /// The probe answered, and capture is not running correctly.
    #[error("capture is not healthy")]
    CaptureUnhealthy,

    /// The host has no exam endpoint to hand over to.
    #[error("host did not provide an exam endpoint")]
    NoEndpoint,

    /// The host API was not injected in time.
    #[error("host API not available after {waited_ms}ms")]
    HostUnavailable { waited_ms: u64 },

    /// The coordinator has already been shut down.
    #[error("preview coordinator is shut down")]
    ShutDown,
}
