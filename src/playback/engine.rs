use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Category reported by the playback engine alongside an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Decoding or media buffer failure
    Media,
    /// Manifest or segment fetch failure
    Network,
    /// Container demux failure
    Mux,
    /// Key system / decryption failure
    Key,
    Other,
}

/// Error event emitted by the playback engine
#[derive(Debug, Clone)]
pub struct EngineError {
    pub kind: ErrorKind,
    /// Non-fatal errors are handled inside the engine itself
    pub fatal: bool,
    pub details: String,
}

impl EngineError {
    pub fn fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: true,
            details: details.into(),
        }
    }

    pub fn non_fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: false,
            details: details.into(),
        }
    }
}

/// Lifecycle events delivered from an engine to its owning session
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The manifest was fetched and parsed; playback can start
    ManifestParsed,
    Error(EngineError),
}

/// One live instance of the segmented-media player
///
/// Implementations are bound to a single source and surface for their whole
/// life; sessions replace the engine rather than re-pointing it.
pub trait PlaybackEngine: Send {
    /// Reset the decoder in place after a media error
    fn recover_media_error(&mut self) -> Result<()>;

    /// Resume the fetch pipeline in place after a network error
    fn start_load(&mut self) -> Result<()>;

    /// Release the engine. Must tolerate being called more than once.
    fn destroy(&mut self);
}

/// A display surface (video element) the stream renders into
#[async_trait::async_trait]
pub trait MediaSurface: Send + Sync {
    fn id(&self) -> &str;

    /// Point the surface's native player straight at `url`
    fn set_source(&self, url: &str);

    /// Request playback; may be rejected, e.g. by autoplay policy
    async fn play(&self) -> Result<()>;
}

/// A freshly created engine and the receiver for its events
pub struct EngineHandle {
    pub engine: Box<dyn PlaybackEngine>,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
}

/// Creates playback engines
pub trait EngineFactory: Send + Sync {
    /// Whether the runtime supports the engine at all. When it does not,
    /// sessions fall back to the surface's native playback.
    fn is_supported(&self) -> bool;

    /// Create an engine loading `url` and attached to `surface`
    fn create(&self, url: &str, surface: Arc<dyn MediaSurface>) -> Result<EngineHandle>;
}
