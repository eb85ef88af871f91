//! Live stream playback with failure recovery
//!
//! This module provides the per-stream machinery:
//! - `engine`: traits the UI implements for its segmented-media player
//! - `classify`: maps engine errors onto recovery strategies
//! - `retry`: bounded exponential backoff for full re-attachment
//! - `session`: the attach/error/recover state machine for one stream

pub mod classify;
pub mod engine;
pub mod retry;
mod session;

pub use classify::{classify, Classification};
pub use engine::{
    EngineError, EngineEvent, EngineFactory, EngineHandle, ErrorKind, MediaSurface, PlaybackEngine,
};
pub use retry::RetryPolicy;
pub use session::StreamSession;
