use super::engine::{EngineError, ErrorKind};

/// How a session should react to an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Non-fatal; the engine heals itself
    Ignored,
    /// Reset the decoder in place
    RecoverableDecode,
    /// Resume loading in place
    RecoverableNetwork,
    /// Tear the engine down and re-attach with backoff
    Fatal,
}

impl Classification {
    /// Only full re-attachment is rate limited.
    pub fn consumes_attempt(&self) -> bool {
        matches!(self, Classification::Fatal)
    }
}

pub fn classify(error: &EngineError) -> Classification {
    if !error.fatal {
        return Classification::Ignored;
    }

    match error.kind {
        ErrorKind::Media => Classification::RecoverableDecode,
        ErrorKind::Network => Classification::RecoverableNetwork,
        ErrorKind::Mux | ErrorKind::Key | ErrorKind::Other => Classification::Fatal,
    }
}
