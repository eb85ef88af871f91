use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical capture feed a stream previews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Screen,
    Camera,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Screen => "screen",
            StreamKind::Camera => "camera",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback state of a single stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    /// No source attached
    Idle,
    /// Engine created, waiting for the manifest
    Attaching,
    /// Manifest parsed and playback requested
    Playing,
    /// Engine destroyed, re-attach scheduled
    Recovering,
    /// Re-attach attempts exhausted; needs an explicit attach
    Failed,
}

/// Last known result of the capture health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No probe has completed yet
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn from_probe(ok: bool) -> Self {
        if ok {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Only a confirmed unhealthy result blocks progression.
    pub fn permits_proceed(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}
