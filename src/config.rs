use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix for environment overrides, e.g. `CAPTURE_PREVIEW__HEALTH__INTERVAL_MS=5000`
pub const ENV_PREFIX: &str = "CAPTURE_PREVIEW";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retry: RetryConfig,
    pub health: HealthConfig,
    pub stream: StreamConfig,
    pub host: HostConfig,
}

/// Backoff applied to full stream re-attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first re-attach; doubled on every further attempt
    pub base_delay_ms: u64,

    /// Re-attach attempts allowed before the stream is marked failed
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_attempts: 5,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Period of the capture health poll
    pub interval_ms: u64,

    /// A probe that has not answered within this window counts as unhealthy
    pub probe_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            probe_timeout_ms: 10_000,
        }
    }
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Path under which the recorder publishes live manifests
    pub live_prefix: String,

    /// Character substituted for non-ASCII characters in device names
    pub placeholder: char,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            live_prefix: "/recorder/live".to_string(),
            placeholder: '_',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// How long callers wait for the host API to be injected; 0 waits forever
    pub ready_timeout_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 30_000,
        }
    }
}

impl HostConfig {
    pub fn ready_timeout(&self) -> Option<Duration> {
        (self.ready_timeout_ms > 0).then(|| Duration::from_millis(self.ready_timeout_ms))
    }
}

impl Config {
    /// Load configuration from an optional file (any format `config` understands,
    /// extension omitted) layered under `CAPTURE_PREVIEW__*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
