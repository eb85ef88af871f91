//! Capture health polling
//!
//! The host can tell whether recording is actually working. The
//! [`HealthMonitor`] asks it periodically and publishes the tri-state answer;
//! progression to the exam is blocked only by a confirmed unhealthy result.

mod monitor;
mod probe;

pub use monitor::HealthMonitor;
pub use probe::{HealthProbe, HostProbe};
