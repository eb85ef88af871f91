use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::StreamKind;

/// Capture devices reported by the host, keyed by device index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devices {
    pub monitors: BTreeMap<u32, String>,
    pub cameras: BTreeMap<u32, String>,
}

impl Devices {
    pub fn for_kind(&self, kind: StreamKind) -> &BTreeMap<u32, String> {
        match kind {
            StreamKind::Screen => &self.monitors,
            StreamKind::Camera => &self.cameras,
        }
    }
}

/// Calls the UI can make into the host process
///
/// Every call may fail; failures are reported as `Err` and are mapped to
/// upstream or probe faults by the caller.
#[async_trait::async_trait]
pub trait HostApi: Send + Sync {
    async fn get_available_devices(&self) -> Result<Devices>;

    /// Start (or restart) the screen recorder; `false` means the host refused
    async fn start_screen_recorder(&self, index: u32, name: &str) -> Result<bool>;

    /// Start (or restart) the camera recorder; `false` means the host refused
    async fn start_camera_recorder(&self, index: u32, name: &str) -> Result<bool>;

    /// Whether capture is currently recording correctly
    async fn capture_health(&self) -> Result<bool>;

    /// Address of the exam server, if the user has logged in
    async fn get_endpoint(&self) -> Result<Option<String>>;

    /// Dispatch to the recorder matching `kind`
    async fn start_recorder(&self, kind: StreamKind, index: u32, name: &str) -> Result<bool> {
        match kind {
            StreamKind::Screen => self.start_screen_recorder(index, name).await,
            StreamKind::Camera => self.start_camera_recorder(index, name).await,
        }
    }
}
