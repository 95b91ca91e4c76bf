//! Service seam between the session engine and the network

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{CapturedPhoto, DeviceStatus, Result, WaterOutcome};

/// Operations the session needs from the device service
///
/// [`crate::PlantClient`] is the HTTP implementation. Tests and offline
/// front-ends can provide their own.
#[async_trait]
pub trait PlantService: Send + Sync {
    /// Fetch one status sample
    async fn status(&self) -> Result<DeviceStatus>;

    /// Request a watering pulse of `duration`
    async fn water(&self, duration: Duration) -> Result<WaterOutcome>;

    /// Request a photo capture
    async fn capture(&self) -> Result<CapturedPhoto>;

    /// Whether authenticated actions (watering, capture) can be issued
    fn actions_enabled(&self) -> bool;

    /// Live preview URL, when the service exposes one
    fn preview_url(&self) -> Option<Url> {
        None
    }
}
