use std::fmt;

use sprout_api::ApiError;
use sprout_state::ActionRefused;
use thiserror::Error;

/// Networked feature that can be switched off by missing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Polling,
    Watering,
    Capture,
    Preview,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Polling => "status polling",
            Feature::Watering => "watering",
            Feature::Capture => "photo capture",
            Feature::Preview => "live preview",
        };
        f.write_str(name)
    }
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("No tokio runtime available: {0}")]
    Runtime(String),

    #[error("Session has been shut down")]
    Shutdown,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Errors returned by user actions
///
/// None of these are fatal: the session stays usable and, apart from a
/// surfaced failure, its state is left as it was before the call.
#[derive(Error, Debug)]
pub enum ActionError {
    /// Base address or access key missing; the feature is permanently off
    #[error("{0} is not configured")]
    NotConfigured(Feature),

    #[error("Watering is cooling down ({remaining_secs}s left)")]
    CoolingDown { remaining_secs: u32 },

    #[error("Watering already in progress")]
    WateringInFlight,

    #[error("Camera is busy")]
    CameraBusy,

    #[error("Session has been shut down")]
    Shutdown,

    #[error("Device request failed: {0}")]
    Api(#[from] ApiError),
}

impl From<ActionRefused> for ActionError {
    fn from(refused: ActionRefused) -> Self {
        match refused {
            ActionRefused::CoolingDown { remaining_secs } => {
                ActionError::CoolingDown { remaining_secs }
            }
            ActionRefused::WateringInFlight => ActionError::WateringInFlight,
            ActionRefused::CameraBusy => ActionError::CameraBusy,
        }
    }
}
