//! # sprout-api
//!
//! Typed client for the plant-care device service.
//!
//! The device exposes a small HTTP API: a status endpoint that is polled
//! continuously, and two authenticated actions (watering and photo
//! capture). This crate turns the loosely typed JSON into strict Rust types
//! and maps the service's rejection codes onto [`WaterOutcome`] and
//! [`ApiError`].
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sprout_api::{ClientConfig, PlantClient, WaterOutcome};
//!
//! # async fn run() -> Result<(), sprout_api::ApiError> {
//! let client = PlantClient::new(&ClientConfig::from_env())?;
//!
//! let status = client.status().await?;
//! println!("soil dry: {:?}", status.soil_is_dry);
//!
//! match client.water(Duration::from_secs(2)).await? {
//!     WaterOutcome::Accepted(receipt) => println!("watered: {:?}", receipt.message),
//!     WaterOutcome::CoolingDown => println!("device is cooling down"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod service;
mod status;

pub use client::{CameraHealth, CapturedPhoto, PlantClient, WaterOutcome, WaterReceipt};
pub use config::{ClientConfig, ENV_API_BASE, ENV_API_KEY};
pub use error::{ApiError, Result, CODE_COOLDOWN, CODE_DAILY_LIMIT, CODE_UNAUTHORIZED};
pub use service::PlantService;
pub use status::{DeviceStatus, LAST_WATER_FORMAT};

pub use url::Url;
