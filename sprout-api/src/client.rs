//! HTTP client for the device service
//!
//! Endpoints:
//!
//! ```text
//! GET  {base}/status                    unauthenticated, polled
//! POST {base}/water          sec=<n>    x-api-key
//! POST {base}/camera/capture            x-api-key
//! GET  {base}/camera/health             unauthenticated
//! GET  {base}/camera/stream?api_key=..  live preview (used by the UI directly)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::error::CODE_COOLDOWN;
use crate::service::PlantService;
use crate::status::DeviceStatus;
use crate::{ApiError, ClientConfig, Result};

const API_KEY_HEADER: &str = "x-api-key";

/// Result of a watering request the service did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum WaterOutcome {
    /// The pump ran
    Accepted(WaterReceipt),
    /// The service is still inside its cooldown and did nothing
    CoolingDown,
}

/// Details returned with an accepted watering request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterReceipt {
    /// Seconds of pump time used today, after this request
    pub daily_elapsed_sec: Option<f64>,
    /// Human-readable message from the service
    pub message: Option<String>,
}

/// A photo the device captured, resolved against the base address
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    /// Absolute URL of the image
    pub url: Url,
    /// The device could not reach its camera and served a placeholder
    pub placeholder: bool,
    /// Camera error reported alongside a placeholder
    pub device_error: Option<String>,
}

/// Camera diagnostics reported by `/camera/health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CameraHealth {
    pub api_key_set: bool,
    pub picamera2_import: bool,
    pub singleton_initialized: bool,
    pub photos_dir_writable: bool,
}

/// Common shape of action responses; every field is optional because error
/// bodies are not guaranteed to be JSON at all
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActionBody {
    ok: Option<bool>,
    error: Option<String>,
    message: Option<String>,
    url: Option<String>,
    placeholder: Option<bool>,
    daily_sec: Option<f64>,
}

impl ActionBody {
    fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    fn refused(&self) -> bool {
        self.ok == Some(false)
    }
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    #[serde(default)]
    camera: CameraHealth,
}

/// Client for the device service
#[derive(Debug, Clone)]
pub struct PlantClient {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
}

impl PlantClient {
    /// Build a client from configuration
    ///
    /// Returns [`ApiError::NotConfigured`] when no base address is set. A
    /// missing access key is allowed: status polling still works, actions do
    /// not.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = config
            .base_url()
            .ok_or(ApiError::NotConfigured("service base address"))?;

        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            api_key: config.api_key().map(str::to_string),
        })
    }

    /// The normalised base address (always ends in `/`)
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Whether an access key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch and decode the current device status
    pub async fn status(&self) -> Result<DeviceStatus> {
        let response = self
            .http
            .get(self.endpoint("status")?)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                code: ActionBody::parse(&text).error,
            });
        }

        DeviceStatus::from_json(&text)
    }

    /// Ask the device to run the pump for `duration`
    pub async fn water(&self, duration: Duration) -> Result<WaterOutcome> {
        let key = self.require_key()?;
        let seconds = duration.as_secs_f64().to_string();

        let response = self
            .http
            .post(self.endpoint("water")?)
            .header(API_KEY_HEADER, key)
            .form(&[("sec", seconds.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = ActionBody::parse(&response.text().await?);

        if status == StatusCode::TOO_MANY_REQUESTS && body.error.as_deref() == Some(CODE_COOLDOWN)
        {
            tracing::debug!("Watering refused by device cooldown");
            return Ok(WaterOutcome::CoolingDown);
        }

        if !status.is_success() || body.refused() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                code: body.error,
            });
        }

        Ok(WaterOutcome::Accepted(WaterReceipt {
            daily_elapsed_sec: body.daily_sec,
            message: body.message,
        }))
    }

    /// Ask the device to capture a photo
    pub async fn capture(&self) -> Result<CapturedPhoto> {
        let key = self.require_key()?;

        let response = self
            .http
            .post(self.endpoint("camera/capture")?)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        let status = response.status();
        let body = ActionBody::parse(&response.text().await?);

        if !status.is_success() || body.refused() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                code: body.error,
            });
        }

        let path = body
            .url
            .ok_or_else(|| ApiError::Decode("capture response has no url".to_string()))?;
        let placeholder = body.placeholder.unwrap_or(false);

        Ok(CapturedPhoto {
            url: self.resolve(&path)?,
            placeholder,
            device_error: if placeholder { body.error } else { None },
        })
    }

    /// Fetch camera diagnostics
    pub async fn camera_health(&self) -> Result<CameraHealth> {
        let response = self.http.get(self.endpoint("camera/health")?).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                code: ActionBody::parse(&text).error,
            });
        }

        let body: HealthBody =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.camera)
    }

    /// URL of the live camera preview, if an access key is configured
    pub fn preview_url(&self) -> Option<Url> {
        let key = self.api_key.as_deref()?;
        let mut url = self.endpoint("camera/stream").ok()?;
        url.query_pairs_mut().append_pair("api_key", key);
        Some(url)
    }

    /// Resolve a path returned by the service into an absolute URL
    ///
    /// Paths are appended to the base address (keeping any base path
    /// prefix); absolute URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn require_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(ApiError::NotConfigured("access key"))
    }
}

#[async_trait]
impl PlantService for PlantClient {
    async fn status(&self) -> Result<DeviceStatus> {
        PlantClient::status(self).await
    }

    async fn water(&self, duration: Duration) -> Result<WaterOutcome> {
        PlantClient::water(self, duration).await
    }

    async fn capture(&self) -> Result<CapturedPhoto> {
        PlantClient::capture(self).await
    }

    fn actions_enabled(&self) -> bool {
        self.has_api_key()
    }

    fn preview_url(&self) -> Option<Url> {
        PlantClient::preview_url(self)
    }
}
