//! Error types for the device service client

use thiserror::Error;

/// Rejection code the service uses while the pump is cooling down
pub const CODE_COOLDOWN: &str = "cooldown";

/// Rejection code the service uses once the daily watering budget is spent
pub const CODE_DAILY_LIMIT: &str = "daily_limit";

/// Rejection code the service uses for a missing or wrong access key
pub const CODE_UNAUTHORIZED: &str = "unauthorized";

/// Errors that can occur while talking to the device service
///
/// A watering request that lands inside the device cooldown is *not* an
/// error; it is reported as [`crate::WaterOutcome::CoolingDown`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or HTTP transport failure (connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered, but the body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The service refused the request
    ///
    /// `code` carries the service's `error` field when one was present
    /// (for example `daily_limit` or `unauthorized`).
    #[error("Request rejected (HTTP {status}): {}", code.as_deref().unwrap_or("no reason given"))]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Machine-readable rejection code
        code: Option<String>,
    },

    /// A URL could not be built from the configured base address
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Base address or access key is missing for this request
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),
}

impl ApiError {
    /// True when the service refused because the daily watering budget is spent
    pub fn is_daily_limit(&self) -> bool {
        matches!(self, ApiError::Rejected { code: Some(code), .. } if code == CODE_DAILY_LIMIT)
    }

    /// True when the service refused the access key
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::Rejected { status, code } => {
                *status == 401 || code.as_deref() == Some(CODE_UNAUTHORIZED)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
