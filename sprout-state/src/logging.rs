//! Logging setup for sprout applications
//!
//! The engine and the session only emit `tracing` events. Applications pick
//! how (and whether) they are printed by calling one of the initializers
//! here once at startup. The default is silent so a full-screen UI is never
//! interleaved with log lines.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Selects the log mode in [`init_logging_from_env`]
pub const ENV_LOG_MODE: &str = "SPROUT_LOG_MODE";

/// Overrides the filter directive (falls back to `RUST_LOG`)
pub const ENV_LOG_LEVEL: &str = "SPROUT_LOG_LEVEL";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber is installed
    Silent,
    /// Compact stderr output at `info`
    Development,
    /// Pretty output at `debug` with source locations and thread ids
    Debug,
}

impl LoggingMode {
    /// Parse a mode name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(LoggingMode::Silent),
            "development" | "dev" => Some(LoggingMode::Development),
            "debug" => Some(LoggingMode::Debug),
            _ => None,
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid filter directive in {var}: {reason}")]
    InvalidFilter { var: &'static str, reason: String },
}

/// Initialize logging with the specified mode
///
/// Call once, before starting a session. A second call fails with
/// [`LoggingError::TracingInit`] because a global subscriber is already set.
///
/// ```rust,ignore
/// sprout_state::logging::init_logging(LoggingMode::Development)?;
/// ```
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from `SPROUT_LOG_MODE`
///
/// Accepts `silent`, `development` (or `dev`) and `debug`. Anything else,
/// including an unset variable, means silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var(ENV_LOG_MODE)
        .ok()
        .and_then(|name| LoggingMode::from_name(&name))
        .unwrap_or(LoggingMode::Silent);

    init_logging(mode)
}

/// `SPROUT_LOG_LEVEL`, then `RUST_LOG`, then `default_level`
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    for var in [ENV_LOG_LEVEL, "RUST_LOG"] {
        if let Ok(directive) = std::env::var(var) {
            return EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
                var,
                reason: e.to_string(),
            });
        }
    }

    Ok(EnvFilter::new(default_level))
}

/// Whether a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
