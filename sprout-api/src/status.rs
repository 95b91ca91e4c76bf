//! Device status decoding
//!
//! The status endpoint is loosely typed: any field may be missing, `null`,
//! or carry the wrong JSON type. Each field is decoded on its own so that a
//! malformed value only drops that one reading; `None` always means
//! "leave the local value unchanged this tick".

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::{ApiError, Result};

/// Format the service uses for `last_water_at`
pub const LAST_WATER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One decoded sample of the device status endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceStatus {
    /// Soil dryness from the digital soil probe (`true` = dry)
    pub soil_is_dry: Option<bool>,
    /// Ambient relative humidity in percent
    pub env_humidity_pct: Option<f64>,
    /// Ambient temperature in degrees Celsius
    pub temperature_c: Option<f64>,
    /// Raw illuminance in lux
    pub light_lux: Option<f64>,
    /// Capacitive touch pad state
    pub touch_active: Option<bool>,
    /// Seconds of pump time used today
    pub daily_elapsed_sec: Option<f64>,
    /// Time of the last accepted watering
    pub last_watered_at: Option<NaiveDateTime>,
}

impl DeviceStatus {
    /// Decode a status body
    ///
    /// Fails only when the body is not a JSON object; individual fields
    /// never fail the whole sample.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

        match value {
            Value::Object(fields) => Ok(Self::from_fields(&fields)),
            other => Err(ApiError::Decode(format!(
                "status body must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            soil_is_dry: fields.get("humidity").and_then(Value::as_bool),
            env_humidity_pct: finite_number(fields.get("env_humi")),
            temperature_c: finite_number(fields.get("temperature")),
            light_lux: finite_number(fields.get("light")).filter(|lux| *lux >= 0.0),
            touch_active: fields.get("touch").and_then(Value::as_bool),
            daily_elapsed_sec: finite_number(fields.get("daily_sec")),
            last_watered_at: fields
                .get("last_water_at")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDateTime::parse_from_str(s, LAST_WATER_FORMAT).ok()),
        }
    }
}

fn finite_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|n| n.is_finite())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
