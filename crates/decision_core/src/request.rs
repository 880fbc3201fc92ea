//! Trip request payload parsed from a loosely-typed JSON object.
//!
//! Numeric fields are coerced the way the upstream booking backend sends
//! them: numbers or numeric strings. Anything else is rejected here, at the
//! boundary, instead of deep inside feature encoding.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_SEATS: i64 = 1;
pub const DEFAULT_TIME_EPOCH: i64 = 1_738_123_456;
pub const DEFAULT_DISTANCE_KM: f64 = 10.0;
pub const DEFAULT_DURATION_MIN: f64 = 20.0;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("request must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("could not convert field '{field}' to a number: {value}")]
    InvalidNumber { field: &'static str, value: String },
}

/// A trip request with every recognized field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripRequest {
    pub seats: Option<i64>,
    pub time_epoch: Option<i64>,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
}

impl TripRequest {
    pub fn from_json_str(raw: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(raw).map_err(RequestError::InvalidJson)?;
        Self::from_value(&value)
    }

    /// Build from an already-parsed JSON value. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let object = value
            .as_object()
            .ok_or_else(|| RequestError::NotAnObject(json_type_name(value)))?;

        Ok(Self {
            seats: int_field(object, "seats")?,
            time_epoch: int_field(object, "time_epoch")?,
            distance_km: float_field(object, "distance_km")?,
            duration_min: float_field(object, "duration_min")?,
        })
    }

    pub fn seats(&self) -> i64 {
        self.seats.unwrap_or(DEFAULT_SEATS)
    }

    pub fn time_epoch(&self) -> i64 {
        self.time_epoch.unwrap_or(DEFAULT_TIME_EPOCH)
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km.unwrap_or(DEFAULT_DISTANCE_KM)
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min.unwrap_or(DEFAULT_DURATION_MIN)
    }

    pub fn with_seats(mut self, seats: i64) -> Self {
        self.seats = Some(seats);
        self
    }

    pub fn with_time_epoch(mut self, time_epoch: i64) -> Self {
        self.time_epoch = Some(time_epoch);
        self
    }

    pub fn with_distance_km(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(distance_km);
        self
    }

    pub fn with_duration_min(mut self, duration_min: f64) -> Self {
        self.duration_min = Some(duration_min);
        self
    }
}

fn float_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, RequestError> {
    let Some(value) = object.get(field) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(field, value))
}

fn int_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, RequestError> {
    let Some(value) = object.get(field) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(field, value))
}

fn invalid(field: &'static str, value: &Value) -> RequestError {
    RequestError::InvalidNumber {
        field,
        value: value.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
