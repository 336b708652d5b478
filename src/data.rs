//! Raw payload values handed out by table sources and accepted as edit input.
//!
//! A [`RawValue`] is whatever the source snapshot (or the user) produced before
//! any column kind looked at it. Column kinds coerce it into a
//! [`Cell`](crate::cell::Cell); nothing in this module decides validity.

use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    BigInt(i128),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    List(Vec<RawValue>),
    Json(JsonValue),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// JSON rendition used for stringification and option matching.
    ///
    /// Big integers outside the `i64`/`u64` range degrade to floats, the same
    /// lossy widening a JSON consumer would apply.
    pub fn to_json(&self) -> JsonValue {
        match self {
            RawValue::Null => JsonValue::Null,
            RawValue::Bool(b) => JsonValue::Bool(*b),
            RawValue::Int(i) => JsonValue::from(*i),
            RawValue::UInt(u) => JsonValue::from(*u),
            RawValue::BigInt(big) => {
                if let Ok(small) = i64::try_from(*big) {
                    JsonValue::from(small)
                } else if let Ok(unsigned) = u64::try_from(*big) {
                    JsonValue::from(unsigned)
                } else {
                    float_to_json(*big as f64)
                }
            }
            RawValue::Float(f) => float_to_json(*f),
            RawValue::Decimal(d) => d.to_f64().map(float_to_json).unwrap_or(JsonValue::Null),
            RawValue::Text(s) => JsonValue::String(s.clone()),
            RawValue::Bytes(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
            RawValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            RawValue::Time(t) => JsonValue::String(t.format("%H:%M:%S%.f").to_string()),
            RawValue::DateTime(dt) => {
                JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            RawValue::DateTimeTz(dt) => {
                JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
            RawValue::List(items) => JsonValue::Array(items.iter().map(RawValue::to_json).collect()),
            RawValue::Json(value) => value.clone(),
        }
    }
}

fn float_to_json(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

impl From<JsonValue> for RawValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => RawValue::Null,
            JsonValue::Bool(b) => RawValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    RawValue::UInt(u)
                } else {
                    RawValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => RawValue::Text(s),
            JsonValue::Array(items) => {
                RawValue::List(items.into_iter().map(RawValue::from).collect())
            }
            other @ JsonValue::Object(_) => RawValue::Json(other),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::coerce::to_safe_string(self))
    }
}

/// Renders a float the way a JSON/JavaScript consumer prints it: integral
/// values without a fractional part.
pub fn format_plain_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

pub fn parse_naive_time(value: &str) -> Result<NaiveTime> {
    const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
    for fmt in TIME_FORMATS {
        if let Ok(parsed) = NaiveTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as time"))
}

/// Parses an offset-aware timestamp such as `2024-05-06T14:30:00+02:00`.
pub fn parse_offset_datetime(value: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed);
    }
    const OFFSET_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as an offset datetime"))
}
