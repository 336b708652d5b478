//! Lenient conversions from [`RawValue`] into the primitive shapes column kinds
//! work with.
//!
//! Every function here is pure. Absent input (`Null`, empty text) maps to
//! `Ok(None)` or an empty collection; input that cannot be interpreted maps to
//! a [`CellError`] which callers turn into an error cell.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;

use crate::cell::{CellError, Timestamp};
use crate::data::{
    RawValue, format_plain_number, parse_naive_date, parse_naive_datetime, parse_naive_time,
    parse_offset_datetime,
};

/// Largest integer a number column represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

const TRUE_WORDS: &[&str] = &["true", "t", "yes", "y", "on", "1"];
const FALSE_WORDS: &[&str] = &["false", "f", "no", "n", "off", "0"];
const CURRENCY_PREFIXES: &[char] = &['$', '€', '£', '¥'];

pub fn is_missing(value: &RawValue) -> bool {
    match value {
        RawValue::Null => true,
        RawValue::Text(text) => text.is_empty(),
        RawValue::Float(f) => f.is_nan(),
        RawValue::Json(JsonValue::Null) => true,
        _ => false,
    }
}

pub fn to_safe_string(value: &RawValue) -> String {
    match value {
        RawValue::Null => String::new(),
        RawValue::Text(text) => text.clone(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Int(i) => i.to_string(),
        RawValue::UInt(u) => u.to_string(),
        RawValue::BigInt(big) => big.to_string(),
        RawValue::Float(f) => format_plain_number(*f),
        RawValue::Decimal(d) => d.normalize().to_string(),
        RawValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        RawValue::Json(JsonValue::String(text)) => text.clone(),
        other => json_display(&other.to_json()),
    }
}

/// Stringifies a JSON value the way a cell shows it: strings unquoted, null
/// empty, everything else in compact JSON.
pub fn json_display(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text.clone(),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_plain_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// JSON number for a float; integral values within the safe range are
/// emitted as integers.
pub fn json_number(value: f64) -> JsonValue {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER as f64 {
        JsonValue::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

pub fn to_safe_number(value: &RawValue) -> Result<Option<f64>, CellError> {
    let not_a_number = || CellError::NotANumber {
        input: to_safe_string(value),
    };
    match value {
        RawValue::Null => Ok(None),
        RawValue::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        RawValue::Int(i) => Ok(Some(*i as f64)),
        RawValue::UInt(u) => Ok(Some(*u as f64)),
        RawValue::BigInt(big) => Ok(Some(*big as f64)),
        RawValue::Float(f) if f.is_nan() => Ok(None),
        RawValue::Float(f) if f.is_infinite() => Err(not_a_number()),
        RawValue::Float(f) => Ok(Some(*f)),
        RawValue::Decimal(d) => d.to_f64().map(Some).ok_or_else(not_a_number),
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            parse_number_text(trimmed).map(Some).ok_or_else(not_a_number)
        }
        RawValue::Date(d) => Ok(Some(epoch_millis(d.and_time(NaiveTime::MIN)) as f64)),
        RawValue::DateTime(dt) => Ok(Some(epoch_millis(*dt) as f64)),
        RawValue::DateTimeTz(dt) => Ok(Some(dt.timestamp_millis() as f64)),
        RawValue::Time(t) => Ok(Some(
            f64::from(t.num_seconds_from_midnight()) * 1000.0 + f64::from(t.nanosecond() / 1_000_000),
        )),
        RawValue::Json(json @ (JsonValue::Number(_) | JsonValue::String(_) | JsonValue::Bool(_))) => {
            to_safe_number(&RawValue::from(json.clone()))
        }
        RawValue::Json(JsonValue::Null) => Ok(None),
        RawValue::List(_) | RawValue::Bytes(_) | RawValue::Json(_) => Err(not_a_number()),
    }
}

fn epoch_millis(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

/// Parses human-entered numbers: `1,212.12`, `$-5`, `12.5%`, `3.2k`, `-1.5M`.
fn parse_number_text(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let mut rest = cleaned.trim();
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped.trim_start();
    }
    if let Some(stripped) = rest.strip_prefix(CURRENCY_PREFIXES) {
        rest = stripped.trim_start();
        if !negative && let Some(stripped) = rest.strip_prefix('-') {
            negative = true;
            rest = stripped.trim_start();
        }
    }

    let mut scale = 1.0;
    if let Some(stripped) = rest.strip_suffix('%') {
        scale = 0.01;
        rest = stripped.trim_end();
    } else if let Some(last) = rest.chars().last() {
        let magnitude = match last.to_ascii_lowercase() {
            'k' => Some(1e3),
            'm' => Some(1e6),
            'b' => Some(1e9),
            't' => Some(1e12),
            _ => None,
        };
        if let Some(magnitude) = magnitude {
            scale = magnitude;
            rest = rest[..rest.len() - last.len_utf8()].trim_end();
        }
    }

    if rest.is_empty() || !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '+') {
        return None;
    }
    let parsed: f64 = rest.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    let value = if scale == 0.01 {
        parsed / 100.0
    } else {
        parsed * scale
    };
    Some(if negative { -value } else { value })
}

pub fn to_safe_boolean(value: &RawValue) -> Result<Option<bool>, CellError> {
    let not_a_boolean = || CellError::NotABoolean {
        input: to_safe_string(value),
    };
    match value {
        RawValue::Null => Ok(None),
        RawValue::Bool(b) => Ok(Some(*b)),
        RawValue::Float(f) if f.is_nan() => Ok(None),
        RawValue::Int(_)
        | RawValue::UInt(_)
        | RawValue::BigInt(_)
        | RawValue::Float(_)
        | RawValue::Decimal(_) => match to_safe_number(value)? {
            Some(n) if n == 1.0 => Ok(Some(true)),
            Some(n) if n == 0.0 => Ok(Some(false)),
            _ => Err(not_a_boolean()),
        },
        RawValue::Text(text) => {
            let normalized = text.trim().to_ascii_lowercase();
            if normalized.is_empty() {
                Ok(None)
            } else if TRUE_WORDS.contains(&normalized.as_str()) {
                Ok(Some(true))
            } else if FALSE_WORDS.contains(&normalized.as_str()) {
                Ok(Some(false))
            } else {
                Err(not_a_boolean())
            }
        }
        RawValue::Json(JsonValue::Null) => Ok(None),
        RawValue::Json(json @ (JsonValue::Bool(_) | JsonValue::String(_) | JsonValue::Number(_))) => {
            to_safe_boolean(&RawValue::from(json.clone()))
        }
        _ => Err(not_a_boolean()),
    }
}

/// Normalizes a value into a sequence: native lists pass through, `[..]` text
/// is read as JSON, other text splits on commas, anything else wraps.
pub fn to_safe_array(value: &RawValue) -> Vec<JsonValue> {
    match value {
        RawValue::Null => Vec::new(),
        RawValue::List(items) => items.iter().map(RawValue::to_json).collect(),
        RawValue::Json(JsonValue::Array(items)) => items.clone(),
        RawValue::Json(JsonValue::Null) => Vec::new(),
        RawValue::Text(text) => split_text_array(text),
        RawValue::Json(JsonValue::String(text)) => split_text_array(text),
        other => vec![other.to_json()],
    }
}

fn split_text_array(text: &str) -> Vec<JsonValue> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return match serde_json::from_str::<JsonValue>(trimmed) {
            Ok(JsonValue::Array(items)) => items,
            _ => vec![JsonValue::String(text.to_string())],
        };
    }
    trimmed
        .split(',')
        .map(|part| JsonValue::String(part.trim().to_string()))
        .collect()
}

/// Interprets a value as an instant. `kind` names the target in error text.
///
/// Numbers are unix timestamps whose unit is inferred from magnitude:
/// seconds, then milliseconds from 1e12, microseconds from 1e15 and
/// nanoseconds from 1e18.
pub fn to_safe_date(value: &RawValue, kind: &'static str) -> Result<Option<Timestamp>, CellError> {
    let not_temporal = || CellError::NotATemporal {
        input: to_safe_string(value),
        kind,
    };
    match value {
        RawValue::Null => Ok(None),
        RawValue::Float(f) if f.is_nan() => Ok(None),
        RawValue::Date(d) => Ok(Some(Timestamp::new(d.and_time(NaiveTime::MIN), None))),
        RawValue::Time(t) => Ok(Some(Timestamp::new(epoch_date().and_time(*t), None))),
        RawValue::DateTime(dt) => Ok(Some(Timestamp::new(*dt, None))),
        RawValue::DateTimeTz(dt) => Ok(Some(Timestamp::new(dt.naive_utc(), Some(*dt.offset())))),
        RawValue::Int(i) => from_epoch_integer(i128::from(*i)).map(Some).ok_or_else(not_temporal),
        RawValue::UInt(u) => from_epoch_integer(i128::from(*u)).map(Some).ok_or_else(not_temporal),
        RawValue::BigInt(big) => from_epoch_integer(*big).map(Some).ok_or_else(not_temporal),
        RawValue::Float(_) | RawValue::Decimal(_) => match to_safe_number(value) {
            Ok(Some(f)) => from_epoch_float(f).map(Some).ok_or_else(not_temporal),
            _ => Err(not_temporal()),
        },
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            parse_temporal_text(trimmed).map(Some).ok_or_else(not_temporal)
        }
        RawValue::Json(JsonValue::Null) => Ok(None),
        RawValue::Json(json @ (JsonValue::String(_) | JsonValue::Number(_))) => {
            to_safe_date(&RawValue::from(json.clone()), kind)
        }
        RawValue::Bool(_) | RawValue::Bytes(_) | RawValue::List(_) | RawValue::Json(_) => {
            Err(not_temporal())
        }
    }
}

fn epoch_date() -> NaiveDate {
    DateTime::UNIX_EPOCH.date_naive()
}

fn from_epoch_integer(value: i128) -> Option<Timestamp> {
    let magnitude = value.unsigned_abs();
    let nanos = if magnitude >= 1_000_000_000_000_000_000 {
        value
    } else if magnitude >= 1_000_000_000_000_000 {
        value.checked_mul(1_000)?
    } else if magnitude >= 1_000_000_000_000 {
        value.checked_mul(1_000_000)?
    } else {
        value.checked_mul(1_000_000_000)?
    };
    let secs = i64::try_from(nanos.div_euclid(1_000_000_000)).ok()?;
    let subsec = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
    DateTime::from_timestamp(secs, subsec).map(|dt| Timestamp::new(dt.naive_utc(), None))
}

fn from_epoch_float(value: f64) -> Option<Timestamp> {
    if !value.is_finite() {
        return None;
    }
    let magnitude = value.abs();
    let millis = if magnitude >= 1e18 {
        value / 1e6
    } else if magnitude >= 1e15 {
        value / 1e3
    } else if magnitude >= 1e12 {
        value
    } else {
        value * 1e3
    };
    let micros = (millis * 1e3).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64).map(|dt| Timestamp::new(dt.naive_utc(), None))
}

fn parse_temporal_text(text: &str) -> Option<Timestamp> {
    if let Some(number) = parse_number_text(text)
        && text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return from_epoch_float(number);
    }
    if let Ok(dt) = parse_offset_datetime(text) {
        return Some(Timestamp::new(dt.naive_utc(), Some(*dt.offset())));
    }
    if let Some(naive) = text.strip_suffix('Z').and_then(|t| parse_naive_datetime(t).ok()) {
        return Some(Timestamp::new(naive, FixedOffset::east_opt(0)));
    }
    if let Ok(naive) = parse_naive_datetime(text) {
        return Some(Timestamp::new(naive, None));
    }
    if let Ok(date) = parse_naive_date(text) {
        return Some(Timestamp::new(date.and_time(NaiveTime::MIN), None));
    }
    if let Ok(time) = parse_naive_time(text) {
        return Some(Timestamp::new(epoch_date().and_time(time), None));
    }
    None
}

/// Resolves a timezone name into a fixed offset. Accepts `UTC`, `GMT`, `Z`,
/// `Etc/UTC` and numeric offsets (`+02:00`, `-0530`, `UTC+01`). Named regions
/// such as `Europe/Berlin` are not resolvable without a tz database.
pub fn parse_timezone(name: &str) -> Option<FixedOffset> {
    let trimmed = name.trim();
    let upper = trimmed.to_ascii_uppercase();
    if matches!(upper.as_str(), "UTC" | "GMT" | "Z" | "ETC/UTC" | "ETC/GMT" | "UCT") {
        return FixedOffset::east_opt(0);
    }
    let offset = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper);
    parse_offset(offset)
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, digits) = match text.chars().next()? {
        '+' => (1, &text[1..]),
        '-' => (-1, &text[1..]),
        _ => return None,
    };
    if !digits.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }
    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    if hours.is_empty() || !hours.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Number of digits after the decimal point in the shortest rendition.
pub fn count_decimals(value: f64) -> usize {
    if !value.is_finite() || value.fract() == 0.0 {
        return 0;
    }
    let rendered = value.to_string();
    rendered
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}

/// Truncates toward zero, never rounding up.
pub fn truncate_decimals(value: f64, decimals: usize) -> f64 {
    let Ok(dp) = u32::try_from(decimals) else {
        return value;
    };
    if let Some(exact) = Decimal::from_f64(value)
        && dp <= 28
        && let Some(truncated) = exact
            .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
            .to_f64()
    {
        return truncated;
    }
    let factor = 10f64.powi(dp.min(300) as i32);
    (value * factor).trunc() / factor
}

pub fn is_unsafe_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() > MAX_SAFE_INTEGER as f64
}

pub fn remove_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
