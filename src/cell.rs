//! The [`Cell`] model shared by every column kind, plus the per-cell error
//! taxonomy.
//!
//! Cells are data, never exceptions: an uncoercible value, a violated bound or
//! an out-of-bounds lookup all become [`Cell::Error`] so one bad cell cannot
//! abort rendering or serialization of the rest of the table.

use chrono::{FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::coerce::json_number;

/// Prefix carried by every error cell message.
pub const WARNING_MARKER: &str = "⚠️ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// Colors lifted from the source style sheet for a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeOverride {
    pub text_color: Option<String>,
    pub background: Option<String>,
}

impl ThemeOverride {
    pub fn is_empty(&self) -> bool {
        self.text_color.is_none() && self.background.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStyle {
    pub readonly: bool,
    pub alignment: Option<Alignment>,
    /// Rendered de-emphasized (index columns).
    pub faded: bool,
    pub theme: Option<ThemeOverride>,
}

/// A UTC instant plus the offset it should be shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub utc: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl Timestamp {
    pub fn new(utc: NaiveDateTime, offset: Option<FixedOffset>) -> Self {
        Self { utc, offset }
    }

    pub fn local(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => self.utc + offset,
            None => self.utc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    Text(String),
    Number(f64),
    Boolean(bool),
    Temporal(Timestamp),
    Choice(JsonValue),
    List(Vec<JsonValue>),
    Progress { value: f64, min: f64, max: f64 },
    Chart { values: Vec<f64>, normalized: Vec<f64> },
    Image(String),
    Link { href: String, label: Option<String> },
}

impl CellData {
    /// Kind-agnostic JSON rendition; column kinds with a stricter transport
    /// format (temporal kinds) override this in their `decode`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellData::Text(text) | CellData::Image(text) => JsonValue::String(text.clone()),
            CellData::Number(value) => json_number(*value),
            CellData::Boolean(value) => JsonValue::Bool(*value),
            CellData::Temporal(ts) => {
                JsonValue::String(ts.local().format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
            }
            CellData::Choice(value) => value.clone(),
            CellData::List(items) => JsonValue::Array(items.clone()),
            CellData::Progress { value, .. } => json_number(*value),
            CellData::Chart { values, .. } => {
                JsonValue::Array(values.iter().copied().map(json_number).collect())
            }
            CellData::Link { href, .. } => JsonValue::String(href.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueCell {
    pub data: CellData,
    pub display: String,
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCell {
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissingCell {
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(ValueCell),
    Error(ErrorCell),
    Missing(MissingCell),
}

impl Cell {
    pub fn value(data: CellData, display: impl Into<String>) -> Self {
        Cell::Value(ValueCell {
            data,
            display: display.into(),
            style: CellStyle::default(),
        })
    }

    pub fn error(message: impl AsRef<str>, details: Option<String>) -> Self {
        let message = message.as_ref();
        let message = if message.starts_with(WARNING_MARKER) {
            message.to_string()
        } else {
            format!("{WARNING_MARKER}{message}")
        };
        Cell::Error(ErrorCell {
            message,
            details: details.filter(|d| !d.is_empty()),
        })
    }

    pub fn missing() -> Self {
        Cell::Missing(MissingCell::default())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Cell::Error(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing(_))
    }

    pub fn is_readonly(&self) -> bool {
        match self {
            Cell::Value(cell) => cell.style.readonly,
            Cell::Missing(cell) => cell.style.readonly,
            Cell::Error(_) => true,
        }
    }

    pub fn data(&self) -> Option<&CellData> {
        match self {
            Cell::Value(cell) => Some(&cell.data),
            _ => None,
        }
    }

    /// Short text shown in the grid. Error cells show their message.
    pub fn display(&self) -> &str {
        match self {
            Cell::Value(cell) => &cell.display,
            Cell::Error(cell) => &cell.message,
            Cell::Missing(_) => "",
        }
    }

    pub fn error_details(&self) -> Option<&str> {
        match self {
            Cell::Error(cell) => cell.details.as_deref(),
            _ => None,
        }
    }

    /// Error cells carry no style: they are always read-only and never themed.
    pub fn style(&self) -> Option<&CellStyle> {
        match self {
            Cell::Value(cell) => Some(&cell.style),
            Cell::Missing(cell) => Some(&cell.style),
            Cell::Error(_) => None,
        }
    }

    pub fn style_mut(&mut self) -> Option<&mut CellStyle> {
        match self {
            Cell::Value(cell) => Some(&mut cell.style),
            Cell::Missing(cell) => Some(&mut cell.style),
            Cell::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input could not be interpreted as the column's kind.
    ValueCoercion,
    /// Input parsed but broke a hard bound.
    ConstraintViolation,
    /// Programmer error: the caller asked for a cell that does not exist.
    Structural,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellError {
    #[error("The value cannot be interpreted as a number.")]
    NotANumber { input: String },
    #[error("The value cannot be interpreted as boolean.")]
    NotABoolean { input: String },
    #[error("{input} is not a valid {kind} value.")]
    NotATemporal { input: String, kind: &'static str },
    #[error("The value cannot be interpreted as a numeric array. {element} is not a number.")]
    NotANumericArray { input: String, element: String },
    #[error(
        "The value is larger than the maximum supported integer values in number columns (2^53)."
    )]
    UnsafeInteger { input: String },
    #[error("The value is smaller than the minimum allowed value ({min}).")]
    BelowMinimum { input: String, min: String },
    #[error("The value is outside of the allowed range ({bound}).")]
    OutOfRange { input: String, bound: String },
    #[error("This column requires a value.")]
    Required,
    #[error("The value is not part of the allowed options.")]
    NotAnOption { input: String },
    #[error("The value does not match the validation pattern `{pattern}`.")]
    PatternMismatch { input: String, pattern: String },
    #[error(
        "The min_value ({min}) and max_value ({max}) parameters must be valid numbers with min_value < max_value."
    )]
    InvalidBounds { min: String, max: String },
    #[error("Failed to format the value with `{format}`: {reason}")]
    Format {
        input: String,
        format: String,
        reason: String,
    },
    #[error(
        "Cell (column {col}, row {row}) does not exist. This should never happen, please report this bug."
    )]
    OutOfBounds { col: usize, row: usize },
}

impl CellError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CellError::NotANumber { .. }
            | CellError::NotABoolean { .. }
            | CellError::NotATemporal { .. }
            | CellError::NotANumericArray { .. }
            | CellError::Format { .. } => ErrorCategory::ValueCoercion,
            CellError::UnsafeInteger { .. }
            | CellError::BelowMinimum { .. }
            | CellError::OutOfRange { .. }
            | CellError::Required
            | CellError::NotAnOption { .. }
            | CellError::PatternMismatch { .. }
            | CellError::InvalidBounds { .. } => ErrorCategory::ConstraintViolation,
            CellError::OutOfBounds { .. } => ErrorCategory::Structural,
        }
    }

    /// The short message shown in the grid; the `Display` text is the detail.
    pub fn short_message(&self) -> String {
        match self {
            CellError::NotANumber { input }
            | CellError::NotABoolean { input }
            | CellError::NotATemporal { input, .. }
            | CellError::NotANumericArray { input, .. }
            | CellError::UnsafeInteger { input }
            | CellError::BelowMinimum { input, .. }
            | CellError::OutOfRange { input, .. }
            | CellError::NotAnOption { input }
            | CellError::PatternMismatch { input, .. }
            | CellError::Format { input, .. } => input.clone(),
            CellError::Required => "Missing value".to_string(),
            CellError::InvalidBounds { .. } => "Invalid min/max parameters".to_string(),
            CellError::OutOfBounds { .. } => "Error".to_string(),
        }
    }
}

impl From<CellError> for Cell {
    fn from(err: CellError) -> Self {
        Cell::error(err.short_message(), Some(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_cells_carry_marker_and_details() {
        let cell = Cell::error("abc", Some("The value cannot be interpreted.".into()));
        assert!(cell.is_error());
        assert!(cell.is_readonly());
        assert_eq!(cell.display(), "⚠️ abc");
        assert_eq!(cell.error_details(), Some("The value cannot be interpreted."));
    }

    #[test]
    fn error_marker_is_not_doubled() {
        let cell = Cell::error("⚠️ abc", None);
        assert_eq!(cell.display(), "⚠️ abc");
        assert_eq!(cell.error_details(), None);
    }

    #[test]
    fn missing_cells_are_flagged_without_data() {
        let cell = Cell::missing();
        assert!(cell.is_missing());
        assert!(!cell.is_error());
        assert!(cell.data().is_none());
        assert_eq!(cell.display(), "");
    }

    #[test]
    fn structural_errors_ask_for_a_bug_report() {
        let err = CellError::OutOfBounds { col: 3, row: 9 };
        assert_eq!(err.category(), ErrorCategory::Structural);
        let cell = Cell::from(err);
        assert!(cell.error_details().unwrap().contains("please report this bug"));
    }

    #[test]
    fn constraint_errors_show_the_offending_input() {
        let err = CellError::BelowMinimum {
            input: "-4".into(),
            min: "0".into(),
        };
        assert_eq!(err.category(), ErrorCategory::ConstraintViolation);
        assert_eq!(Cell::from(err).display(), "⚠️ -4");
    }
}
