//! Date, time and datetime columns.
//!
//! All three share one implementation parameterized by [`TemporalKind`]. Values
//! are held as a UTC instant plus display offset; the kind decides which part
//! of the instant is shown, compared and transported.

use chrono::FixedOffset;
use log::warn;
use serde_json::Value as JsonValue;

use super::{ColumnKind, ColumnProps, ColumnType, SortMode};
use crate::cell::{Cell, CellData, CellError, Timestamp};
use crate::coerce::{json_display, parse_timezone, to_safe_date};
use crate::data::RawValue;
use crate::format::format_moment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
}

impl TemporalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::Time => "time",
            TemporalKind::DateTime => "datetime",
        }
    }

    fn column_kind(&self) -> ColumnKind {
        match self {
            TemporalKind::Date => ColumnKind::Date,
            TemporalKind::Time => ColumnKind::Time,
            TemporalKind::DateTime => ColumnKind::DateTime,
        }
    }

    fn default_pattern(&self) -> &'static str {
        match self {
            TemporalKind::Date => "YYYY-MM-DD",
            TemporalKind::Time => "HH:mm:ss",
            TemporalKind::DateTime => "YYYY-MM-DD HH:mm:ss",
        }
    }

    fn named_pattern(&self, name: &str, has_offset: bool) -> Option<&'static str> {
        match (name, self) {
            ("iso8601", TemporalKind::Date) => Some("YYYY-MM-DD"),
            ("iso8601", TemporalKind::Time) => Some("HH:mm:ss.SSS"),
            ("iso8601", TemporalKind::DateTime) if has_offset => Some("YYYY-MM-DDTHH:mm:ss.SSSZ"),
            ("iso8601", TemporalKind::DateTime) => Some("YYYY-MM-DDTHH:mm:ss.SSS"),
            ("localized", TemporalKind::Date) => Some("MMM D, YYYY"),
            ("localized", TemporalKind::Time) => Some("h:mm A"),
            ("localized", TemporalKind::DateTime) => Some("MMM D, YYYY h:mm A"),
            _ => None,
        }
    }

    /// Wall-clock ISO rendition used for bound comparisons.
    fn local_iso(&self, ts: &Timestamp) -> String {
        let local = ts.local();
        match self {
            TemporalKind::Date => local.format("%Y-%m-%d").to_string(),
            TemporalKind::Time => local.format("%H:%M:%S%.3f").to_string(),
            TemporalKind::DateTime => local.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
        }
    }

    /// Transport rendition; datetimes carry their offset when one applies.
    fn transport_iso(&self, ts: &Timestamp) -> String {
        let mut iso = self.local_iso(ts);
        if *self == TemporalKind::DateTime
            && let Some(offset) = ts.offset
        {
            iso.push_str(&offset.to_string());
        }
        iso
    }
}

#[derive(Debug)]
pub struct TemporalColumn {
    kind: TemporalKind,
    timezone: Option<FixedOffset>,
    min: Option<String>,
    max: Option<String>,
    format: Option<String>,
}

impl TemporalColumn {
    pub fn date(props: &ColumnProps) -> Self {
        Self::new(TemporalKind::Date, props)
    }

    pub fn time(props: &ColumnProps) -> Self {
        Self::new(TemporalKind::Time, props)
    }

    pub fn datetime(props: &ColumnProps) -> Self {
        Self::new(TemporalKind::DateTime, props)
    }

    pub fn new(kind: TemporalKind, props: &ColumnProps) -> Self {
        let timezone = match kind {
            TemporalKind::DateTime => props
                .param_str("timezone")
                .or(props.physical_type.timezone())
                .and_then(|name| {
                    let parsed = parse_timezone(name);
                    if parsed.is_none() {
                        warn!(
                            "Column '{}': timezone '{name}' is not a fixed offset; showing UTC",
                            props.name
                        );
                    }
                    parsed
                }),
            TemporalKind::Date | TemporalKind::Time => None,
        };
        let mut column = Self {
            kind,
            timezone,
            min: None,
            max: None,
            format: props.param_str("format").map(str::to_string),
        };
        column.min = column.bound(props, "min_value");
        column.max = column.bound(props, "max_value");
        column
    }

    fn bound(&self, props: &ColumnProps, key: &str) -> Option<String> {
        let raw = props.param(key)?;
        match to_safe_date(&RawValue::from(raw.clone()), self.kind.as_str()) {
            Ok(Some(ts)) => Some(self.kind.local_iso(&self.localize(ts))),
            _ => {
                warn!(
                    "Column '{}': ignoring unparseable {key} '{}'",
                    props.name,
                    json_display(raw)
                );
                None
            }
        }
    }

    fn localize(&self, ts: Timestamp) -> Timestamp {
        match self.timezone {
            Some(offset) => Timestamp::new(ts.utc, Some(offset)),
            None => ts,
        }
    }

    fn check_bounds(&self, ts: &Timestamp) -> Result<(), CellError> {
        let iso = self.kind.local_iso(ts);
        if let Some(min) = &self.min
            && iso < *min
        {
            return Err(CellError::OutOfRange {
                input: iso,
                bound: format!("min_value {min}"),
            });
        }
        if let Some(max) = &self.max
            && iso > *max
        {
            return Err(CellError::OutOfRange {
                input: iso,
                bound: format!("max_value {max}"),
            });
        }
        Ok(())
    }

    fn display(&self, ts: &Timestamp) -> String {
        let pattern = match self.format.as_deref() {
            None | Some("") => self.kind.default_pattern(),
            Some(name) => self
                .kind
                .named_pattern(name, ts.offset.is_some())
                .unwrap_or(name),
        };
        format_moment(ts.local(), ts.offset, pattern)
    }
}

impl ColumnType for TemporalColumn {
    fn kind(&self) -> ColumnKind {
        self.kind.column_kind()
    }

    fn sort_mode(&self) -> SortMode {
        SortMode::Raw
    }

    fn encode(&self, value: &RawValue, validate: bool) -> Cell {
        let ts = match to_safe_date(value, self.kind.as_str()) {
            Ok(Some(ts)) => self.localize(ts),
            Ok(None) => return Cell::missing(),
            Err(err) => return Cell::from(err),
        };
        if validate && let Err(err) = self.check_bounds(&ts) {
            return Cell::from(err);
        }
        Cell::value(CellData::Temporal(ts), self.display(&ts))
    }

    fn decode(&self, cell: &Cell) -> Option<JsonValue> {
        match cell.data()? {
            CellData::Temporal(ts) => Some(JsonValue::String(self.kind.transport_iso(ts))),
            other => Some(other.to_json()),
        }
    }
}
