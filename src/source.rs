//! Immutable source tables and the physical types of their columns.
//!
//! A [`TableSource`] is whatever the host hands over: a row count, index and
//! data fields, and a `(row, col)` accessor. [`SourceTable`] is the concrete
//! in-memory implementation loaded from JSON/YAML documents or CSV files.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::column::ColumnKind;
use crate::data::{
    RawValue, parse_naive_date, parse_naive_datetime, parse_naive_time, parse_offset_datetime,
};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unknown physical type '{0}'")]
    UnknownPhysicalType(String),
    #[error("column '{column}' has {found} value(s), expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("display values of column '{column}' have {found} entries, expected {expected}")]
    RaggedDisplay {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// Storage type of a source column.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Boolean,
    Categorical(Vec<JsonValue>),
    Date,
    Time,
    /// Optional timezone name attached to the column.
    DateTime(Option<String>),
    List(Box<PhysicalType>),
    Decimal,
    Bytes,
    Object,
    Text,
    Range,
    Empty,
}

impl PhysicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicalType::Int8 => "int8",
            PhysicalType::Int16 => "int16",
            PhysicalType::Int32 => "int32",
            PhysicalType::Int64 => "int64",
            PhysicalType::UInt8 => "uint8",
            PhysicalType::UInt16 => "uint16",
            PhysicalType::UInt32 => "uint32",
            PhysicalType::UInt64 => "uint64",
            PhysicalType::Float16 => "float16",
            PhysicalType::Float32 => "float32",
            PhysicalType::Float64 => "float64",
            PhysicalType::Boolean => "bool",
            PhysicalType::Categorical(_) => "categorical",
            PhysicalType::Date => "date",
            PhysicalType::Time => "time",
            PhysicalType::DateTime(_) => "datetime",
            PhysicalType::List(_) => "list",
            PhysicalType::Decimal => "decimal",
            PhysicalType::Bytes => "bytes",
            PhysicalType::Object => "object",
            PhysicalType::Text => "text",
            PhysicalType::Range => "range",
            PhysicalType::Empty => "empty",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PhysicalType::DateTime(Some(tz)) => format!("datetime({tz})"),
            PhysicalType::List(inner) => format!("list[{}]", inner.describe()),
            other => other.as_str().to_string(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PhysicalType::Int8
                | PhysicalType::Int16
                | PhysicalType::Int32
                | PhysicalType::Int64
                | PhysicalType::UInt8
                | PhysicalType::UInt16
                | PhysicalType::UInt32
                | PhysicalType::UInt64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            PhysicalType::UInt8 | PhysicalType::UInt16 | PhysicalType::UInt32 | PhysicalType::UInt64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            PhysicalType::Float16 | PhysicalType::Float32 | PhysicalType::Float64
        )
    }

    pub fn timezone(&self) -> Option<&str> {
        match self {
            PhysicalType::DateTime(tz) => tz.as_deref(),
            _ => None,
        }
    }

    pub fn categories(&self) -> &[JsonValue] {
        match self {
            PhysicalType::Categorical(options) => options,
            _ => &[],
        }
    }

    /// Logical kind a column of this physical type gets unless configured
    /// otherwise.
    pub fn default_kind(&self) -> ColumnKind {
        match self {
            t if t.is_integer() || t.is_float() => ColumnKind::Number,
            PhysicalType::Decimal | PhysicalType::Range => ColumnKind::Number,
            PhysicalType::Boolean => ColumnKind::Boolean,
            PhysicalType::Categorical(_) => ColumnKind::Select,
            PhysicalType::Date => ColumnKind::Date,
            PhysicalType::Time => ColumnKind::Time,
            PhysicalType::DateTime(_) => ColumnKind::DateTime,
            PhysicalType::List(_) => ColumnKind::List,
            PhysicalType::Bytes | PhysicalType::Object => ColumnKind::Object,
            _ => ColumnKind::Text,
        }
    }

    /// Best-effort type for a column whose document omits `type`.
    pub fn infer(values: &[JsonValue]) -> PhysicalType {
        let present = values.iter().filter(|v| !v.is_null()).collect::<Vec<_>>();
        if present.is_empty() {
            return PhysicalType::Empty;
        }
        if present.iter().all(|v| v.is_i64() || v.is_u64()) {
            PhysicalType::Int64
        } else if present.iter().all(|v| v.is_number()) {
            PhysicalType::Float64
        } else if present.iter().all(|v| v.is_boolean()) {
            PhysicalType::Boolean
        } else if present.iter().all(|v| v.is_string()) {
            PhysicalType::Text
        } else if present.iter().all(|v| v.is_array()) {
            let items = present
                .iter()
                .filter_map(|v| v.as_array())
                .flatten()
                .cloned()
                .collect::<Vec<_>>();
            PhysicalType::List(Box::new(PhysicalType::infer(&items)))
        } else {
            PhysicalType::Object
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl FromStr for PhysicalType {
    type Err = SourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let normalized = trimmed.to_ascii_lowercase();
        if let Some(inner) = normalized
            .strip_prefix("list[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let inner = PhysicalType::from_str(&trimmed[5..5 + inner.len()])?;
            return Ok(PhysicalType::List(Box::new(inner)));
        }
        if let Some(tz) = normalized
            .strip_prefix("datetime(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let tz = trimmed[9..9 + tz.len()].trim();
            return Ok(PhysicalType::DateTime(
                (!tz.is_empty()).then(|| tz.to_string()),
            ));
        }
        let parsed = match normalized.as_str() {
            "int8" => PhysicalType::Int8,
            "int16" => PhysicalType::Int16,
            "int32" => PhysicalType::Int32,
            "int64" | "int" | "integer" => PhysicalType::Int64,
            "uint8" => PhysicalType::UInt8,
            "uint16" => PhysicalType::UInt16,
            "uint32" => PhysicalType::UInt32,
            "uint64" => PhysicalType::UInt64,
            "float16" => PhysicalType::Float16,
            "float32" => PhysicalType::Float32,
            "float64" | "float" | "double" => PhysicalType::Float64,
            "bool" | "boolean" => PhysicalType::Boolean,
            "categorical" | "category" => PhysicalType::Categorical(Vec::new()),
            "date" => PhysicalType::Date,
            "time" => PhysicalType::Time,
            "datetime" | "timestamp" => PhysicalType::DateTime(None),
            "list" => PhysicalType::List(Box::new(PhysicalType::Object)),
            "decimal" => PhysicalType::Decimal,
            "bytes" | "binary" => PhysicalType::Bytes,
            "object" => PhysicalType::Object,
            "text" | "string" | "str" | "utf8" => PhysicalType::Text,
            "range" | "interval" => PhysicalType::Range,
            "empty" | "null" => PhysicalType::Empty,
            _ => return Err(SourceError::UnknownPhysicalType(trimmed.to_string())),
        };
        Ok(parsed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub physical_type: PhysicalType,
}

impl Field {
    pub fn new(name: impl Into<String>, physical_type: PhysicalType) -> Self {
        Self {
            name: name.into(),
            physical_type,
        }
    }
}

/// The host-side table a snapshot is built from.
pub trait TableSource: fmt::Debug {
    fn num_rows(&self) -> usize;

    fn index_fields(&self) -> &[Field];

    fn data_fields(&self) -> &[Field];

    fn index_value(&self, row: usize, col: usize) -> Option<RawValue>;

    fn data_value(&self, row: usize, col: usize) -> Option<RawValue>;

    /// Pre-formatted display text for a data cell.
    fn display_value(&self, _row: usize, _col: usize) -> Option<String> {
        None
    }

    fn style_sheet(&self) -> Option<&str> {
        None
    }

    /// CSS selector identifying a data cell in [`TableSource::style_sheet`].
    fn cell_anchor(&self, _row: usize, _col: usize) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceColumn {
    pub field: Field,
    pub values: Vec<RawValue>,
    pub display: Option<Vec<Option<String>>>,
}

impl SourceColumn {
    pub fn new(field: Field, values: Vec<RawValue>) -> Self {
        Self {
            field,
            values,
            display: None,
        }
    }

    pub fn with_display(mut self, display: Vec<Option<String>>) -> Self {
        self.display = Some(display);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Styler {
    pub uuid: String,
    pub css: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    index: Vec<SourceColumn>,
    columns: Vec<SourceColumn>,
    index_fields: Vec<Field>,
    data_fields: Vec<Field>,
    num_rows: usize,
    styler: Option<Styler>,
}

impl SourceTable {
    pub fn new(
        index: Vec<SourceColumn>,
        columns: Vec<SourceColumn>,
        styler: Option<Styler>,
    ) -> Result<Self, SourceError> {
        let num_rows = index
            .first()
            .or_else(|| columns.first())
            .map_or(0, |c| c.values.len());
        for column in index.iter().chain(columns.iter()) {
            if column.values.len() != num_rows {
                return Err(SourceError::RaggedColumn {
                    column: column.field.name.clone(),
                    expected: num_rows,
                    found: column.values.len(),
                });
            }
            if let Some(display) = &column.display
                && display.len() != num_rows
            {
                return Err(SourceError::RaggedDisplay {
                    column: column.field.name.clone(),
                    expected: num_rows,
                    found: display.len(),
                });
            }
        }
        Ok(Self {
            index_fields: index.iter().map(|c| c.field.clone()).collect(),
            data_fields: columns.iter().map(|c| c.field.clone()).collect(),
            index,
            columns,
            num_rows,
            styler,
        })
    }

    pub fn styler(&self) -> Option<&Styler> {
        self.styler.as_ref()
    }
}

impl TableSource for SourceTable {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn index_fields(&self) -> &[Field] {
        &self.index_fields
    }

    fn data_fields(&self) -> &[Field] {
        &self.data_fields
    }

    fn index_value(&self, row: usize, col: usize) -> Option<RawValue> {
        self.index.get(col)?.values.get(row).cloned()
    }

    fn data_value(&self, row: usize, col: usize) -> Option<RawValue> {
        self.columns.get(col)?.values.get(row).cloned()
    }

    fn display_value(&self, row: usize, col: usize) -> Option<String> {
        self.columns.get(col)?.display.as_ref()?.get(row)?.clone()
    }

    fn style_sheet(&self) -> Option<&str> {
        self.styler.as_ref().map(|s| s.css.as_str())
    }

    fn cell_anchor(&self, row: usize, col: usize) -> Option<String> {
        let styler = self.styler.as_ref()?;
        Some(format!("#T_{}row{row}_col{col}", styler.uuid))
    }
}

/// Serialized form of a [`SourceTable`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub index: Vec<ColumnDocument>,
    #[serde(default)]
    pub columns: Vec<ColumnDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styler: Option<Styler>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnDocument {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub physical_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub values: Vec<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Vec<Option<String>>>,
}

impl ColumnDocument {
    pub fn physical_type(&self) -> Result<PhysicalType, SourceError> {
        let mut physical = match &self.physical_type {
            Some(token) => PhysicalType::from_str(token)?,
            None => PhysicalType::infer(&self.values),
        };
        match &mut physical {
            PhysicalType::Categorical(options) => {
                if let Some(categories) = &self.categories {
                    options.clone_from(categories);
                }
            }
            PhysicalType::DateTime(tz) if tz.is_none() => tz.clone_from(&self.timezone),
            _ => {}
        }
        Ok(physical)
    }

    pub fn into_column(self) -> Result<SourceColumn, SourceError> {
        let physical = self.physical_type()?;
        let values = self
            .values
            .into_iter()
            .map(|value| raw_from_json(value, &physical))
            .collect();
        let column = SourceColumn::new(Field::new(self.name, physical), values);
        Ok(match self.display {
            Some(display) => column.with_display(display),
            None => column,
        })
    }
}

impl SourceDocument {
    pub fn into_table(self) -> Result<SourceTable, SourceError> {
        let index = self
            .index
            .into_iter()
            .map(ColumnDocument::into_column)
            .collect::<Result<Vec<_>, _>>()?;
        let columns = self
            .columns
            .into_iter()
            .map(ColumnDocument::into_column)
            .collect::<Result<Vec<_>, _>>()?;
        SourceTable::new(index, columns, self.styler)
    }
}

/// Converts a JSON value into the raw value a column of `physical` holds.
/// Values that do not fit the physical type are kept as their JSON shape.
pub fn raw_from_json(value: JsonValue, physical: &PhysicalType) -> RawValue {
    match (physical, value) {
        (_, JsonValue::Null) => RawValue::Null,
        (PhysicalType::Date, JsonValue::String(s)) => parse_naive_date(&s)
            .map(RawValue::Date)
            .unwrap_or(RawValue::Text(s)),
        (PhysicalType::Time, JsonValue::String(s)) => parse_naive_time(&s)
            .map(RawValue::Time)
            .unwrap_or(RawValue::Text(s)),
        (PhysicalType::DateTime(_), JsonValue::String(s)) => {
            if let Ok(dt) = parse_offset_datetime(&s) {
                RawValue::DateTimeTz(dt)
            } else if let Ok(dt) = parse_naive_datetime(&s) {
                RawValue::DateTime(dt)
            } else if let Ok(date) = parse_naive_date(&s) {
                RawValue::DateTime(date.and_time(NaiveTime::MIN))
            } else {
                RawValue::Text(s)
            }
        }
        (PhysicalType::Decimal, JsonValue::String(s)) => Decimal::from_str(s.trim())
            .map(RawValue::Decimal)
            .unwrap_or(RawValue::Text(s)),
        (PhysicalType::Decimal, JsonValue::Number(n)) => Decimal::from_str(&n.to_string())
            .map(RawValue::Decimal)
            .unwrap_or_else(|_| RawValue::from(JsonValue::Number(n))),
        (PhysicalType::Bytes, JsonValue::String(s)) => RawValue::Bytes(s.into_bytes()),
        (PhysicalType::List(inner), JsonValue::Array(items)) => RawValue::List(
            items
                .into_iter()
                .map(|item| raw_from_json(item, inner))
                .collect(),
        ),
        (PhysicalType::Object, value @ (JsonValue::Object(_) | JsonValue::Array(_))) => {
            RawValue::Json(value)
        }
        (_, value) => RawValue::from(value),
    }
}
