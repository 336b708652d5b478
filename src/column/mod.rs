//! Column kinds and the resolved [`Column`] the rest of the crate works with.
//!
//! Each logical kind implements [`ColumnType`]; [`Column`] pairs a kind with
//! the property bundle it was created from and applies the styling that is
//! common to every kind (read-only flag, alignment, index fading) plus the
//! required-value check.

pub mod boolean;
pub mod chart;
pub mod image;
pub mod list;
pub mod number;
pub mod object;
pub mod range;
pub mod registry;
pub mod select;
pub mod temporal;
pub mod text;
pub mod url;

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::cell::{Alignment, Cell, CellData, CellError};
use crate::data::RawValue;
use crate::source::PhysicalType;

pub use registry::{ColumnFactory, ColumnRegistry, RegistryError, install_registry, registry};

/// Kind-specific parameters (`min_value`, `format`, `options`, ...).
pub type Params = BTreeMap<String, JsonValue>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Number,
    Boolean,
    Date,
    Time,
    DateTime,
    Select,
    List,
    Object,
    Range,
    LineChart,
    BarChart,
    AreaChart,
    Image,
    Url,
    Custom(String),
}

impl ColumnKind {
    pub const BUILTIN: [ColumnKind; 15] = [
        ColumnKind::Text,
        ColumnKind::Number,
        ColumnKind::Boolean,
        ColumnKind::Date,
        ColumnKind::Time,
        ColumnKind::DateTime,
        ColumnKind::Select,
        ColumnKind::List,
        ColumnKind::Object,
        ColumnKind::Range,
        ColumnKind::LineChart,
        ColumnKind::BarChart,
        ColumnKind::AreaChart,
        ColumnKind::Image,
        ColumnKind::Url,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Number => "number",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Date => "date",
            ColumnKind::Time => "time",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Select => "select",
            ColumnKind::List => "list",
            ColumnKind::Object => "object",
            ColumnKind::Range => "range",
            ColumnKind::LineChart => "line_chart",
            ColumnKind::BarChart => "bar_chart",
            ColumnKind::AreaChart => "area_chart",
            ColumnKind::Image => "image",
            ColumnKind::Url => "url",
            ColumnKind::Custom(name) => name,
        }
    }

    pub fn default_alignment(&self) -> Option<Alignment> {
        match self {
            ColumnKind::Number | ColumnKind::Range => Some(Alignment::Right),
            ColumnKind::Boolean => Some(Alignment::Center),
            _ => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ColumnKind::Custom(_))
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ColumnKind {
    fn from(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "text" | "string" => ColumnKind::Text,
            "number" | "numeric" | "integer" | "float" => ColumnKind::Number,
            "boolean" | "bool" | "checkbox" => ColumnKind::Boolean,
            "date" => ColumnKind::Date,
            "time" => ColumnKind::Time,
            "datetime" | "date_time" | "timestamp" => ColumnKind::DateTime,
            "select" | "selectbox" | "categorical" => ColumnKind::Select,
            "list" => ColumnKind::List,
            "object" | "json" => ColumnKind::Object,
            "range" | "progress" => ColumnKind::Range,
            "line_chart" | "chart" => ColumnKind::LineChart,
            "bar_chart" => ColumnKind::BarChart,
            "area_chart" => ColumnKind::AreaChart,
            "image" => ColumnKind::Image,
            "url" | "link" => ColumnKind::Url,
            _ => ColumnKind::Custom(value.trim().to_string()),
        }
    }
}

impl FromStr for ColumnKind {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(ColumnKind::from(value))
    }
}

impl Serialize for ColumnKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(ColumnKind::from(token.as_str()))
    }
}

/// How the sort mapper compares cells of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Display-string comparison.
    #[default]
    Default,
    /// Numeric when both sides parse as numbers, otherwise string.
    Smart,
    /// Decoded-value comparison.
    Raw,
}

/// Everything known about a column before its kind is instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProps {
    /// Stable identifier, `_pos:<n>` for snapshot columns.
    pub id: String,
    pub name: String,
    pub title: String,
    pub index_number: usize,
    pub kind: ColumnKind,
    pub physical_type: PhysicalType,
    pub is_editable: bool,
    pub is_required: bool,
    pub is_hidden: bool,
    pub is_index: bool,
    pub alignment: Option<Alignment>,
    pub width: Option<u32>,
    pub help: Option<String>,
    pub default_value: Option<JsonValue>,
    pub params: Params,
}

impl ColumnProps {
    pub fn new(
        index_number: usize,
        name: impl Into<String>,
        kind: ColumnKind,
        physical_type: PhysicalType,
    ) -> Self {
        let name = name.into();
        Self {
            id: format!("_pos:{index_number}"),
            title: name.clone(),
            name,
            index_number,
            kind,
            physical_type,
            is_editable: true,
            is_required: false,
            is_hidden: false,
            is_index: false,
            alignment: None,
            width: None,
            help: None,
            default_value: None,
            params: Params::new(),
        }
    }

    /// Builder-style parameter setter, mostly for tests and scripted setups.
    pub fn with_param(mut self, key: &str, value: JsonValue) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.params.get(key).filter(|value| !value.is_null())
    }

    /// Numeric parameter; numeric strings are accepted.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        match self.param(key)? {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(JsonValue::as_str)
    }

    pub fn param_bool(&self, key: &str) -> bool {
        self.param(key).and_then(JsonValue::as_bool).unwrap_or(false)
    }

    pub fn param_usize(&self, key: &str) -> Option<usize> {
        self.param(key)
            .and_then(JsonValue::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }
}

/// The uniform contract every column kind implements.
pub trait ColumnType: fmt::Debug + Send + Sync {
    fn kind(&self) -> ColumnKind;

    fn sort_mode(&self) -> SortMode {
        SortMode::Default
    }

    /// Kind-level editability; read-only kinds ignore the column's flag.
    fn is_editable(&self) -> bool {
        true
    }

    /// Coerces a raw value into a cell. `validate` turns on the constraint
    /// checks that only apply to user input.
    fn encode(&self, value: &RawValue, validate: bool) -> Cell;

    /// Transport value of a value cell.
    fn decode(&self, cell: &Cell) -> Option<JsonValue> {
        cell.data().map(CellData::to_json)
    }
}

/// A column property bundle bound to its kind implementation.
#[derive(Debug)]
pub struct Column {
    props: ColumnProps,
    ty: Box<dyn ColumnType>,
}

impl Column {
    /// Resolves `props.kind` through the process-wide registry. Unknown kinds
    /// fall back to the physical type's default kind.
    pub fn new(props: ColumnProps) -> Self {
        Self::with_registry(props, registry())
    }

    pub fn with_registry(mut props: ColumnProps, registry: &ColumnRegistry) -> Self {
        if let Some(ty) = registry.create(&props) {
            return Self { props, ty };
        }
        let fallback = props.physical_type.default_kind();
        warn!(
            "Column '{}' uses unknown kind '{}'; falling back to '{}'",
            props.name, props.kind, fallback
        );
        props.kind = fallback;
        let ty = registry
            .create(&props)
            .unwrap_or_else(|| Box::new(text::TextColumn::new(&props)));
        Self { props, ty }
    }

    pub fn props(&self) -> &ColumnProps {
        &self.props
    }

    pub fn id(&self) -> &str {
        &self.props.id
    }

    pub fn name(&self) -> &str {
        &self.props.name
    }

    pub fn title(&self) -> &str {
        &self.props.title
    }

    pub fn index_number(&self) -> usize {
        self.props.index_number
    }

    pub fn kind(&self) -> ColumnKind {
        self.ty.kind()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.ty.sort_mode()
    }

    pub fn is_editable(&self) -> bool {
        self.props.is_editable && self.ty.is_editable()
    }

    pub fn is_required(&self) -> bool {
        self.props.is_required
    }

    pub fn is_index(&self) -> bool {
        self.props.is_index
    }

    pub fn is_hidden(&self) -> bool {
        self.props.is_hidden
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.props.alignment.or_else(|| self.kind().default_alignment())
    }

    pub fn encode(&self, value: &RawValue, validate: bool) -> Cell {
        let cell = self.ty.encode(value, validate);
        if validate && self.props.is_required && cell.is_missing() {
            return Cell::from(CellError::Required);
        }
        self.finish(cell)
    }

    /// `None` for error and missing cells.
    pub fn decode(&self, cell: &Cell) -> Option<JsonValue> {
        match cell {
            Cell::Value(_) => self.ty.decode(cell),
            Cell::Error(_) | Cell::Missing(_) => None,
        }
    }

    /// Cell used to seed a freshly appended row.
    pub fn default_cell(&self) -> Cell {
        match &self.props.default_value {
            Some(value) => {
                let cell = self.ty.encode(&RawValue::from(value.clone()), false);
                self.finish(cell)
            }
            None => self.finish(Cell::missing()),
        }
    }

    fn finish(&self, mut cell: Cell) -> Cell {
        let readonly = !self.is_editable();
        let alignment = self.alignment();
        let faded = self.props.is_index;
        if let Some(style) = cell.style_mut() {
            style.readonly = readonly;
            if style.alignment.is_none() {
                style.alignment = alignment;
            }
            style.faded |= faded;
        }
        cell
    }
}
