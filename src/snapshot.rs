//! Adapter from an immutable [`TableSource`] to resolved columns and cells.

use log::debug;

use crate::cell::{Cell, CellError};
use crate::column::{Column, ColumnKind, ColumnProps};
use crate::config::ColumnConfigMap;
use crate::data::RawValue;
use crate::source::{PhysicalType, TableSource};
use crate::style::theme_for_anchor;

/// Id of the placeholder column used when a source has no columns at all.
pub const EMPTY_INDEX_ID: &str = "_empty-index";

/// Everything the source knows about one cell before coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub value: RawValue,
    pub display: Option<String>,
    pub anchor: Option<String>,
}

#[derive(Debug)]
pub struct TableSnapshot {
    source: Box<dyn TableSource>,
    columns: Vec<Column>,
    num_index: usize,
    synthetic_index: bool,
}

impl TableSnapshot {
    pub fn new<S>(source: S, config: &ColumnConfigMap) -> Self
    where
        S: TableSource + 'static,
    {
        Self::from_boxed(Box::new(source), config)
    }

    pub fn from_boxed(source: Box<dyn TableSource>, config: &ColumnConfigMap) -> Self {
        let mut columns = Vec::new();
        for field in source.index_fields() {
            let mut props = ColumnProps::new(
                columns.len(),
                field.name.clone(),
                field.physical_type.default_kind(),
                field.physical_type.clone(),
            );
            props.is_index = true;
            props.is_editable = false;
            config.apply(&mut props);
            columns.push(Column::new(props));
        }
        let num_index = columns.len();
        for field in source.data_fields() {
            let mut props = ColumnProps::new(
                columns.len(),
                field.name.clone(),
                field.physical_type.default_kind(),
                field.physical_type.clone(),
            );
            config.apply(&mut props);
            columns.push(Column::new(props));
        }

        let synthetic_index = columns.is_empty();
        if synthetic_index {
            let mut props = ColumnProps::new(0, "", ColumnKind::Text, PhysicalType::Empty);
            props.id = EMPTY_INDEX_ID.to_string();
            props.is_index = true;
            props.is_editable = false;
            columns.push(Column::new(props));
        }

        debug!(
            "Snapshot with {} row(s), {} index and {} data column(s)",
            source.num_rows(),
            num_index,
            columns.len() - num_index
        );
        Self {
            source,
            columns,
            num_index: if synthetic_index { 1 } else { num_index },
            synthetic_index,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.source.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_index_columns(&self) -> usize {
        self.num_index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> Option<&Column> {
        self.columns.get(col)
    }

    /// Column position by id, then by name.
    pub fn find_column(&self, key: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.id() == key)
            .or_else(|| self.columns.iter().position(|c| c.name() == key))
    }

    pub fn source(&self) -> &dyn TableSource {
        self.source.as_ref()
    }

    pub fn raw_cell(&self, row: usize, col: usize) -> Option<RawCell> {
        if row >= self.num_rows() || col >= self.columns.len() {
            return None;
        }
        if self.synthetic_index {
            return Some(RawCell {
                value: RawValue::Null,
                display: None,
                anchor: None,
            });
        }
        if col < self.num_index {
            return Some(RawCell {
                value: self.source.index_value(row, col).unwrap_or_default(),
                display: None,
                anchor: None,
            });
        }
        let data_col = col - self.num_index;
        Some(RawCell {
            value: self.source.data_value(row, data_col).unwrap_or_default(),
            display: self.source.display_value(row, data_col),
            anchor: self.source.cell_anchor(row, data_col),
        })
    }

    /// Encoded cell of the original table; out-of-range positions yield a
    /// structural error cell.
    pub fn cell(&self, col: usize, row: usize) -> Cell {
        let (Some(raw), Some(column)) = (self.raw_cell(row, col), self.columns.get(col)) else {
            return Cell::from(CellError::OutOfBounds { col, row });
        };
        let mut cell = column.encode(&raw.value, false);
        if let (Some(display), Cell::Value(value)) = (raw.display, &mut cell)
            && matches!(column.kind(), ColumnKind::Text | ColumnKind::Number)
        {
            value.display = display;
        }
        if let (Some(anchor), Some(css)) = (raw.anchor, self.source.style_sheet())
            && let Some(theme) = theme_for_anchor(&anchor, css)
            && let Some(style) = cell.style_mut()
        {
            style.theme = Some(theme);
        }
        cell
    }
}
