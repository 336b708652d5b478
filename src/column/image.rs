use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData};
use crate::coerce::{is_missing, to_safe_string};
use crate::data::RawValue;

/// Image URL or data URI. Read-only.
#[derive(Debug, Default)]
pub struct ImageColumn;

impl ImageColumn {
    pub fn new(_props: &ColumnProps) -> Self {
        Self
    }
}

impl ColumnType for ImageColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Image
    }

    fn is_editable(&self) -> bool {
        false
    }

    fn encode(&self, value: &RawValue, _validate: bool) -> Cell {
        if is_missing(value) {
            return Cell::missing();
        }
        let url = to_safe_string(value);
        Cell::value(CellData::Image(url.clone()), url)
    }
}
