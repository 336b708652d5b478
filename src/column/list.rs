use itertools::Itertools;

use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData};
use crate::coerce::{is_missing, json_display, to_safe_array};
use crate::data::RawValue;

#[derive(Debug, Default)]
pub struct ListColumn;

impl ListColumn {
    pub fn new(_props: &ColumnProps) -> Self {
        Self
    }
}

impl ColumnType for ListColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::List
    }

    fn encode(&self, value: &RawValue, _validate: bool) -> Cell {
        if is_missing(value) {
            return Cell::missing();
        }
        let items = to_safe_array(value);
        let display = items.iter().map(json_display).join(", ");
        Cell::value(CellData::List(items), display)
    }
}
