use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData};
use crate::coerce::{is_missing, remove_line_breaks, to_safe_string};
use crate::data::RawValue;

/// Fallback for values with no better kind. Always read-only.
#[derive(Debug, Default)]
pub struct ObjectColumn;

impl ObjectColumn {
    pub fn new(_props: &ColumnProps) -> Self {
        Self
    }
}

impl ColumnType for ObjectColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Object
    }

    fn is_editable(&self) -> bool {
        false
    }

    fn encode(&self, value: &RawValue, _validate: bool) -> Cell {
        if is_missing(value) {
            return Cell::missing();
        }
        let text = to_safe_string(value);
        let display = remove_line_breaks(&text);
        Cell::value(CellData::Text(text), display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_render_on_one_line() {
        let cell = ObjectColumn.encode(&RawValue::from("line one\nline two"), false);
        assert_eq!(cell.display(), "line one line two");
        assert_eq!(ObjectColumn.decode(&cell), Some(json!("line one\nline two")));

        let cell = ObjectColumn.encode(&RawValue::Json(json!({"a": 1})), false);
        assert_eq!(cell.display(), r#"{"a":1}"#);
    }
}
