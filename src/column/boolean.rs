use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData};
use crate::coerce::to_safe_boolean;
use crate::data::RawValue;

#[derive(Debug, Default)]
pub struct BooleanColumn;

impl BooleanColumn {
    pub fn new(_props: &ColumnProps) -> Self {
        Self
    }
}

impl ColumnType for BooleanColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Boolean
    }

    fn encode(&self, value: &RawValue, _validate: bool) -> Cell {
        match to_safe_boolean(value) {
            Ok(Some(flag)) => Cell::value(CellData::Boolean(flag), flag.to_string()),
            Ok(None) => Cell::missing(),
            Err(err) => Cell::from(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vocabulary_round_trips_to_json_booleans() {
        let col = BooleanColumn;
        for (input, expected) in [("yes", true), ("OFF", false), (" t ", true), ("0", false)] {
            let cell = col.encode(&RawValue::from(input), true);
            assert_eq!(col.decode(&cell), Some(json!(expected)), "{input}");
        }
    }

    #[test]
    fn unknown_words_become_errors() {
        let cell = BooleanColumn.encode(&RawValue::from("maybe"), true);
        assert!(cell.is_error());
        assert_eq!(
            cell.error_details(),
            Some("The value cannot be interpreted as boolean.")
        );
        assert!(BooleanColumn.encode(&RawValue::from(""), true).is_missing());
    }
}
