use serde_json::Value as JsonValue;

use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData, CellError};
use crate::coerce::{is_missing, json_display, to_safe_string};
use crate::data::RawValue;

/// Single choice out of a fixed option list. Missing input stands for the
/// implicit empty option.
#[derive(Debug)]
pub struct SelectColumn {
    options: Vec<JsonValue>,
}

impl SelectColumn {
    pub fn new(props: &ColumnProps) -> Self {
        let options = match props.param("options") {
            Some(JsonValue::Array(items)) => items.clone(),
            _ => props.physical_type.categories().to_vec(),
        };
        Self { options }
    }

    pub fn options(&self) -> &[JsonValue] {
        &self.options
    }

    fn find_option(&self, value: &RawValue) -> Option<&JsonValue> {
        let json = value.to_json();
        let text = to_safe_string(value);
        self.options
            .iter()
            .find(|option| **option == json)
            .or_else(|| self.options.iter().find(|option| json_display(option) == text))
    }
}

impl ColumnType for SelectColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Select
    }

    fn encode(&self, value: &RawValue, validate: bool) -> Cell {
        if is_missing(value) {
            return Cell::missing();
        }
        let choice = match self.find_option(value) {
            Some(option) => option.clone(),
            None if validate => {
                return Cell::from(CellError::NotAnOption {
                    input: to_safe_string(value),
                });
            }
            None => value.to_json(),
        };
        let display = json_display(&choice);
        Cell::value(CellData::Choice(choice), display)
    }
}
