use super::{ColumnKind, ColumnProps, ColumnType, SortMode};
use crate::cell::{Cell, CellData, CellError};
use crate::coerce::{count_decimals, to_safe_number};
use crate::data::{RawValue, format_plain_number};
use crate::format::format_number;

/// Progress-bar column: a number drawn between `min_value` and `max_value`.
#[derive(Debug)]
pub struct RangeColumn {
    min: f64,
    max: f64,
    decimals: Option<usize>,
    format: Option<String>,
}

impl RangeColumn {
    pub fn new(props: &ColumnProps) -> Self {
        let default_max = if props.physical_type.is_integer() { 100.0 } else { 1.0 };
        Self {
            min: props.param_f64("min_value").unwrap_or(0.0),
            max: props.param_f64("max_value").unwrap_or(default_max),
            decimals: props
                .param_f64("step")
                .filter(|step| *step > 0.0)
                .map(count_decimals),
            format: props.param_str("format").map(str::to_string),
        }
    }

    fn bounds_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }
}

impl ColumnType for RangeColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Range
    }

    fn sort_mode(&self) -> SortMode {
        SortMode::Smart
    }

    fn is_editable(&self) -> bool {
        false
    }

    fn encode(&self, value: &RawValue, _validate: bool) -> Cell {
        if !self.bounds_valid() {
            return Cell::from(CellError::InvalidBounds {
                min: format_plain_number(self.min),
                max: format_plain_number(self.max),
            });
        }
        let number = match to_safe_number(value) {
            Ok(Some(number)) => number.clamp(self.min, self.max),
            Ok(None) => return Cell::missing(),
            Err(err) => return Cell::from(err),
        };
        let display = match format_number(number, self.format.as_deref(), self.decimals) {
            Ok(display) => display,
            Err(err) => {
                return Cell::from(CellError::Format {
                    input: format_plain_number(number),
                    format: err.format,
                    reason: err.reason,
                });
            }
        };
        Cell::value(
            CellData::Progress {
                value: number,
                min: self.min,
                max: self.max,
            },
            display,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PhysicalType;
    use serde_json::json;

    #[test]
    fn default_bounds_depend_on_physical_type() {
        let ints = RangeColumn::new(&ColumnProps::new(0, "p", ColumnKind::Range, PhysicalType::Int32));
        let cell = ints.encode(&RawValue::Int(140), false);
        assert_eq!(ints.decode(&cell), Some(json!(100)));

        let floats =
            RangeColumn::new(&ColumnProps::new(0, "p", ColumnKind::Range, PhysicalType::Float64));
        let cell = floats.encode(&RawValue::Float(-0.5), false);
        assert_eq!(floats.decode(&cell), Some(json!(0)));
    }

    #[test]
    fn inverted_bounds_produce_error_cells() {
        let props = ColumnProps::new(0, "p", ColumnKind::Range, PhysicalType::Float64)
            .with_param("min_value", json!(5))
            .with_param("max_value", json!(1));
        let cell = RangeColumn::new(&props).encode(&RawValue::Float(2.0), false);
        assert!(cell.is_error());
    }

    #[test]
    fn progress_is_read_only() {
        let col = RangeColumn::new(&ColumnProps::new(0, "p", ColumnKind::Range, PhysicalType::Float64));
        assert!(!col.is_editable());
        assert_eq!(col.sort_mode(), SortMode::Smart);
    }
}
