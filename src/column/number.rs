use super::{ColumnKind, ColumnProps, ColumnType, SortMode};
use crate::cell::{Cell, CellData, CellError};
use crate::coerce::{count_decimals, is_unsafe_integer, to_safe_number, truncate_decimals};
use crate::data::{RawValue, format_plain_number};
use crate::format::format_number;

/// Numeric column.
///
/// With validation on, `min_value` rejects smaller input while `max_value`
/// clamps larger input down to the bound.
#[derive(Debug)]
pub struct NumberColumn {
    min: Option<f64>,
    max: Option<f64>,
    decimals: Option<usize>,
    format: Option<String>,
}

impl NumberColumn {
    pub fn new(props: &ColumnProps) -> Self {
        let physical = &props.physical_type;
        let step = props
            .param_f64("step")
            .filter(|step| *step > 0.0)
            .or(physical.is_integer().then_some(1.0));
        let min = props
            .param_f64("min_value")
            .or(physical.is_unsigned().then_some(0.0));
        Self {
            min,
            max: props.param_f64("max_value"),
            decimals: step.map(count_decimals),
            format: props.param_str("format").map(str::to_string),
        }
    }

    fn coerce(&self, value: &RawValue, validate: bool) -> Result<Option<f64>, CellError> {
        let Some(mut number) = to_safe_number(value)? else {
            return Ok(None);
        };
        if validate {
            if let Some(min) = self.min
                && number < min
            {
                return Err(CellError::BelowMinimum {
                    input: format_plain_number(number),
                    min: format_plain_number(min),
                });
            }
            if let Some(max) = self.max
                && number > max
            {
                number = max;
            }
        }
        if let Some(decimals) = self.decimals {
            number = truncate_decimals(number, decimals);
        }
        if is_unsafe_integer(number) {
            return Err(CellError::UnsafeInteger {
                input: format_plain_number(number),
            });
        }
        Ok(Some(number))
    }
}

impl ColumnType for NumberColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Number
    }

    fn sort_mode(&self) -> SortMode {
        SortMode::Smart
    }

    fn encode(&self, value: &RawValue, validate: bool) -> Cell {
        let number = match self.coerce(value, validate) {
            Ok(Some(number)) => number,
            Ok(None) => return Cell::missing(),
            Err(err) => return Cell::from(err),
        };
        match format_number(number, self.format.as_deref(), self.decimals) {
            Ok(display) => Cell::value(CellData::Number(number), display),
            Err(err) => Cell::from(CellError::Format {
                input: format_plain_number(number),
                format: err.format,
                reason: err.reason,
            }),
        }
    }
}
