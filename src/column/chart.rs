use itertools::Itertools;

use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData, CellError};
use crate::coerce::{json_display, to_safe_array, to_safe_number};
use crate::data::{RawValue, format_plain_number};

/// Line, bar and area sparklines over a numeric sequence. Read-only.
#[derive(Debug)]
pub struct ChartColumn {
    kind: ColumnKind,
    y_min: Option<f64>,
    y_max: Option<f64>,
}

impl ChartColumn {
    pub fn new(kind: ColumnKind, props: &ColumnProps) -> Self {
        Self {
            kind,
            y_min: props.param_f64("y_min"),
            y_max: props.param_f64("y_max"),
        }
    }

    fn numbers(&self, value: &RawValue) -> Result<Vec<f64>, CellError> {
        to_safe_array(value)
            .into_iter()
            .map(|item| match to_safe_number(&RawValue::from(item.clone())) {
                Ok(Some(number)) => Ok(number),
                _ => Err(CellError::NotANumericArray {
                    input: value.to_string(),
                    element: json_display(&item),
                }),
            })
            .collect()
    }

    /// Scales values into `[0, 1]`. Data already inside that interval is kept
    /// unless explicit y bounds are configured.
    fn normalize(&self, values: &[f64]) -> Vec<f64> {
        let (data_min, data_max) = values
            .iter()
            .copied()
            .minmax_by(f64::total_cmp)
            .into_option()
            .unwrap_or((0.0, 1.0));
        if self.y_min.is_none() && self.y_max.is_none() && data_min >= 0.0 && data_max <= 1.0 {
            return values.to_vec();
        }
        let low = self.y_min.unwrap_or(data_min);
        let high = self.y_max.unwrap_or(data_max);
        let span = high - low;
        values
            .iter()
            .map(|v| {
                if span <= 0.0 {
                    1.0
                } else {
                    ((v - low) / span).clamp(0.0, 1.0)
                }
            })
            .collect()
    }
}

impl ColumnType for ChartColumn {
    fn kind(&self) -> ColumnKind {
        self.kind.clone()
    }

    fn is_editable(&self) -> bool {
        false
    }

    fn encode(&self, value: &RawValue, _validate: bool) -> Cell {
        let values = match self.numbers(value) {
            Ok(values) if values.is_empty() => return Cell::missing(),
            Ok(values) => values,
            Err(err) => return Cell::from(err),
        };
        let display = values.iter().map(|v| format_plain_number(*v)).join(", ");
        let normalized = self.normalize(&values);
        Cell::value(CellData::Chart { values, normalized }, display)
    }
}
