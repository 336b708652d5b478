use log::warn;
use regex::{Regex, RegexBuilder};

use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData, CellError};
use crate::coerce::{is_missing, to_safe_string};
use crate::data::RawValue;

/// Compiles a `validate` pattern. Dot matches newlines; an invalid pattern is
/// logged and disables validation.
pub(crate) fn compile_pattern(column: &str, pattern: Option<&str>) -> Option<Regex> {
    let pattern = pattern.filter(|p| !p.is_empty())?;
    match RegexBuilder::new(pattern).dot_matches_new_line(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!("Ignoring invalid validation pattern '{pattern}' on column '{column}': {err}");
            None
        }
    }
}

/// Applies `max_chars` truncation, then the validation pattern.
pub(crate) fn validate_text(
    text: String,
    max_chars: Option<usize>,
    pattern: Option<&Regex>,
) -> Result<String, CellError> {
    let text = match max_chars {
        Some(limit) if limit > 0 && text.chars().count() > limit => {
            text.chars().take(limit).collect()
        }
        _ => text,
    };
    if let Some(regex) = pattern
        && !regex.is_match(&text)
    {
        return Err(CellError::PatternMismatch {
            input: text,
            pattern: regex.as_str().to_string(),
        });
    }
    Ok(text)
}

#[derive(Debug)]
pub struct TextColumn {
    max_chars: Option<usize>,
    pattern: Option<Regex>,
}

impl TextColumn {
    pub fn new(props: &ColumnProps) -> Self {
        Self {
            max_chars: props.param_usize("max_chars"),
            pattern: compile_pattern(&props.name, props.param_str("validate")),
        }
    }
}

impl ColumnType for TextColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Text
    }

    fn encode(&self, value: &RawValue, validate: bool) -> Cell {
        if is_missing(value) {
            return Cell::missing();
        }
        let text = to_safe_string(value);
        let text = if validate {
            match validate_text(text, self.max_chars, self.pattern.as_ref()) {
                Ok(text) => text,
                Err(err) => return Cell::from(err),
            }
        } else {
            text
        };
        Cell::value(CellData::Text(text.clone()), text)
    }
}
