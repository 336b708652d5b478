use regex::Regex;

use super::text::{compile_pattern, validate_text};
use super::{ColumnKind, ColumnProps, ColumnType};
use crate::cell::{Cell, CellData};
use crate::coerce::{is_missing, to_safe_string};
use crate::data::RawValue;

/// How a link's visible label is produced.
#[derive(Debug)]
enum DisplayText {
    /// Show the URL itself.
    Url,
    Static(String),
    /// First capture group of the pattern, or the URL when it does not match.
    Extract(Regex),
}

#[derive(Debug)]
pub struct UrlColumn {
    max_chars: Option<usize>,
    pattern: Option<Regex>,
    display_text: DisplayText,
}

impl UrlColumn {
    pub fn new(props: &ColumnProps) -> Self {
        let display_text = match props.param_str("display_text").filter(|t| !t.is_empty()) {
            None => DisplayText::Url,
            Some(text) if looks_like_pattern(text) => match Regex::new(text) {
                Ok(regex) if regex.captures_len() > 1 => DisplayText::Extract(regex),
                _ => DisplayText::Static(text.to_string()),
            },
            Some(text) => DisplayText::Static(text.to_string()),
        };
        Self {
            max_chars: props.param_usize("max_chars"),
            pattern: compile_pattern(&props.name, props.param_str("validate")),
            display_text,
        }
    }

    fn label(&self, href: &str) -> Option<String> {
        match &self.display_text {
            DisplayText::Url => None,
            DisplayText::Static(text) => Some(text.clone()),
            DisplayText::Extract(regex) => regex
                .captures(href)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        }
    }
}

fn looks_like_pattern(text: &str) -> bool {
    text.starts_with('^') || (text.contains('(') && text.contains(')'))
}

impl ColumnType for UrlColumn {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Url
    }

    fn encode(&self, value: &RawValue, validate: bool) -> Cell {
        if is_missing(value) {
            return Cell::missing();
        }
        let href = to_safe_string(value);
        let href = if validate {
            match validate_text(href, self.max_chars, self.pattern.as_ref()) {
                Ok(href) => href,
                Err(err) => return Cell::from(err),
            }
        } else {
            href
        };
        let label = self.label(&href);
        let display = label.clone().unwrap_or_else(|| href.clone());
        Cell::value(CellData::Link { href, label }, display)
    }
}
