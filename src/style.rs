//! Minimal reader for the CSS rule lists attached to styled source tables.

use std::sync::OnceLock;

use regex::Regex;

use crate::cell::ThemeOverride;

fn rule_regex() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| Regex::new(r"([^{}]*)\{([^{}]*)\}").expect("valid css rule regex"))
}

/// Value of `property` declared for `anchor`, e.g. `#T_abcrow0_col1`.
///
/// Selectors are comma-separated and compared after trimming. When several
/// rules (or several declarations within one rule) set the property, the
/// last one wins.
pub fn extract_css_property(anchor: &str, property: &str, css: &str) -> Option<String> {
    let mut found = None;
    for caps in rule_regex().captures_iter(css) {
        let (Some(selectors), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if !selectors
            .as_str()
            .split(',')
            .any(|selector| selector.trim() == anchor)
        {
            continue;
        }
        for declaration in body.as_str().split(';') {
            if let Some((name, value)) = declaration.split_once(':')
                && name.trim().eq_ignore_ascii_case(property)
            {
                let value = value.trim();
                if !value.is_empty() {
                    found = Some(value.to_string());
                }
            }
        }
    }
    found
}

/// Text and background colors for a styled cell, if any are declared.
pub fn theme_for_anchor(anchor: &str, css: &str) -> Option<ThemeOverride> {
    let theme = ThemeOverride {
        text_color: extract_css_property(anchor, "color", css),
        background: extract_css_property(anchor, "background-color", css),
    };
    (!theme.is_empty()).then_some(theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS: &str = "#T_7e5d0row0_col0, #T_7e5d0row1_col0 { color: white; background-color: pink }";

    #[test]
    fn matches_any_selector_in_a_group() {
        for anchor in ["#T_7e5d0row0_col0", "#T_7e5d0row1_col0"] {
            assert_eq!(
                extract_css_property(anchor, "color", CSS).as_deref(),
                Some("white")
            );
            assert_eq!(
                extract_css_property(anchor, "background-color", CSS).as_deref(),
                Some("pink")
            );
        }
        assert_eq!(extract_css_property("#T_7e5d0row2_col0", "color", CSS), None);
    }

    #[test]
    fn tolerates_irregular_whitespace() {
        let css = "#a{color:red}\n  #b ,#c   {  color :  blue ;  }";
        assert_eq!(extract_css_property("#a", "color", css).as_deref(), Some("red"));
        assert_eq!(extract_css_property("#c", "color", css).as_deref(), Some("blue"));
    }

    #[test]
    fn last_declaration_wins() {
        let css = "#a { color: red; color: green } #a { color: blue }";
        assert_eq!(extract_css_property("#a", "color", css).as_deref(), Some("blue"));
        let css = "#a { color: red; color: green }";
        assert_eq!(extract_css_property("#a", "color", css).as_deref(), Some("green"));
    }

    #[test]
    fn color_does_not_match_background_color() {
        let css = "#a { background-color: pink }";
        assert_eq!(extract_css_property("#a", "color", css), None);
        let theme = theme_for_anchor("#a", css).unwrap();
        assert_eq!(theme.background.as_deref(), Some("pink"));
        assert_eq!(theme.text_color, None);
        assert_eq!(theme_for_anchor("#z", css), None);
    }
}
