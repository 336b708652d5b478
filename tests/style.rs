use datagrid_core::style::{extract_css_property, theme_for_anchor};

const SHEET: &str = "#row0, #row1 { color: white; background-color: pink }";

#[test]
fn grouped_selectors_share_declarations() {
    assert_eq!(
        extract_css_property("#row1", "color", SHEET).as_deref(),
        Some("white")
    );
    assert_eq!(
        extract_css_property("#row1", "background-color", SHEET).as_deref(),
        Some("pink")
    );
    assert_eq!(extract_css_property("#row2", "color", SHEET), None);
}

#[test]
fn selectors_must_match_exactly() {
    // `#row1` must not match `#row10`.
    let css = "#row10 { color: red }";
    assert_eq!(extract_css_property("#row1", "color", css), None);
    assert_eq!(theme_for_anchor("#row1", css), None);
}

#[test]
fn empty_or_malformed_sheets_yield_nothing() {
    assert_eq!(extract_css_property("#a", "color", ""), None);
    assert_eq!(extract_css_property("#a", "color", "#a { color }"), None);
    assert_eq!(extract_css_property("#a", "color", "#a color: red"), None);
}
