use std::borrow::Cow;
use std::fmt::Write as _;

use crate::cell::Alignment;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    render_aligned_table(headers, rows, &[])
}

/// Renders a plain-text table. Columns without an entry in `alignments` are
/// left-aligned.
pub fn render_aligned_table(
    headers: &[String],
    rows: &[Vec<String>],
    alignments: &[Alignment],
) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(&sanitize_cell(cell)));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();

    let header_line = format_row(headers, &widths, &[]);
    let _ = writeln!(output, "{header_line}");

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let separator_line = format_row(&separator_cells, &separator_widths, &[]);
    let _ = writeln!(output, "{separator_line}");

    for row in rows {
        let row_line = format_row(row, &widths, alignments);
        let _ = writeln!(output, "{row_line}");
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>], alignments: &[Alignment]) {
    let rendered = render_aligned_table(headers, rows, alignments);
    print!("{rendered}");
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Alignment]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized = sanitize_cell(value);
        let display = display_width(sanitized.as_ref());
        let padding = widths
            .get(idx)
            .copied()
            .unwrap_or_default()
            .saturating_sub(display);
        let (left, right) = match alignments.get(idx).copied().unwrap_or(Alignment::Left) {
            Alignment::Left => (0, padding),
            Alignment::Right => (padding, 0),
            Alignment::Center => (padding / 2, padding - padding / 2),
        };
        cells.push(format!(
            "{}{}{}",
            " ".repeat(left),
            sanitized,
            " ".repeat(right)
        ));
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else if ch != '\u{fe0f}' {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        let mut sanitized = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\n' | '\r' | '\t' => sanitized.push(' '),
                other => sanitized.push(other),
            }
        }
        Cow::Owned(sanitized)
    } else {
        Cow::Borrowed(value)
    }
}
