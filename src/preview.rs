use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, io_utils, load_editor, script, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let mut editor = load_editor(&args.snapshot, args.dynamic)?;

    if let Some(path) = &args.edits {
        let commands = io_utils::load_script(path)?;
        let report = script::apply_script(&mut editor, &commands)
            .with_context(|| format!("Applying edits from {path:?}"))?;
        info!(
            "Applied {} edit command(s), rejected {}",
            report.applied, report.rejected
        );
    }
    if let Some(spec) = &args.sort {
        let col = spec.column.resolve(&editor)?;
        editor.sort(col, spec.direction)?;
    }

    let visible = editor
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| !column.is_hidden())
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    let mut headers = Vec::with_capacity(visible.len() + 1);
    let mut alignments = Vec::with_capacity(visible.len() + 1);
    if args.row_numbers {
        headers.push("#".to_string());
        alignments.push(crate::cell::Alignment::Right);
    }
    for &col in &visible {
        let column = &editor.columns()[col];
        headers.push(column.title().to_string());
        alignments.push(column.alignment().unwrap_or_default());
    }

    let row_count = args.rows.min(editor.num_rows());
    let mut rows = Vec::with_capacity(row_count);
    for row in 0..row_count {
        let mut line = Vec::with_capacity(headers.len());
        if args.row_numbers {
            line.push(row.to_string());
        }
        for &col in &visible {
            line.push(editor.cell(col, row).display().to_string());
        }
        rows.push(line);
    }

    table::print_table(&headers, &rows, &alignments);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        editor.num_rows(),
        args.snapshot.input
    );
    Ok(())
}
