//! Replays an edit script and writes the resulting transport payload.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ApplyArgs, io_utils, load_editor, script};

pub fn execute(args: &ApplyArgs) -> Result<()> {
    let mut editor = load_editor(&args.snapshot, args.dynamic)?;
    let commands = io_utils::load_script(&args.edits)?;
    let report = script::apply_script(&mut editor, &commands)
        .with_context(|| format!("Applying edits from {:?}", args.edits))?;

    let payload = editor.commit();
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    io_utils::write_output(args.output.as_deref(), &rendered)?;
    info!(
        "Applied {} command(s) ({} rejected): {} edited cell(s), {} deleted row(s)",
        report.applied,
        report.rejected,
        payload.edited_cells.len(),
        payload.deleted_rows.len()
    );
    Ok(())
}
