//! Column listing for a snapshot.
//!
//! Resolves every column (index columns first) through the configuration and
//! the kind registry, and renders the outcome as an ASCII table.

use anyhow::Result;
use log::info;

use crate::{cli::ColumnsArgs, load_snapshot, table};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;

    let mut rows = Vec::with_capacity(snapshot.num_columns());
    for column in snapshot.columns() {
        let props = column.props();
        let mut flags = Vec::new();
        if column.is_index() {
            flags.push("index");
        }
        if !column.is_editable() {
            flags.push("read-only");
        }
        if column.is_required() {
            flags.push("required");
        }
        if column.is_hidden() {
            flags.push("hidden");
        }
        rows.push(vec![
            column.index_number().to_string(),
            column.id().to_string(),
            column.name().to_string(),
            column.title().to_string(),
            column.kind().to_string(),
            props.physical_type.describe(),
            column
                .alignment()
                .map(|a| a.as_str().to_string())
                .unwrap_or_default(),
            props.width.map(|w| w.to_string()).unwrap_or_default(),
            flags.join(","),
        ]);
    }

    let headers = ["#", "id", "name", "title", "kind", "physical", "align", "width", "flags"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows, &[]);
    info!(
        "Listed {} column(s) from {:?}",
        snapshot.num_columns(),
        args.snapshot.input
    );
    Ok(())
}
