use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::script::ColumnRef;
use crate::sort::SortDirection;

#[derive(Debug, Parser)]
#[command(author, version, about = "Inspect and edit tabular snapshots", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the resolved columns of a snapshot
    Columns(ColumnsArgs),
    /// Render the display strings of a snapshot in a formatted table
    Preview(PreviewArgs),
    /// Replay an edit script against a snapshot and emit the edit payload
    Apply(ApplyArgs),
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Snapshot file (.json, .yaml, .yml, .csv, .tsv; '-' reads JSON from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column configuration file (.json or .yaml)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    /// Sort before rendering, e.g. `price:desc` or `2:asc`
    #[arg(long, value_parser = parse_sort_spec)]
    pub sort: Option<SortSpec>,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Edit script applied before rendering
    #[arg(short = 'e', long = "edits")]
    pub edits: Option<PathBuf>,
    /// Allow the edit script to append and delete rows
    #[arg(long)]
    pub dynamic: bool,
    /// Prefix each row with its visible row number
    #[arg(long = "row-numbers")]
    pub row_numbers: bool,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    /// Edit script (.json or .yaml)
    #[arg(short = 'e', long = "edits")]
    pub edits: PathBuf,
    /// Output file for the payload (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Pretty-print the payload JSON
    #[arg(long)]
    pub pretty: bool,
    /// Allow the edit script to append and delete rows
    #[arg(long)]
    pub dynamic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

pub fn parse_sort_spec(value: &str) -> Result<SortSpec, String> {
    let (column, direction) = match value.rsplit_once(':') {
        Some((column, direction)) => (
            column,
            direction
                .parse::<SortDirection>()
                .map_err(|err| err.to_string())?,
        ),
        None => (value, SortDirection::Asc),
    };
    let column = column.trim();
    if column.is_empty() {
        return Err("Sort column cannot be empty".to_string());
    }
    let column = match column.parse::<usize>() {
        Ok(position) => ColumnRef::Position(position),
        Err(_) => ColumnRef::Name(column.to_string()),
    };
    Ok(SortSpec { column, direction })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_specs_accept_names_positions_and_directions() {
        let spec = parse_sort_spec("price:desc").unwrap();
        assert_eq!(spec.column, ColumnRef::Name("price".into()));
        assert_eq!(spec.direction, SortDirection::Desc);

        let spec = parse_sort_spec("2").unwrap();
        assert_eq!(spec.column, ColumnRef::Position(2));
        assert_eq!(spec.direction, SortDirection::Asc);

        assert!(parse_sort_spec(":asc").is_err());
        assert!(parse_sort_spec("price:sideways").is_err());
    }
}
