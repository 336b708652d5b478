//! Replayable edit scripts, as consumed by `datagrid apply`.
//!
//! ```yaml
//! - op: edit
//!   column: price
//!   row: 0
//!   value: 12.5
//! - op: sort
//!   column: 1
//!   direction: desc
//! - op: clear_sort
//! ```

use anyhow::{Result, anyhow, bail};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::coerce::json_display;
use crate::data::RawValue;
use crate::editor::{DataEditor, EditorError};
use crate::sort::SortDirection;

/// A column addressed by position or by id/name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Position(usize),
    Name(String),
}

impl ColumnRef {
    pub fn resolve(&self, editor: &DataEditor) -> Result<usize> {
        match self {
            ColumnRef::Position(col) if *col < editor.num_columns() => Ok(*col),
            ColumnRef::Position(col) => Err(anyhow!(
                "Column {col} is out of bounds ({} column(s))",
                editor.num_columns()
            )),
            ColumnRef::Name(name) => editor
                .snapshot()
                .find_column(name)
                .ok_or_else(|| anyhow!("Column '{name}' not found")),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Position(col) => write!(f, "#{col}"),
            ColumnRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    Edit {
        column: ColumnRef,
        row: usize,
        value: JsonValue,
    },
    Paste {
        column: ColumnRef,
        row: usize,
        rows: Vec<Vec<JsonValue>>,
    },
    Append,
    Delete {
        rows: Vec<usize>,
    },
    Sort {
        column: ColumnRef,
        #[serde(default)]
        direction: SortDirection,
    },
    ClearSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptReport {
    pub applied: usize,
    pub rejected: usize,
}

/// Replays `commands` in order. Edits the editor refuses (read-only cells,
/// invalid input, row policy) are logged and counted; addressing errors
/// abort the script.
pub fn apply_script(editor: &mut DataEditor, commands: &[EditCommand]) -> Result<ScriptReport> {
    let mut report = ScriptReport::default();
    for (step, command) in commands.iter().enumerate() {
        debug!("Step {step}: {command:?}");
        match apply_command(editor, command) {
            Ok(()) => report.applied += 1,
            Err(err) => match err.downcast_ref::<EditorError>() {
                Some(
                    EditorError::ReadOnly { .. }
                    | EditorError::InvalidInput { .. }
                    | EditorError::SortActive
                    | EditorError::FixedRows,
                ) => {
                    warn!("Step {step} rejected: {err}");
                    report.rejected += 1;
                }
                _ => bail!("Step {step} failed: {err}"),
            },
        }
    }
    Ok(report)
}

fn apply_command(editor: &mut DataEditor, command: &EditCommand) -> Result<()> {
    match command {
        EditCommand::Edit { column, row, value } => {
            let col = column.resolve(editor)?;
            editor.edit_cell(col, *row, RawValue::from(value.clone()))?;
        }
        EditCommand::Paste { column, row, rows } => {
            let col = column.resolve(editor)?;
            let block = rows
                .iter()
                .map(|values| values.iter().map(json_display).collect())
                .collect::<Vec<Vec<String>>>();
            editor.paste(col, *row, &block)?;
        }
        EditCommand::Append => {
            editor.append_row()?;
        }
        EditCommand::Delete { rows } => {
            editor.delete_rows(rows)?;
        }
        EditCommand::Sort { column, direction } => {
            let col = column.resolve(editor)?;
            editor.sort(col, *direction)?;
        }
        EditCommand::ClearSort => editor.clear_sort(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_from_yaml() {
        let yaml = "- op: edit\n  column: price\n  row: 0\n  value: 3\n- op: sort\n  column: 1\n- op: clear_sort\n- op: delete\n  rows: [2, 0]\n";
        let commands: Vec<EditCommand> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[1],
            EditCommand::Sort {
                column: ColumnRef::Position(1),
                direction: SortDirection::Asc
            }
        );
        assert!(matches!(
            &commands[0],
            EditCommand::Edit { column: ColumnRef::Name(name), .. } if name == "price"
        ));
    }

    #[test]
    fn unknown_ops_are_rejected() {
        let result: serde_json::Result<Vec<EditCommand>> =
            serde_json::from_str(r#"[{"op": "truncate"}]"#);
        assert!(result.is_err());
    }
}
