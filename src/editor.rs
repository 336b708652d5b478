//! Controller tying a snapshot, its edits and the active sort together.
//!
//! Every public row index here is a *visible* row: it goes through the sort
//! permutation first, then through the tombstones of the editing state.

use log::{debug, info, warn};
use thiserror::Error;

use crate::cell::{Cell, CellError};
use crate::column::Column;
use crate::data::RawValue;
use crate::editing::{EditPayload, EditingState, RowIndex};
use crate::snapshot::TableSnapshot;
use crate::sort::{CellSource, SortDirection, SortIndexMapper};

/// Whether rows may be appended and deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    #[default]
    Fixed,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("Column {col} is out of bounds ({columns} column(s))")]
    ColumnOutOfBounds { col: usize, columns: usize },
    #[error("Row {row} is out of bounds ({rows} row(s))")]
    RowOutOfBounds { row: usize, rows: usize },
    #[error("Column '{column}' is read-only")]
    ReadOnly { column: String },
    #[error("{message}")]
    InvalidInput {
        message: String,
        details: Option<String>,
    },
    #[error("Rows cannot be added while the table is sorted")]
    SortActive,
    #[error("The table has a fixed number of rows")]
    FixedRows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasteSummary {
    pub applied: usize,
    pub skipped: usize,
    pub rows_added: usize,
}

/// The snapshot with edits, appended rows and deletions applied, addressed by
/// deletion-compressed row.
#[derive(Debug, Clone, Copy)]
pub struct EditedView<'a> {
    snapshot: &'a TableSnapshot,
    editing: &'a EditingState,
}

impl<'a> EditedView<'a> {
    pub fn new(snapshot: &'a TableSnapshot, editing: &'a EditingState) -> Self {
        Self { snapshot, editing }
    }
}

impl CellSource for EditedView<'_> {
    fn num_rows(&self) -> usize {
        self.editing.num_rows()
    }

    fn column(&self, col: usize) -> Option<&Column> {
        self.snapshot.column(col)
    }

    fn cell(&self, col: usize, row: usize) -> Cell {
        let Some(column) = self.snapshot.column(col) else {
            return Cell::from(CellError::OutOfBounds { col, row });
        };
        if row >= self.editing.num_rows() {
            return Cell::from(CellError::OutOfBounds { col, row });
        }
        let index = self.editing.get_original_row_index(row);
        if let Some(cell) = self.editing.get_cell(col, index) {
            return cell.clone();
        }
        match index {
            RowIndex::Original(original) => self.snapshot.cell(col, original),
            RowIndex::Added(_) => column.encode(&RawValue::Null, false),
        }
    }
}

#[derive(Debug)]
pub struct DataEditor {
    snapshot: TableSnapshot,
    editing: EditingState,
    sorter: SortIndexMapper,
    policy: RowPolicy,
}

impl DataEditor {
    pub fn new(snapshot: TableSnapshot, policy: RowPolicy) -> Self {
        let editing = EditingState::new(snapshot.num_rows());
        Self {
            snapshot,
            editing,
            sorter: SortIndexMapper::new(),
            policy,
        }
    }

    pub fn snapshot(&self) -> &TableSnapshot {
        &self.snapshot
    }

    pub fn editing(&self) -> &EditingState {
        &self.editing
    }

    pub fn policy(&self) -> RowPolicy {
        self.policy
    }

    pub fn columns(&self) -> &[Column] {
        self.snapshot.columns()
    }

    pub fn num_columns(&self) -> usize {
        self.snapshot.num_columns()
    }

    pub fn num_rows(&self) -> usize {
        self.editing.num_rows()
    }

    pub fn sort_state(&self) -> Option<(usize, SortDirection)> {
        self.sorter.state()
    }

    pub fn view(&self) -> EditedView<'_> {
        EditedView::new(&self.snapshot, &self.editing)
    }

    pub fn cell(&self, col: usize, visible: usize) -> Cell {
        self.sorter.cell(&self.view(), col, visible)
    }

    /// Encodes `value` with validation and stores it. Rejected edits leave
    /// the state untouched.
    pub fn edit_cell(
        &mut self,
        col: usize,
        visible: usize,
        value: RawValue,
    ) -> Result<Cell, EditorError> {
        let column = self.checked_column(col)?;
        self.check_row(visible)?;
        if !column.is_editable() {
            warn!("Rejected edit of read-only column '{}'", column.name());
            return Err(EditorError::ReadOnly {
                column: column.name().to_string(),
            });
        }
        let cell = column.encode(&value, true);
        if let Cell::Error(error) = &cell {
            warn!(
                "Rejected edit of column '{}' row {visible}: {}",
                column.name(),
                error.message
            );
            return Err(EditorError::InvalidInput {
                message: error.message.clone(),
                details: error.details.clone(),
            });
        }
        let row = self.row_index(visible);
        self.editing.set_cell(col, row, cell.clone());
        self.refresh();
        Ok(cell)
    }

    /// Pastes a block of text starting at (`col`, `visible`). Cells that are
    /// read-only, off the grid, or fail validation are skipped.
    pub fn paste(
        &mut self,
        col: usize,
        visible: usize,
        block: &[Vec<String>],
    ) -> Result<PasteSummary, EditorError> {
        self.checked_column(col)?;
        if visible > self.num_rows() {
            return Err(EditorError::RowOutOfBounds {
                row: visible,
                rows: self.num_rows(),
            });
        }
        let mut summary = PasteSummary::default();
        for (offset, values) in block.iter().enumerate() {
            let target = visible + offset;
            if target >= self.num_rows() {
                if self.policy == RowPolicy::Fixed || self.sorter.is_active() {
                    summary.skipped += values.len();
                    continue;
                }
                self.push_default_row();
                summary.rows_added += 1;
            }
            let row = self.row_index(target);
            for (shift, text) in values.iter().enumerate() {
                let Some(column) = self.snapshot.column(col + shift) else {
                    summary.skipped += 1;
                    continue;
                };
                if !column.is_editable() {
                    summary.skipped += 1;
                    continue;
                }
                let cell = column.encode(&RawValue::Text(text.clone()), true);
                if cell.is_error() {
                    debug!("Skipping pasted value '{text}' for column '{}'", column.name());
                    summary.skipped += 1;
                    continue;
                }
                self.editing.set_cell(col + shift, row, cell);
                summary.applied += 1;
            }
        }
        self.refresh();
        info!(
            "Pasted {} cell(s), skipped {}, added {} row(s)",
            summary.applied, summary.skipped, summary.rows_added
        );
        Ok(summary)
    }

    /// Appends a row seeded from column defaults and returns its visible index.
    pub fn append_row(&mut self) -> Result<usize, EditorError> {
        if self.policy == RowPolicy::Fixed {
            return Err(EditorError::FixedRows);
        }
        if self.sorter.is_active() {
            return Err(EditorError::SortActive);
        }
        self.push_default_row();
        Ok(self.num_rows() - 1)
    }

    /// Deletes visible rows and returns how many distinct rows were removed.
    pub fn delete_rows(&mut self, visible: &[usize]) -> Result<usize, EditorError> {
        if self.policy == RowPolicy::Fixed {
            return Err(EditorError::FixedRows);
        }
        for &row in visible {
            self.check_row(row)?;
        }
        let mut rows = visible
            .iter()
            .map(|&row| self.row_index(row))
            .collect::<Vec<_>>();
        rows.sort_unstable();
        rows.dedup();
        self.editing.delete_rows(&rows);
        self.refresh();
        Ok(rows.len())
    }

    pub fn sort(&mut self, col: usize, direction: SortDirection) -> Result<(), EditorError> {
        self.checked_column(col)?;
        let view = EditedView::new(&self.snapshot, &self.editing);
        self.sorter.sort_by(&view, col, direction);
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.sorter.clear();
    }

    /// Swaps in a new snapshot. Edits survive only when the row count is
    /// unchanged; a sort on a vanished column is dropped.
    pub fn replace_snapshot(&mut self, snapshot: TableSnapshot) {
        if snapshot.num_rows() != self.snapshot.num_rows() {
            info!(
                "Row count changed from {} to {}; discarding edits",
                self.snapshot.num_rows(),
                snapshot.num_rows()
            );
            self.editing = EditingState::new(snapshot.num_rows());
        }
        self.snapshot = snapshot;
        if let Some((col, _)) = self.sorter.state()
            && col >= self.snapshot.num_columns()
        {
            self.sorter.clear();
        }
        self.refresh();
    }

    pub fn commit(&self) -> EditPayload {
        self.editing.serialize(self.snapshot.columns())
    }

    pub fn restore(&mut self, payload: &EditPayload) {
        self.editing.restore(payload, self.snapshot.columns());
        self.refresh();
    }

    fn checked_column(&self, col: usize) -> Result<&Column, EditorError> {
        self.snapshot
            .column(col)
            .ok_or(EditorError::ColumnOutOfBounds {
                col,
                columns: self.snapshot.num_columns(),
            })
    }

    fn check_row(&self, visible: usize) -> Result<(), EditorError> {
        if visible < self.num_rows() {
            Ok(())
        } else {
            Err(EditorError::RowOutOfBounds {
                row: visible,
                rows: self.num_rows(),
            })
        }
    }

    fn row_index(&self, visible: usize) -> RowIndex {
        self.editing
            .get_original_row_index(self.sorter.to_unsorted_row(visible))
    }

    fn push_default_row(&mut self) {
        let cells = self
            .snapshot
            .columns()
            .iter()
            .map(Column::default_cell)
            .collect();
        self.editing.add_row(cells);
    }

    fn refresh(&mut self) {
        let view = EditedView::new(&self.snapshot, &self.editing);
        self.sorter.refresh(&view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnConfigMap;
    use crate::source::{Field, PhysicalType, SourceColumn, SourceTable};

    fn editor(policy: RowPolicy) -> DataEditor {
        let table = SourceTable::new(
            Vec::new(),
            vec![SourceColumn::new(
                Field::new("n", PhysicalType::Int64),
                vec![RawValue::Int(3), RawValue::Int(1), RawValue::Int(2)],
            )],
            None,
        )
        .unwrap();
        DataEditor::new(TableSnapshot::new(table, &ColumnConfigMap::new()), policy)
    }

    #[test]
    fn edits_go_through_the_sort_permutation() {
        let mut editor = editor(RowPolicy::Fixed);
        editor.sort(0, SortDirection::Asc).unwrap();
        assert_eq!(editor.cell(0, 0).display(), "1");
        editor.edit_cell(0, 0, RawValue::Int(10)).unwrap();
        assert_eq!(editor.cell(0, 2).display(), "10");
        let payload = editor.commit();
        let key = payload.edited_cells.keys().next().unwrap();
        assert_eq!(key.to_string(), "0:1");
    }

    #[test]
    fn invalid_input_is_not_stored() {
        let mut editor = editor(RowPolicy::Fixed);
        let err = editor
            .edit_cell(0, 0, RawValue::Text("abc".into()))
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput { .. }));
        assert!(editor.editing().is_empty());
    }

    #[test]
    fn append_is_refused_while_sorted_or_fixed() {
        let mut fixed = editor(RowPolicy::Fixed);
        assert_eq!(fixed.append_row(), Err(EditorError::FixedRows));

        let mut dynamic = editor(RowPolicy::Dynamic);
        dynamic.sort(0, SortDirection::Desc).unwrap();
        assert_eq!(dynamic.append_row(), Err(EditorError::SortActive));
        dynamic.clear_sort();
        assert_eq!(dynamic.append_row(), Ok(3));
        assert!(dynamic.cell(0, 3).is_missing());
    }
}
