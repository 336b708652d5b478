//! Mutable overlay of user edits on top of an immutable snapshot.
//!
//! Rows live in two index spaces: original rows `0..num_original_rows` and
//! appended rows. [`RowIndex`] keeps them apart; [`EditingState::resolve`] is
//! the only conversion from a flat index. Deleted original rows become
//! tombstones, which shift every later visible row down by one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::cell::Cell;
use crate::column::Column;
use crate::data::RawValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowIndex {
    Original(usize),
    Added(usize),
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIndex::Original(row) => write!(f, "original row {row}"),
            RowIndex::Added(row) => write!(f, "added row {row}"),
        }
    }
}

/// Address of an edited original cell. Orders by row, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub row: usize,
    pub col: usize,
}

impl CellKey {
    pub fn new(col: usize, row: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.col, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cell key '{0}', expected '<col>:<row>'")]
pub struct InvalidCellKey(pub String);

impl FromStr for CellKey {
    type Err = InvalidCellKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCellKey(value.to_string());
        let (col, row) = value.split_once(':').ok_or_else(invalid)?;
        let col = col.trim().parse().map_err(|_| invalid())?;
        let row = row.trim().parse().map_err(|_| invalid())?;
        Ok(CellKey::new(col, row))
    }
}

impl Serialize for CellKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        CellKey::from_str(&token).map_err(de::Error::custom)
    }
}

/// Transport form of the editing state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditPayload {
    #[serde(default)]
    pub edited_cells: BTreeMap<CellKey, JsonValue>,
    /// Reserved; never populated.
    #[serde(default)]
    pub added_rows: Vec<BTreeMap<String, JsonValue>>,
    #[serde(default)]
    pub deleted_rows: Vec<usize>,
}

impl EditPayload {
    /// Parses a payload, skipping (and logging) malformed cell keys and
    /// non-integer deleted rows instead of failing.
    pub fn parse_lenient(input: &str) -> serde_json::Result<Self> {
        let value: JsonValue = serde_json::from_str(input)?;
        let mut payload = EditPayload::default();
        if let Some(cells) = value.get("edited_cells").and_then(JsonValue::as_object) {
            for (key, cell) in cells {
                match CellKey::from_str(key) {
                    Ok(key) => {
                        payload.edited_cells.insert(key, cell.clone());
                    }
                    Err(err) => warn!("Skipping edited cell: {err}"),
                }
            }
        }
        if let Some(rows) = value.get("deleted_rows").and_then(JsonValue::as_array) {
            for row in rows {
                match row.as_u64().and_then(|r| usize::try_from(r).ok()) {
                    Some(row) => payload.deleted_rows.push(row),
                    None => warn!("Skipping deleted row entry {row}"),
                }
            }
        }
        Ok(payload)
    }

    pub fn is_empty(&self) -> bool {
        self.edited_cells.is_empty() && self.added_rows.is_empty() && self.deleted_rows.is_empty()
    }
}

/// One appended row; `None` marks a column nobody has filled in yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddedRow {
    cells: Vec<Option<Cell>>,
}

impl AddedRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells: cells.into_iter().map(Some).collect(),
        }
    }

    pub fn get(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)?.as_ref()
    }

    pub fn set(&mut self, col: usize, cell: Cell) {
        if col >= self.cells.len() {
            self.cells.resize(col + 1, None);
        }
        self.cells[col] = Some(cell);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditingState {
    num_original_rows: usize,
    edited_cells: BTreeMap<CellKey, Cell>,
    added_rows: Vec<AddedRow>,
    /// Ascending, without duplicates.
    deleted_rows: Vec<usize>,
}

impl EditingState {
    pub fn new(num_original_rows: usize) -> Self {
        Self {
            num_original_rows,
            ..Self::default()
        }
    }

    pub fn num_original_rows(&self) -> usize {
        self.num_original_rows
    }

    /// Splits a flat row index into original and added space.
    pub fn resolve(&self, flat: usize) -> RowIndex {
        if flat < self.num_original_rows {
            RowIndex::Original(flat)
        } else {
            RowIndex::Added(flat - self.num_original_rows)
        }
    }

    pub fn get_cell(&self, col: usize, row: RowIndex) -> Option<&Cell> {
        match row {
            RowIndex::Original(row) => self.edited_cells.get(&CellKey::new(col, row)),
            RowIndex::Added(row) => self.added_rows.get(row)?.get(col),
        }
    }

    pub fn set_cell(&mut self, col: usize, row: RowIndex, cell: Cell) {
        match row {
            RowIndex::Original(row) if row < self.num_original_rows => {
                self.edited_cells.insert(CellKey::new(col, row), cell);
            }
            RowIndex::Original(row) => {
                debug!("Ignoring edit of nonexistent original row {row}");
            }
            RowIndex::Added(row) => match self.added_rows.get_mut(row) {
                Some(added) => added.set(col, cell),
                None => debug!("Ignoring edit of nonexistent added row {row}"),
            },
        }
    }

    pub fn add_row(&mut self, cells: Vec<Cell>) -> RowIndex {
        self.added_rows.push(AddedRow::new(cells));
        RowIndex::Added(self.added_rows.len() - 1)
    }

    /// Deletes rows from the highest index down, so earlier deletions never
    /// shift later ones. Added rows are removed; original rows are tombstoned
    /// and lose their edits.
    pub fn delete_rows(&mut self, rows: &[RowIndex]) {
        let mut rows = rows.to_vec();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();
        for row in rows {
            match row {
                RowIndex::Added(idx) if idx < self.added_rows.len() => {
                    self.added_rows.remove(idx);
                }
                RowIndex::Original(idx) if idx < self.num_original_rows => {
                    self.edited_cells.retain(|key, _| key.row != idx);
                    if let Err(pos) = self.deleted_rows.binary_search(&idx) {
                        self.deleted_rows.insert(pos, idx);
                    }
                }
                other => debug!("Ignoring deletion of nonexistent {other}"),
            }
        }
    }

    pub fn is_deleted(&self, row: usize) -> bool {
        self.deleted_rows.binary_search(&row).is_ok()
    }

    /// Maps a deletion-compressed index to the row it addresses.
    pub fn get_original_row_index(&self, visible: usize) -> RowIndex {
        let mut row = visible;
        for &deleted in &self.deleted_rows {
            if deleted <= row {
                row += 1;
            } else {
                break;
            }
        }
        self.resolve(row)
    }

    pub fn num_rows(&self) -> usize {
        self.num_original_rows + self.added_rows.len() - self.deleted_rows.len()
    }

    pub fn deleted_rows(&self) -> &[usize] {
        &self.deleted_rows
    }

    pub fn added_rows(&self) -> &[AddedRow] {
        &self.added_rows
    }

    pub fn edited_cells(&self) -> impl Iterator<Item = (&CellKey, &Cell)> {
        self.edited_cells.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.edited_cells.is_empty() && self.added_rows.is_empty() && self.deleted_rows.is_empty()
    }

    /// Transport payload; every value goes through its column's `decode`.
    pub fn serialize(&self, columns: &[Column]) -> EditPayload {
        let edited_cells = self
            .edited_cells
            .iter()
            .map(|(key, cell)| {
                let value = columns
                    .get(key.col)
                    .and_then(|column| column.decode(cell))
                    .unwrap_or(JsonValue::Null);
                (*key, value)
            })
            .collect();
        EditPayload {
            edited_cells,
            added_rows: Vec::new(),
            deleted_rows: self.deleted_rows.clone(),
        }
    }

    /// Replaces edits and tombstones with the contents of `payload`.
    pub fn restore(&mut self, payload: &EditPayload, columns: &[Column]) {
        self.edited_cells.clear();
        self.added_rows.clear();
        self.deleted_rows.clear();
        for (key, value) in &payload.edited_cells {
            let Some(column) = columns.get(key.col) else {
                warn!("Skipping edit {key}: column out of range");
                continue;
            };
            if key.row >= self.num_original_rows {
                warn!("Skipping edit {key}: row out of range");
                continue;
            }
            let cell = column.encode(&RawValue::from(value.clone()), false);
            self.edited_cells.insert(*key, cell);
        }
        let tombstones = payload
            .deleted_rows
            .iter()
            .map(|&row| RowIndex::Original(row))
            .collect::<Vec<_>>();
        self.delete_rows(&tombstones);
        debug!(
            "Restored {} edit(s) and {} deletion(s)",
            self.edited_cells.len(),
            self.deleted_rows.len()
        );
    }
}
