use std::cmp::Ordering;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use chrono::NaiveDateTime;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellData};
use crate::coerce::to_safe_number;
use crate::column::{Column, SortMode};
use crate::data::RawValue;
use crate::snapshot::TableSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_ascending(self) -> bool {
        matches!(self, SortDirection::Asc)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(anyhow!("Unknown sort direction '{other}'")),
        }
    }
}

/// Anything that can hand out cells row by row: the raw snapshot or a view
/// with edits applied.
pub trait CellSource {
    fn num_rows(&self) -> usize;
    fn column(&self, col: usize) -> Option<&Column>;
    fn cell(&self, col: usize, row: usize) -> Cell;
}

impl CellSource for TableSnapshot {
    fn num_rows(&self) -> usize {
        TableSnapshot::num_rows(self)
    }

    fn column(&self, col: usize) -> Option<&Column> {
        TableSnapshot::column(self, col)
    }

    fn cell(&self, col: usize, row: usize) -> Cell {
        TableSnapshot::cell(self, col, row)
    }
}

/// Comparable projection of a cell. Variants order as declared, so missing
/// cells sort first and numbers sort before text.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Bool(bool),
    Number(f64),
    Instant(NaiveDateTime),
    Text(String),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Instant(_) => 3,
            SortKey::Text(_) => 4,
        }
    }
}

impl Eq for SortKey {}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Instant(a), SortKey::Instant(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn sort_key(cell: &Cell, mode: SortMode) -> SortKey {
    let data = match cell {
        Cell::Missing(_) => return SortKey::Missing,
        Cell::Error(_) => return SortKey::Text(cell.display().to_string()),
        Cell::Value(value) => &value.data,
    };
    match mode {
        SortMode::Default => SortKey::Text(cell.display().to_string()),
        SortMode::Smart => match data {
            CellData::Number(n) => SortKey::Number(*n),
            CellData::Progress { value, .. } => SortKey::Number(*value),
            _ => match to_safe_number(&RawValue::Text(cell.display().to_string())) {
                Ok(Some(n)) => SortKey::Number(n),
                _ => SortKey::Text(cell.display().to_string()),
            },
        },
        SortMode::Raw => match data {
            CellData::Number(n) => SortKey::Number(*n),
            CellData::Progress { value, .. } => SortKey::Number(*value),
            CellData::Boolean(b) => SortKey::Bool(*b),
            CellData::Temporal(ts) => SortKey::Instant(ts.utc),
            CellData::Text(text) => SortKey::Text(text.clone()),
            CellData::Choice(choice) => match choice.as_f64() {
                Some(n) => SortKey::Number(n),
                None => SortKey::Text(cell.display().to_string()),
            },
            _ => SortKey::Text(cell.display().to_string()),
        },
    }
}

/// Stable permutation ordering `keys`; position `i` of the result holds the
/// row shown at visible position `i`. Descending flips the comparator, so
/// equal keys keep their original relative order either way.
pub fn compute_permutation(keys: &[SortKey], direction: SortDirection) -> Vec<usize> {
    (0..keys.len())
        .sorted_by(|&a, &b| {
            let ordering = keys[a].cmp(&keys[b]);
            if direction.is_ascending() {
                ordering
            } else {
                ordering.reverse()
            }
        })
        .collect()
}

pub fn sort_keys<S>(source: &S, col: usize) -> Vec<SortKey>
where
    S: CellSource + ?Sized,
{
    let mode = source
        .column(col)
        .map(Column::sort_mode)
        .unwrap_or_default();
    (0..source.num_rows())
        .map(|row| sort_key(&source.cell(col, row), mode))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortIndexMapper {
    state: Option<(usize, SortDirection)>,
    permutation: Vec<usize>,
}

impl SortIndexMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by<S>(&mut self, source: &S, col: usize, direction: SortDirection)
    where
        S: CellSource + ?Sized,
    {
        self.state = Some((col, direction));
        self.refresh(source);
    }

    /// Recomputes the permutation from scratch for the current sort.
    pub fn refresh<S>(&mut self, source: &S)
    where
        S: CellSource + ?Sized,
    {
        let Some((col, direction)) = self.state else {
            self.permutation.clear();
            return;
        };
        self.permutation = compute_permutation(&sort_keys(source, col), direction);
        debug!(
            "Sorted {} row(s) by column {col} {direction}",
            self.permutation.len()
        );
    }

    pub fn clear(&mut self) {
        self.state = None;
        self.permutation.clear();
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<(usize, SortDirection)> {
        self.state
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Deletion-compressed row shown at `visible`.
    pub fn to_unsorted_row(&self, visible: usize) -> usize {
        if self.state.is_none() {
            return visible;
        }
        self.permutation.get(visible).copied().unwrap_or(visible)
    }

    pub fn cell<S>(&self, source: &S, col: usize, visible: usize) -> Cell
    where
        S: CellSource + ?Sized,
    {
        source.cell(col, self.to_unsorted_row(visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Vec<SortKey> {
        values.iter().map(|&n| SortKey::Number(n)).collect()
    }

    #[test]
    fn parses_directions() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert!("up".parse::<SortDirection>().is_err());
    }

    #[test]
    fn missing_sorts_first_and_numbers_before_text() {
        let mut keys = vec![
            SortKey::Text("a".into()),
            SortKey::Number(3.0),
            SortKey::Missing,
            SortKey::Bool(true),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SortKey::Missing,
                SortKey::Bool(true),
                SortKey::Number(3.0),
                SortKey::Text("a".into())
            ]
        );
    }

    #[test]
    fn descending_keeps_ties_in_original_order() {
        let keys = numbers(&[1.0, 2.0, 1.0, 2.0]);
        assert_eq!(compute_permutation(&keys, SortDirection::Asc), vec![0, 2, 1, 3]);
        assert_eq!(compute_permutation(&keys, SortDirection::Desc), vec![1, 3, 0, 2]);
    }

    #[test]
    fn smart_keys_parse_display_text() {
        let cell = Cell::value(CellData::Text("1,200".into()), "1,200");
        assert_eq!(sort_key(&cell, SortMode::Smart), SortKey::Number(1200.0));
        assert_eq!(
            sort_key(&cell, SortMode::Default),
            SortKey::Text("1,200".into())
        );
    }

    #[test]
    fn inactive_mapper_is_identity() {
        let mapper = SortIndexMapper::new();
        assert!(!mapper.is_active());
        assert_eq!(mapper.to_unsorted_row(7), 7);
    }
}
