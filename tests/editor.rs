mod common;

use datagrid_core::data::RawValue;
use datagrid_core::editing::RowIndex;
use datagrid_core::editor::{DataEditor, EditorError, PasteSummary, RowPolicy};
use datagrid_core::script::{EditCommand, apply_script};
use datagrid_core::sort::SortDirection;
use serde_json::json;

use common::{orders_snapshot, snapshot_from_json};

fn block(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect()
}

#[test]
fn index_columns_reject_edits() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Fixed);
    let err = editor.edit_cell(0, 0, RawValue::Int(5)).unwrap_err();
    assert_eq!(
        err,
        EditorError::ReadOnly {
            column: "order_id".into()
        }
    );
}

#[test]
fn required_columns_reject_blank_input() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Fixed);
    let err = editor.edit_cell(1, 0, RawValue::Text(String::new())).unwrap_err();
    match err {
        EditorError::InvalidInput { message, details } => {
            assert!(message.ends_with("Missing value"));
            assert_eq!(details.as_deref(), Some("This column requires a value."));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(editor.cell(1, 0).display(), "Ada");
}

#[test]
fn out_of_range_addresses_are_reported() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Fixed);
    assert!(matches!(
        editor.edit_cell(42, 0, RawValue::Null),
        Err(EditorError::ColumnOutOfBounds { col: 42, .. })
    ));
    assert!(matches!(
        editor.edit_cell(1, 4, RawValue::Null),
        Err(EditorError::RowOutOfBounds { row: 4, rows: 4 })
    ));
    assert!(editor.cell(1, 9).is_error());
}

#[test]
fn paste_skips_read_only_and_invalid_cells() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Fixed);
    // customer, total, paid starting at row 2; the third row falls off a
    // fixed-size grid.
    let summary = editor
        .paste(
            1,
            2,
            &block(&[&["Lin", "7.25", "maybe"], &["Barb", "x", "no"], &["Extra", "1"]]),
        )
        .unwrap();
    assert_eq!(
        summary,
        PasteSummary {
            applied: 4,
            skipped: 4,
            rows_added: 0
        }
    );
    assert_eq!(editor.cell(1, 2).display(), "Lin");
    assert_eq!(editor.cell(2, 2).display(), "$7.25");
    assert_eq!(editor.cell(3, 3).display(), "false");
    assert_eq!(editor.num_rows(), 4);
}

#[test]
fn paste_grows_dynamic_grids() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Dynamic);
    let summary = editor
        .paste(1, 3, &block(&[&["Barb"], &["Edsger"], &["Alan"]]))
        .unwrap();
    assert_eq!(summary.rows_added, 2);
    assert_eq!(editor.num_rows(), 6);
    assert_eq!(editor.cell(1, 5).display(), "Alan");
    assert_eq!(
        editor.editing().get_cell(1, RowIndex::Added(0)).unwrap().display(),
        "Edsger"
    );
}

#[test]
fn appended_rows_use_configured_defaults() {
    let snapshot = snapshot_from_json(
        r#"{"columns": [
            {"name": "qty", "type": "int64", "values": [1]},
            {"name": "note", "type": "text", "values": ["a"]}
        ]}"#,
        r#"{"qty": {"default": 10}}"#,
    );
    let mut editor = DataEditor::new(snapshot, RowPolicy::Dynamic);
    let row = editor.append_row().unwrap();
    assert_eq!(row, 1);
    assert_eq!(editor.cell(0, 1).display(), "10");
    assert!(editor.cell(1, 1).is_missing());
    // Added rows are reserved in the payload.
    assert!(editor.commit().added_rows.is_empty());
}

#[test]
fn deleting_through_a_sort_hits_the_visible_row() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Dynamic);
    editor.sort(2, SortDirection::Desc).unwrap();
    // Highest total first: Grace (250.0) at original row 1.
    assert_eq!(editor.cell(1, 0).display(), "Grace");
    assert_eq!(editor.delete_rows(&[0, 0]).unwrap(), 1);
    assert_eq!(editor.commit().deleted_rows, vec![1]);
    assert_eq!(editor.num_rows(), 3);
    assert_eq!(editor.cell(1, 0).display(), "Ada");
}

#[test]
fn fixed_grids_refuse_structural_changes() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Fixed);
    assert_eq!(editor.delete_rows(&[0]), Err(EditorError::FixedRows));
    assert_eq!(editor.append_row(), Err(EditorError::FixedRows));
}

#[test]
fn replacing_the_snapshot_keeps_edits_only_for_equal_row_counts() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Fixed);
    editor.edit_cell(1, 0, RawValue::from("Ada L.")).unwrap();

    editor.replace_snapshot(orders_snapshot());
    assert_eq!(editor.cell(1, 0).display(), "Ada L.");

    let smaller = snapshot_from_json(
        r#"{"columns": [{"name": "customer", "values": ["Solo"]}]}"#,
        "",
    );
    editor.replace_snapshot(smaller);
    assert!(editor.editing().is_empty());
    assert_eq!(editor.cell(0, 0).display(), "Solo");
}

#[test]
fn commit_and_restore_round_trip() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Dynamic);
    editor.edit_cell(3, 1, RawValue::from("on")).unwrap();
    editor.edit_cell(5, 0, RawValue::from("2024-04-30")).unwrap();
    editor.delete_rows(&[2]).unwrap();
    let payload = editor.commit();
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({
            "edited_cells": {"5:0": "2024-04-30", "3:1": true},
            "added_rows": [],
            "deleted_rows": [2]
        })
    );

    let mut fresh = DataEditor::new(orders_snapshot(), RowPolicy::Dynamic);
    fresh.restore(&payload);
    assert_eq!(fresh.commit(), payload);
    assert_eq!(fresh.cell(5, 0).display(), "30.04.2024");
    assert_eq!(fresh.num_rows(), 3);
}

#[test]
fn scripts_count_rejected_steps() {
    let mut editor = DataEditor::new(orders_snapshot(), RowPolicy::Fixed);
    let commands: Vec<EditCommand> = serde_json::from_value(json!([
        {"op": "edit", "column": "total", "row": 0, "value": 12},
        {"op": "edit", "column": 2, "row": 1, "value": -1},
        {"op": "sort", "column": "total"},
        {"op": "append"},
        {"op": "clear_sort"},
        {"op": "paste", "column": "customer", "row": 0, "rows": [["Ann", 5]]}
    ]))
    .unwrap();
    let report = apply_script(&mut editor, &commands).unwrap();
    assert_eq!(report.applied, 4);
    assert_eq!(report.rejected, 2);
    assert_eq!(editor.cell(1, 0).display(), "Ann");
    assert_eq!(editor.cell(2, 0).display(), "$5.00");
}
