mod common;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::{Value as JsonValue, json};

use common::{TestWorkspace, fixture_path};

fn datagrid() -> Command {
    Command::cargo_bin("datagrid").expect("binary exists")
}

#[test]
fn columns_lists_resolved_kinds_and_flags() {
    datagrid()
        .args(["columns", "-i"])
        .arg(fixture_path("orders.json"))
        .arg("-c")
        .arg(fixture_path("orders_config.yaml"))
        .assert()
        .success()
        .stdout(contains("_pos:0"))
        .stdout(contains("Order"))
        .stdout(contains("index,read-only"))
        .stdout(contains("categorical"))
        .stdout(contains("select"))
        .stdout(contains("hidden"));
}

#[test]
fn preview_renders_formatted_display_strings() {
    datagrid()
        .args(["preview", "-i"])
        .arg(fixture_path("orders.json"))
        .arg("-c")
        .arg(fixture_path("orders_config.yaml"))
        .assert()
        .success()
        .stdout(contains("Total"))
        .stdout(contains("$19.99"))
        .stdout(contains("$250.00"))
        .stdout(contains("01.03.2024"))
        .stdout(contains("repeat").not());
}

#[test]
fn preview_sorts_before_limiting_rows() {
    datagrid()
        .args(["preview", "-i"])
        .arg(fixture_path("orders.json"))
        .args(["--sort", "total:desc", "--rows", "2", "--row-numbers"])
        .assert()
        .success()
        .stdout(contains("Grace"))
        .stdout(contains("Ada"))
        .stdout(contains("Linus").not());
}

#[test]
fn preview_reads_delimited_snapshots() {
    datagrid()
        .args(["preview", "-i"])
        .arg(fixture_path("people.csv"))
        .args(["--sort", "city"])
        .assert()
        .success()
        .stdout(contains("Arlington"))
        .stdout(contains("Helsinki"));
}

#[test]
fn apply_writes_payload_to_stdout() {
    let output = datagrid()
        .args(["apply", "-i"])
        .arg(fixture_path("orders.json"))
        .arg("-c")
        .arg(fixture_path("orders_config.yaml"))
        .arg("-e")
        .arg(fixture_path("orders_edits.yaml"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8 payload");
    assert!(
        text.contains(r#""edited_cells":{"1:0":"Ada L.","3:1":true,"2:2":1000}"#),
        "{text}"
    );
    assert!(text.contains(r#""added_rows":[]"#));
    assert!(text.contains(r#""deleted_rows":[]"#));
}

#[test]
fn dynamic_apply_records_deletions_to_a_file() {
    let workspace = TestWorkspace::new();
    let out = workspace.path().join("payload.json");
    datagrid()
        .args(["apply", "--dynamic", "--pretty", "-i"])
        .arg(fixture_path("orders.json"))
        .arg("-c")
        .arg(fixture_path("orders_config.yaml"))
        .arg("-e")
        .arg(fixture_path("orders_edits.yaml"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    let payload: JsonValue =
        serde_json::from_str(&fs::read_to_string(&out).expect("payload file")).expect("json");
    assert_eq!(payload["deleted_rows"], json!([1]));
    assert_eq!(
        payload["edited_cells"],
        json!({"1:0": "Ada L.", "2:2": 1000})
    );
}

#[test]
fn apply_fails_on_unknown_columns() {
    let workspace = TestWorkspace::new();
    let script = workspace.write(
        "edits.json",
        r#"[{"op": "edit", "column": "nope", "row": 0, "value": 1}]"#,
    );
    datagrid()
        .args(["apply", "-i"])
        .arg(fixture_path("orders.json"))
        .arg("-e")
        .arg(&script)
        .assert()
        .failure()
        .stderr(contains("error:"))
        .stderr(contains("Column 'nope' not found"));
}

#[test]
fn malformed_scripts_are_reported() {
    let workspace = TestWorkspace::new();
    let script = workspace.write("edits.yaml", "- op: explode\n");
    datagrid()
        .args(["apply", "-i"])
        .arg(fixture_path("orders.json"))
        .arg("-e")
        .arg(&script)
        .assert()
        .failure()
        .stderr(contains("Loading edit script"));
}

#[test]
fn unsupported_snapshot_extensions_fail() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("table.parquet", "");
    datagrid()
        .args(["columns", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("Unsupported file extension"));
}

#[test]
fn snapshots_can_be_piped_through_stdin() {
    datagrid()
        .args(["preview", "-i", "-"])
        .write_stdin(r#"{"columns": [{"name": "n", "values": [3, 1, 2]}]}"#)
        .assert()
        .success()
        .stdout(contains("n"))
        .stdout(contains("3"));
}
