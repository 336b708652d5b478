#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use datagrid_core::config::ColumnConfigMap;
use datagrid_core::data::RawValue;
use datagrid_core::snapshot::TableSnapshot;
use datagrid_core::source::{Field, PhysicalType, SourceColumn, SourceDocument, SourceTable};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Single data column without an index.
pub fn single_column(name: &str, physical: PhysicalType, values: Vec<RawValue>) -> SourceTable {
    SourceTable::new(
        Vec::new(),
        vec![SourceColumn::new(Field::new(name, physical), values)],
        None,
    )
    .expect("single column table")
}

/// Builds a snapshot from an inline JSON document and optional JSON config.
pub fn snapshot_from_json(document: &str, config: &str) -> TableSnapshot {
    let document: SourceDocument = serde_json::from_str(document).expect("snapshot document");
    let table = document.into_table().expect("snapshot table");
    TableSnapshot::new(table, &ColumnConfigMap::from_json_str(config))
}

/// The `tests/data/orders.json` fixture with its YAML configuration.
pub fn orders_snapshot() -> TableSnapshot {
    let document = std::fs::read_to_string(fixture_path("orders.json")).expect("orders fixture");
    let config =
        std::fs::read_to_string(fixture_path("orders_config.yaml")).expect("orders config");
    let document: SourceDocument = serde_json::from_str(&document).expect("orders document");
    TableSnapshot::new(
        document.into_table().expect("orders table"),
        &ColumnConfigMap::from_yaml_str(&config),
    )
}
