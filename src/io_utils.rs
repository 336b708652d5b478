//! File loading and output routing for the `datagrid` binary.
//!
//! - **Snapshots**: `.json`, `.yaml`/`.yml` documents (see
//!   [`SourceDocument`]) or `.csv`/`.tsv` files read as text columns.
//! - **Column configuration** and **edit scripts**: JSON or YAML, chosen by
//!   extension.
//! - **stdin/stdout**: the `-` path convention routes through standard streams;
//!   stdin is read as JSON.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use serde::de::DeserializeOwned;

use crate::config::ColumnConfigMap;
use crate::data::RawValue;
use crate::script::EditCommand;
use crate::source::{Field, PhysicalType, SourceColumn, SourceDocument, SourceTable};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Delimited(u8),
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn detect_format(path: &Path) -> Result<FileFormat> {
    if is_dash(path) {
        return Ok(FileFormat::Json);
    }
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(FileFormat::Json),
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "csv" => Ok(FileFormat::Delimited(DEFAULT_CSV_DELIMITER)),
        "tsv" => Ok(FileFormat::Delimited(DEFAULT_TSV_DELIMITER)),
        _ => Err(anyhow!(
            "Unsupported file extension for {path:?}; expected json, yaml, yml, csv or tsv"
        )),
    }
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    Ok(if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    })
}

fn read_text(path: &Path) -> Result<String> {
    if is_dash(path) {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Reading from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("Reading {path:?}"))
}

fn load_structured<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = read_text(path)?;
    match detect_format(path)? {
        FileFormat::Json => {
            serde_json::from_str(&text).with_context(|| format!("Parsing JSON from {path:?}"))
        }
        FileFormat::Yaml => {
            serde_yaml::from_str(&text).with_context(|| format!("Parsing YAML from {path:?}"))
        }
        FileFormat::Delimited(_) => bail!("{path:?} is not a JSON or YAML document"),
    }
}

pub fn load_document(path: &Path) -> Result<SourceDocument> {
    load_structured(path)
}

pub fn load_source(path: &Path) -> Result<SourceTable> {
    match detect_format(path)? {
        FileFormat::Delimited(delimiter) => read_delimited(open_input(path)?, delimiter)
            .with_context(|| format!("Reading delimited snapshot {path:?}")),
        _ => {
            let document = load_document(path)?;
            document
                .into_table()
                .with_context(|| format!("Building snapshot from {path:?}"))
        }
    }
}

/// Reads a header row plus records; every column becomes a text column.
pub fn read_delimited<R>(reader: R, delimiter: u8) -> Result<SourceTable>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut values = vec![Vec::new(); headers.len()];
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        for (column, field) in values.iter_mut().zip(record.iter()) {
            column.push(RawValue::Text(field.to_string()));
        }
    }
    debug!(
        "Read {} column(s) and {} row(s) of delimited text",
        headers.len(),
        values.first().map_or(0, Vec::len)
    );
    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| SourceColumn::new(Field::new(name, PhysicalType::Text), values))
        .collect();
    Ok(SourceTable::new(Vec::new(), columns, None)?)
}

/// Strict: a configuration file that was asked for must parse.
pub fn load_column_config(path: Option<&Path>) -> Result<ColumnConfigMap> {
    match path {
        Some(path) => load_structured(path)
            .with_context(|| format!("Loading column configuration from {path:?}")),
        None => Ok(ColumnConfigMap::new()),
    }
}

pub fn load_script(path: &Path) -> Result<Vec<EditCommand>> {
    load_structured(path).with_context(|| format!("Loading edit script from {path:?}"))
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    })
}

pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    let mut writer = open_output(path)?;
    writer.write_all(contents.as_bytes())?;
    if !contents.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
