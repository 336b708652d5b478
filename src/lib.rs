pub mod apply;
pub mod cell;
pub mod cli;
pub mod coerce;
pub mod column;
pub mod columns;
pub mod config;
pub mod data;
pub mod editing;
pub mod editor;
pub mod format;
pub mod io_utils;
pub mod preview;
pub mod script;
pub mod snapshot;
pub mod sort;
pub mod source;
pub mod style;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, Commands, SnapshotArgs};
use crate::editor::{DataEditor, RowPolicy};
use crate::snapshot::TableSnapshot;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("datagrid_core", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Columns(args) => columns::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Apply(args) => apply::execute(&args),
    }
}

pub(crate) fn load_snapshot(args: &SnapshotArgs) -> Result<TableSnapshot> {
    info!("Loading snapshot '{}'", args.input.display());
    let source = io_utils::load_source(&args.input)
        .with_context(|| format!("Loading snapshot from {:?}", args.input))?;
    let config = io_utils::load_column_config(args.config.as_deref())?;
    debug!("Column configuration covers {} key(s)", config.len());
    Ok(TableSnapshot::new(source, &config))
}

pub(crate) fn load_editor(args: &SnapshotArgs, dynamic: bool) -> Result<DataEditor> {
    let policy = if dynamic {
        RowPolicy::Dynamic
    } else {
        RowPolicy::Fixed
    };
    Ok(DataEditor::new(load_snapshot(args)?, policy))
}
