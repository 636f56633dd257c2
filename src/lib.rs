pub mod cli;
pub mod config;
pub mod diff_report;
pub mod error;
pub mod io_utils;
pub mod orphans;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod sync_engine;
pub mod validation;

use std::{
    env,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, DiffArgs, InputArgs, OutputArgs, SyncArgs},
    config::SyncConfig,
    io_utils::CsvFormat,
    pipeline::SyncPaths,
};

pub use error::{RecordError, SyncError};
pub use record::{Dataset, Record};

static LOGGER: OnceLock<()> = OnceLock::new();

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tabsync", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => handle_sync(&args),
        Commands::Validate(args) => handle_validate(&args),
        Commands::Orphans(args) => handle_orphans(&args),
        Commands::Diff(args) => handle_diff(&args),
    }
}

fn load_config(path: &Path) -> Result<SyncConfig> {
    let config =
        SyncConfig::load(path).with_context(|| format!("Loading configuration from {path:?}"))?;
    debug!(
        "Mapping {} column(s): SOT id '{}' -> TGT id '{}'",
        config.column_mapping.len(),
        config.sot_id_column,
        config.tgt_id_column
    );
    Ok(config)
}

fn sync_paths(args: &InputArgs) -> Result<SyncPaths> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    Ok(SyncPaths {
        sot: args.sot.clone(),
        tgt: args.tgt.clone(),
        sot_format: CsvFormat::for_path(&args.sot, args.delimiter, encoding),
        tgt_format: CsvFormat::for_path(&args.tgt, args.delimiter, encoding),
    })
}

fn resolve_output(args: &OutputArgs, config: &SyncConfig) -> (PathBuf, String) {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let timestamp = args
        .timestamp
        .clone()
        .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());
    (output_dir, timestamp)
}

fn handle_sync(args: &SyncArgs) -> Result<()> {
    let config = load_config(&args.input.config)?;
    let paths = sync_paths(&args.input)?;
    let (output_dir, timestamp) = resolve_output(&args.output, &config);
    let run = pipeline::run_sync(&paths, &config, &output_dir, &timestamp)?;

    if let Some(diff) = &run.diff {
        println!("===== SYNC DIFF REPORT =====\n");
        println!("{diff}");
    }
    for id in &run.orphan_ids {
        println!("[ORPHANED] {id}");
    }
    info!("Updated TGT: {:?}", run.output_path);
    match &run.report_path {
        Some(path) => info!("Diff report: {path:?}"),
        None => warn!("No diff report was written"),
    }
    Ok(())
}

fn handle_validate(args: &InputArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let paths = sync_paths(args)?;
    let report = pipeline::validate_only(&paths, &config)?;
    if !report.unmapped_sot_columns.is_empty() {
        warn!(
            "Unmapped SOT columns ignored ({}): {}",
            report.unmapped_sot_columns.len(),
            report.unmapped_sot_columns.join(", ")
        );
    }
    info!(
        "✓ {} SOT and {} TGT record(s) passed validation",
        report.sot_records, report.tgt_records
    );
    Ok(())
}

fn handle_orphans(args: &InputArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let paths = sync_paths(args)?;
    let orphans = pipeline::list_orphans(&paths, &config)?;
    for id in &orphans {
        println!("[ORPHANED] {id}");
    }
    info!("{} orphaned TGT record(s)", orphans.len());
    Ok(())
}

fn handle_diff(args: &DiffArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let format = CsvFormat::for_path(&args.old, args.delimiter, encoding);
    let (output_dir, timestamp) = resolve_output(&args.output, &config);
    let (report, path) =
        pipeline::diff_files(&args.old, &args.new, format, &config, &output_dir, &timestamp)?;
    println!("{report}");
    info!("Diff report saved to {path:?}");
    Ok(())
}
