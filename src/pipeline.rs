//! End-to-end reconciliation run.
//!
//! Order matters: every fatal check runs before the output file is written,
//! and the diff section is written before the orphan section is appended.
//! Report failures are logged and never undo the written output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    config::SyncConfig,
    diff_report::{self, DiffReport},
    error::SyncError,
    io_utils::{self, CsvFormat},
    orphans::{self, OrphanRules},
    record::Dataset,
    report::ReportArtifact,
    sync_engine::{self, SyncSummary},
    validation::{self, ValidationReport},
};

pub const SOT_LABEL: &str = "SOT";
pub const TGT_LABEL: &str = "TGT";

/// Input files and how to decode them.
#[derive(Debug, Clone)]
pub struct SyncPaths {
    pub sot: PathBuf,
    pub tgt: PathBuf,
    pub sot_format: CsvFormat,
    pub tgt_format: CsvFormat,
}

#[derive(Debug, Clone)]
pub struct SyncRun {
    pub output_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub summary: SyncSummary,
    pub diff: Option<DiffReport>,
    pub orphan_ids: Vec<String>,
}

pub fn load_datasets(paths: &SyncPaths) -> Result<(Dataset, Dataset)> {
    let sot = io_utils::read_dataset(&paths.sot, SOT_LABEL, paths.sot_format)?;
    info!(
        "SOT loaded with {} records and {} columns",
        sot.len(),
        sot.headers.len()
    );
    let tgt = io_utils::read_dataset(&paths.tgt, TGT_LABEL, paths.tgt_format)?;
    info!(
        "TGT loaded with {} records and {} columns",
        tgt.len(),
        tgt.headers.len()
    );
    Ok((sot, tgt))
}

/// Runs every fatal check. Any mapping problem becomes one configuration error.
pub fn validate_datasets(
    sot: &Dataset,
    tgt: &Dataset,
    config: &SyncConfig,
) -> crate::error::Result<ValidationReport> {
    config.validate()?;
    validation::ensure_consistent_headers(&sot.rows, &sot.label)?;
    validation::ensure_consistent_headers(&tgt.rows, &tgt.label)?;

    let mapping_errors =
        validation::validate_column_mapping(&sot.rows, &tgt.rows, &config.column_mapping);
    if !mapping_errors.is_empty() {
        return Err(SyncError::configuration(mapping_errors.join("\n")));
    }

    validation::ensure_id_column(&sot.rows, &config.sot_id_column, &sot.label)?;
    validation::ensure_id_column(&tgt.rows, &config.tgt_id_column, &tgt.label)?;
    validation::ensure_no_duplicate_ids(&sot.rows, &config.sot_id_column, &sot.label)?;
    validation::ensure_no_duplicate_ids(&tgt.rows, &config.tgt_id_column, &tgt.label)?;

    Ok(ValidationReport {
        sot_records: sot.len(),
        tgt_records: tgt.len(),
        unmapped_sot_columns: sync_engine::find_unmapped_sot_columns(
            &sot.rows,
            &config.column_mapping,
            &config.sot_id_column,
        ),
    })
}

pub fn validate_only(paths: &SyncPaths, config: &SyncConfig) -> Result<ValidationReport> {
    let (sot, tgt) = load_datasets(paths)?;
    Ok(validate_datasets(&sot, &tgt, config)?)
}

pub fn run_sync(
    paths: &SyncPaths,
    config: &SyncConfig,
    output_dir: &Path,
    timestamp: &str,
) -> Result<SyncRun> {
    info!("=== Delta sync starting ===");
    let (sot, mut tgt) = load_datasets(paths)?;
    validate_datasets(&sot, &tgt, config)?;

    let snapshot = tgt.rows.clone();
    let summary = sync_engine::sync_records(
        &sot.rows,
        &mut tgt.rows,
        &config.sot_id_column,
        &config.tgt_id_column,
        &config.column_mapping,
    );
    info!(
        "Sync finished: {} updated, {} added, {} skipped",
        summary.updated.len(),
        summary.added.len(),
        summary.skipped.len()
    );

    let output_path = io_utils::updated_output_path(&paths.tgt, output_dir, timestamp);
    io_utils::write_dataset(&output_path, &tgt, paths.tgt_format)
        .with_context(|| format!("Writing updated TGT to {output_path:?}"))?;
    info!("Updated TGT written to {output_path:?}");

    let artifact = ReportArtifact::new(output_dir, &config.report_template, timestamp);
    let filter = config.record_filter();
    let (diff, report_path) = match diff_report::generate_diff_report(
        &snapshot,
        &tgt.rows,
        &config.tgt_id_column,
        &config.column_mapping,
        &filter,
        &artifact,
    ) {
        Ok((report, path)) => (Some(report), Some(path)),
        Err(err) => {
            warn!("Diff report generation failed: {err}");
            (None, None)
        }
    };

    let orphan_ids = match orphans::append_orphan_report(
        &artifact,
        &sot.rows,
        &tgt.rows,
        &config.sot_id_column,
        &config.tgt_id_column,
        &config.column_mapping,
        &OrphanRules::from_config(config),
    ) {
        Ok(ids) => ids,
        Err(err) => {
            warn!("Orphan report generation failed: {err}");
            Vec::new()
        }
    };

    info!("=== Sync complete ===");
    Ok(SyncRun {
        output_path,
        report_path,
        summary,
        diff,
        orphan_ids,
    })
}

/// Diffs two TGT snapshots on disk and writes the report artifact.
pub fn diff_files(
    old: &Path,
    new: &Path,
    format: CsvFormat,
    config: &SyncConfig,
    output_dir: &Path,
    timestamp: &str,
) -> Result<(DiffReport, PathBuf)> {
    let old = io_utils::read_dataset(old, TGT_LABEL, format)?;
    let new = io_utils::read_dataset(new, TGT_LABEL, format)?;
    let artifact = ReportArtifact::new(output_dir, &config.report_template, timestamp);
    Ok(diff_report::generate_diff_report(
        &old.rows,
        &new.rows,
        &config.tgt_id_column,
        &config.column_mapping,
        &config.record_filter(),
        &artifact,
    )?)
}

/// TGT identifiers with no SOT counterpart, without writing anything.
pub fn list_orphans(paths: &SyncPaths, config: &SyncConfig) -> Result<Vec<String>> {
    let (sot, tgt) = load_datasets(paths)?;
    let sot_ids = orphans::sot_id_set(&sot.rows, &config.sot_id_column);
    let rules = OrphanRules::from_config(config);
    Ok(
        orphans::find_orphans(&tgt.rows, &sot_ids, &config.tgt_id_column, &rules)
            .into_iter()
            .filter_map(|row| row.id(&config.tgt_id_column).map(str::to_string))
            .collect(),
    )
}
