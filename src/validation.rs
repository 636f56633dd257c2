//! Pre-sync gatekeeping: mapping coverage, header consistency, and
//! identifier uniqueness. Nothing here mutates a dataset.

use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;

use crate::{
    config::ColumnMapping,
    error::{Result, SyncError},
    record::Record,
};

/// How a blank or absent identifier is shown in duplicate listings.
pub const MISSING_ID: &str = "<missing>";

/// Checks that every mapped column exists on its side of the mapping.
///
/// An empty dataset short-circuits with a single message. Extra TGT columns
/// are always allowed.
pub fn validate_column_mapping(
    sot_rows: &[Record],
    tgt_rows: &[Record],
    mapping: &ColumnMapping,
) -> Vec<String> {
    let Some(sot_first) = sot_rows.first() else {
        return vec!["SOT is empty: cannot validate mapping.".to_string()];
    };
    let Some(tgt_first) = tgt_rows.first() else {
        return vec!["TGT is empty: cannot validate mapping.".to_string()];
    };

    let mut errors = Vec::new();
    for (sot_col, tgt_col) in mapping.iter() {
        if !sot_first.contains_column(sot_col) {
            errors.push(format!("SOT column '{sot_col}' not found in SOT headers."));
        }
        if !tgt_first.contains_column(tgt_col) {
            errors.push(format!("TGT column '{tgt_col}' not found in TGT headers."));
        }
    }
    errors
}

/// Fails when any row's column set differs from the first row's.
///
/// Row numbers are reported as sheet rows: the header is row 1, so the first
/// record is row 2.
pub fn ensure_consistent_headers(rows: &[Record], label: &str) -> Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let expected = first.columns();
    for (idx, row) in rows.iter().enumerate().skip(1) {
        let found = row.columns();
        if found != expected {
            return Err(SyncError::schema(format!(
                "{label} row {} has inconsistent columns.\nExpected: {}\nFound: {}",
                idx + 2,
                render_columns(&expected),
                render_columns(&found),
            )));
        }
    }
    Ok(())
}

fn render_columns(columns: &BTreeSet<&str>) -> String {
    format!("[{}]", columns.iter().map(|c| format!("'{c}'")).join(", "))
}

/// Fails when the first row has no `id_column` at all.
///
/// Runs before the duplicate check so a misspelled identifier column is
/// reported as such rather than as a run of blank identifiers.
pub fn ensure_id_column(rows: &[Record], id_column: &str, label: &str) -> Result<()> {
    match rows.first() {
        Some(first) if !first.contains_column(id_column) => Err(SyncError::configuration(
            format!("{label} unique ID column '{id_column}' not found in {label} headers."),
        )),
        _ => Ok(()),
    }
}

/// Fails with every identifier that occurs more than once.
///
/// Blank identifiers count as one shared value, rendered as [`MISSING_ID`],
/// so two rows without an identifier are a duplicate too.
pub fn ensure_no_duplicate_ids(rows: &[Record], id_column: &str, label: &str) -> Result<()> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<Option<&str>> = Vec::new();
    for row in rows {
        let id = row.id(id_column);
        if !seen.insert(id) && !duplicates.contains(&id) {
            duplicates.push(id);
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(SyncError::DuplicateIds {
            label: label.to_string(),
            column: id_column.to_string(),
            values: duplicates
                .into_iter()
                .map(|id| id.unwrap_or(MISSING_ID).to_string())
                .collect(),
        })
    }
}

/// Outcome of the full pre-sync gate, used by the `validate` command.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub sot_records: usize,
    pub tgt_records: usize,
    pub unmapped_sot_columns: Vec<String>,
}
