//! SOT → TGT propagation.
//!
//! Matching records get every mapped column overwritten with the SOT value
//! when the trimmed values differ. SOT records missing from TGT are appended
//! with only the mapped columns and the identifier. TGT records are never
//! removed.

use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use log::{error, info, warn};

use crate::{config::ColumnMapping, error::RecordError, record::Record};

/// What a sync pass did, in SOT order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub updated: Vec<(String, BTreeSet<String>)>,
    pub added: Vec<String>,
    pub unmapped_sot_columns: Vec<String>,
    pub skipped: Vec<RecordError>,
}

impl SyncSummary {
    pub fn change_count(&self) -> usize {
        self.updated.len() + self.added.len()
    }
}

/// SOT columns that are neither mapped nor the identifier, sorted.
pub fn find_unmapped_sot_columns(
    sot_rows: &[Record],
    mapping: &ColumnMapping,
    sot_id_column: &str,
) -> Vec<String> {
    let Some(first) = sot_rows.first() else {
        return Vec::new();
    };
    let mapped: BTreeSet<&str> = mapping
        .sot_columns()
        .chain(std::iter::once(sot_id_column))
        .collect();
    first
        .columns()
        .into_iter()
        .filter(|column| !mapped.contains(column))
        .map(str::to_string)
        .collect()
}

/// Applies SOT values to `tgt_rows` in place and appends missing records.
pub fn sync_records(
    sot_rows: &[Record],
    tgt_rows: &mut Vec<Record>,
    sot_id_column: &str,
    tgt_id_column: &str,
    mapping: &ColumnMapping,
) -> SyncSummary {
    let mut summary = SyncSummary {
        unmapped_sot_columns: find_unmapped_sot_columns(sot_rows, mapping, sot_id_column),
        ..SyncSummary::default()
    };
    if !summary.unmapped_sot_columns.is_empty() {
        warn!(
            "Unmapped SOT columns ignored ({}): {}",
            summary.unmapped_sot_columns.len(),
            summary.unmapped_sot_columns.join(", ")
        );
    }

    // Last occurrence wins; duplicates are rejected before this point.
    let mut index: HashMap<String, usize> = tgt_rows
        .iter()
        .enumerate()
        .filter_map(|(pos, row)| row.id(tgt_id_column).map(|id| (id.to_string(), pos)))
        .collect();

    for (pos, sot_row) in sot_rows.iter().enumerate() {
        let Some(sot_id) = sot_row.id(sot_id_column) else {
            let err = RecordError {
                position: pos + 1,
                column: sot_id_column.to_string(),
            };
            error!("{err}");
            summary.skipped.push(err);
            continue;
        };

        match index.get(sot_id).copied() {
            Some(tgt_pos) => {
                let tgt_row = &mut tgt_rows[tgt_pos];
                let mut changed = BTreeSet::new();
                for (sot_col, tgt_col) in mapping.iter() {
                    let sot_value = sot_row.value(sot_col);
                    if sot_value != tgt_row.value(tgt_col) {
                        tgt_row.set(tgt_col, sot_value);
                        changed.insert(tgt_col.to_string());
                    }
                }
                if !changed.is_empty() {
                    info!("{sot_id}: updated [{}]", changed.iter().join(", "));
                    summary.updated.push((sot_id.to_string(), changed));
                }
            }
            None => {
                let mut new_row: Record = mapping
                    .iter()
                    .map(|(sot_col, tgt_col)| (tgt_col, sot_row.value(sot_col)))
                    .collect();
                new_row.set(tgt_id_column, sot_id);
                tgt_rows.push(new_row);
                index.insert(sot_id.to_string(), tgt_rows.len() - 1);
                info!("{sot_id}: added new record");
                summary.added.push(sot_id.to_string());
            }
        }
    }

    summary
}

/// Non-mutating variant of [`sync_records`].
pub fn sync(
    sot_rows: &[Record],
    tgt_rows: &[Record],
    sot_id_column: &str,
    tgt_id_column: &str,
    mapping: &ColumnMapping,
) -> (Vec<Record>, SyncSummary) {
    let mut rows = tgt_rows.to_vec();
    let summary = sync_records(sot_rows, &mut rows, sot_id_column, tgt_id_column, mapping);
    (rows, summary)
}
