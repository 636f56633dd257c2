//! TGT records with no SOT counterpart.

use std::collections::HashSet;

use log::{debug, info};

use crate::{
    config::{ColumnMapping, SyncConfig},
    error::Result,
    record::Record,
    report::ReportArtifact,
};

pub const ORPHAN_SECTION_HEADER: &str = "=== ORPHANED RECORDS (Present in TGT but not in SOT) ===";

/// Exclusion rules applied before a TGT record is considered at all.
#[derive(Debug, Clone)]
pub struct OrphanRules<'a> {
    pub id_prefix: Option<&'a str>,
    pub status_column: &'a str,
    pub ignore_statuses: &'a [String],
}

impl<'a> OrphanRules<'a> {
    pub fn from_config(config: &'a SyncConfig) -> Self {
        Self {
            id_prefix: config.id_prefix.as_deref().filter(|p| !p.is_empty()),
            status_column: &config.status_column,
            ignore_statuses: &config.orphan_ignore_statuses,
        }
    }

    /// Prefix mismatch and ignored statuses hide a record from detection.
    fn ignores(&self, id: &str, row: &Record) -> bool {
        if let Some(prefix) = self.id_prefix
            && !id.starts_with(prefix)
        {
            return true;
        }
        let status = row.value(self.status_column);
        self.ignore_statuses.iter().any(|s| s.trim() == status)
    }
}

impl Default for OrphanRules<'_> {
    fn default() -> Self {
        Self {
            id_prefix: None,
            status_column: crate::config::DEFAULT_STATUS_COLUMN,
            ignore_statuses: &[],
        }
    }
}

/// TGT rows whose identifier is absent from `sot_ids`, in TGT order.
pub fn find_orphans<'r>(
    tgt_rows: &'r [Record],
    sot_ids: &HashSet<&str>,
    id_column: &str,
    rules: &OrphanRules<'_>,
) -> Vec<&'r Record> {
    tgt_rows
        .iter()
        .filter(|row| match row.id(id_column) {
            Some(id) => !rules.ignores(id, row) && !sot_ids.contains(id),
            None => false,
        })
        .collect()
}

pub fn sot_id_set<'r>(sot_rows: &'r [Record], sot_id_column: &str) -> HashSet<&'r str> {
    sot_rows
        .iter()
        .filter_map(|row| row.id(sot_id_column))
        .collect()
}

/// Appends the orphan section to `artifact` and returns the orphan ids.
///
/// Nothing is written when there are no orphans. Orphan lines carry the
/// identifier only, so the mapping is not consulted.
pub fn append_orphan_report(
    artifact: &ReportArtifact,
    sot_rows: &[Record],
    tgt_rows: &[Record],
    sot_id_column: &str,
    tgt_id_column: &str,
    _mapping: &ColumnMapping,
    rules: &OrphanRules<'_>,
) -> Result<Vec<String>> {
    let sot_ids = sot_id_set(sot_rows, sot_id_column);
    let orphan_ids: Vec<String> = find_orphans(tgt_rows, &sot_ids, tgt_id_column, rules)
        .into_iter()
        .filter_map(|row| row.id(tgt_id_column).map(str::to_string))
        .collect();

    if orphan_ids.is_empty() {
        debug!("No orphaned TGT records");
        return Ok(orphan_ids);
    }

    let mut section = format!("\n\n{ORPHAN_SECTION_HEADER}\n");
    for id in &orphan_ids {
        section.push_str(&format!("\n[ORPHANED] {id}\n"));
    }
    artifact.append(&section)?;
    info!(
        "{} orphaned TGT record(s) appended to {:?}",
        orphan_ids.len(),
        artifact.path()
    );
    Ok(orphan_ids)
}
