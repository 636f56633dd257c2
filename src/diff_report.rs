//! Field-level comparison of two TGT snapshots.
//!
//! Both snapshots use TGT column names, so only the mapping's target side is
//! consulted. Records carrying the protected marker never show up, and the
//! optional [`RecordFilter`] hides identifiers outside the configured scope.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::PathBuf,
};

use log::info;

use crate::{
    config::{ColumnMapping, RecordFilter},
    error::Result,
    record::Record,
    report::ReportArtifact,
};

pub const NO_DIFFERENCES: &str = "No differences found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub column: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEntry {
    Updated {
        id: String,
        changes: Vec<FieldChange>,
    },
    Added {
        id: String,
        values: Vec<(String, String)>,
    },
}

impl DiffEntry {
    pub fn id(&self) -> &str {
        match self {
            DiffEntry::Updated { id, .. } | DiffEntry::Added { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn updated(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::Updated { .. }))
    }

    pub fn added(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::Added { .. }))
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str(NO_DIFFERENCES);
        }
        for entry in &self.entries {
            match entry {
                DiffEntry::Updated { id, changes } => {
                    writeln!(f, "[UPDATED] {id}")?;
                    for change in changes {
                        writeln!(f, "    {}: '{}' → '{}'", change.column, change.old, change.new)?;
                    }
                }
                DiffEntry::Added { id, values } => {
                    writeln!(f, "[ADDED] {id}")?;
                    for (column, value) in values {
                        writeln!(f, "    {column}: '{value}'")?;
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Compares `old_rows` against `new_rows` keyed on `id_column`.
pub fn compare_snapshots(
    old_rows: &[Record],
    new_rows: &[Record],
    id_column: &str,
    mapping: &ColumnMapping,
    filter: &RecordFilter,
) -> DiffReport {
    let new_index: HashMap<&str, &Record> = new_rows
        .iter()
        .filter_map(|row| row.id(id_column).map(|id| (id, row)))
        .collect();

    let mut entries = Vec::new();
    let mut old_ids = HashSet::new();

    for old in old_rows {
        let Some(id) = old.id(id_column) else {
            continue;
        };
        if !filter.admits(id) {
            continue;
        }
        old_ids.insert(id);

        // Sync never deletes, so a missing counterpart is not reported.
        let Some(new) = new_index.get(id) else {
            continue;
        };
        if new.is_protected() {
            continue;
        }

        let changes: Vec<FieldChange> = mapping
            .tgt_columns()
            .filter_map(|column| {
                let (before, after) = (old.value(column), new.value(column));
                (before != after).then(|| FieldChange {
                    column: column.to_string(),
                    old: before.to_string(),
                    new: after.to_string(),
                })
            })
            .collect();
        if !changes.is_empty() {
            entries.push(DiffEntry::Updated {
                id: id.to_string(),
                changes,
            });
        }
    }

    for new in new_rows {
        let Some(id) = new.id(id_column) else {
            continue;
        };
        if !filter.admits(id) || old_ids.contains(id) || new.is_protected() {
            continue;
        }
        let values = mapping
            .tgt_columns()
            .filter_map(|column| {
                let value = new.value(column);
                (!value.is_empty()).then(|| (column.to_string(), value.to_string()))
            })
            .collect();
        entries.push(DiffEntry::Added {
            id: id.to_string(),
            values,
        });
    }

    DiffReport { entries }
}

/// Builds the report, writes it to `artifact` (truncating), and returns the
/// report together with the artifact path.
pub fn generate_diff_report(
    old_rows: &[Record],
    new_rows: &[Record],
    id_column: &str,
    mapping: &ColumnMapping,
    filter: &RecordFilter,
    artifact: &ReportArtifact,
) -> Result<(DiffReport, PathBuf)> {
    let report = compare_snapshots(old_rows, new_rows, id_column, mapping, filter);
    artifact.write(&report.to_string())?;
    info!(
        "Diff report ({} updated, {} added) saved to {:?}",
        report.updated().count(),
        report.added().count(),
        artifact.path()
    );
    Ok((report, artifact.path().to_path_buf()))
}
