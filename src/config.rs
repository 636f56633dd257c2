//! Run configuration: identifier columns, the SOT→TGT column mapping, and
//! the filters that govern reporting and orphan detection.
//!
//! Configuration files are YAML (`.yaml`/`.yml`) or JSON (`.json`). The column
//! mapping keeps the order in which entries appear in the file.

use std::{fmt, fs, path::Path};

use anyhow::{Context, Result as AnyResult};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::error::{Result, SyncError};

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_REPORT_TEMPLATE: &str = "sync_diff_{timestamp}.log";
pub const DEFAULT_STATUS_COLUMN: &str = "Status";
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Ordered SOT column → TGT column pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pairs: Vec<(String, String)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair; a repeated SOT column replaces the earlier target in place.
    pub fn insert(&mut self, sot: impl Into<String>, tgt: impl Into<String>) {
        let sot = sot.into();
        let tgt = tgt.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == sot) {
            Some(pair) => pair.1 = tgt,
            None => self.pairs.push((sot, tgt)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn sot_columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(s, _)| s.as_str())
    }

    pub fn tgt_columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, t)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<S, T> FromIterator<(S, T)> for ColumnMapping
where
    S: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (sot, tgt) in iter {
            mapping.insert(sot, tgt);
        }
        mapping
    }
}

impl Serialize for ColumnMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (sot, tgt) in &self.pairs {
            map.serialize_entry(sot, tgt)?;
        }
        map.end()
    }
}

struct MappingVisitor;

impl<'de> Visitor<'de> for MappingVisitor {
    type Value = ColumnMapping;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of SOT column names to TGT column names")
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut access: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut mapping = ColumnMapping::new();
        while let Some((sot, tgt)) = access.next_entry::<String, String>()? {
            mapping.insert(sot.trim(), tgt.trim());
        }
        Ok(mapping)
    }
}

impl<'de> Deserialize<'de> for ColumnMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(MappingVisitor)
    }
}

/// Filters shared by the diff reporter and the orphan detector.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub id_prefix: Option<String>,
    pub valid_ids: Option<std::collections::HashSet<String>>,
}

impl RecordFilter {
    /// Prefix is checked before set membership.
    pub fn admits(&self, id: &str) -> bool {
        if let Some(prefix) = &self.id_prefix
            && !id.starts_with(prefix.as_str())
        {
            return false;
        }
        match &self.valid_ids {
            // An empty restriction set restricts nothing.
            Some(valid) if !valid.is_empty() => valid.contains(id),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    pub sot_id_column: String,
    pub tgt_id_column: String,
    pub column_mapping: ColumnMapping,
    #[serde(default)]
    pub id_prefix: Option<String>,
    #[serde(default)]
    pub valid_ids: Option<Vec<String>>,
    #[serde(default)]
    pub orphan_ignore_statuses: Vec<String>,
    #[serde(default = "default_status_column")]
    pub status_column: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_report_template")]
    pub report_template: String,
}

fn default_status_column() -> String {
    DEFAULT_STATUS_COLUMN.to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_report_template() -> String {
    DEFAULT_REPORT_TEMPLATE.to_string()
}

impl SyncConfig {
    pub fn load(path: &Path) -> AnyResult<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading configuration from {path:?}"))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: SyncConfig = if is_json {
            serde_json::from_str(&raw).context("Parsing configuration JSON")?
        } else {
            serde_yaml::from_str(&raw).context("Parsing configuration YAML")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would make matching undefined.
    pub fn validate(&self) -> Result<()> {
        if self.sot_id_column.trim().is_empty() {
            return Err(SyncError::configuration(
                "SOT unique ID column must be provided",
            ));
        }
        if self.tgt_id_column.trim().is_empty() {
            return Err(SyncError::configuration(
                "TGT unique ID column must be provided",
            ));
        }
        if self.column_mapping.is_empty() {
            return Err(SyncError::configuration(
                "Column mapping must contain at least one entry",
            ));
        }
        for (sot, tgt) in self.column_mapping.iter() {
            if sot.is_empty() || tgt.is_empty() {
                return Err(SyncError::configuration(format!(
                    "Column mapping entry '{sot}' -> '{tgt}' has a blank column name"
                )));
            }
            if tgt == self.tgt_id_column {
                return Err(SyncError::configuration(format!(
                    "Column mapping entry '{sot}' targets the TGT unique ID column '{tgt}'"
                )));
            }
        }
        if !self.report_template.contains(TIMESTAMP_PLACEHOLDER) {
            return Err(SyncError::configuration(format!(
                "Report template '{}' must contain {TIMESTAMP_PLACEHOLDER}",
                self.report_template
            )));
        }
        Ok(())
    }

    pub fn record_filter(&self) -> RecordFilter {
        RecordFilter {
            id_prefix: self.id_prefix.clone().filter(|p| !p.is_empty()),
            valid_ids: self
                .valid_ids
                .as_ref()
                .map(|ids| ids.iter().map(|id| id.trim().to_string()).collect()),
        }
    }
}
