#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tabsync::{Record, config::ColumnMapping};
use tempfile::{TempDir, tempdir};

/// Builds a record from `(column, value)` pairs.
pub fn record(pairs: &[(&str, &str)]) -> Record {
    pairs.iter().copied().collect()
}

pub fn mapping(pairs: &[(&str, &str)]) -> ColumnMapping {
    pairs.iter().copied().collect()
}

pub fn ids<'a>(rows: &'a [Record], column: &str) -> Vec<&'a str> {
    rows.iter().filter_map(|row| row.id(column)).collect()
}

pub const CONFIG_YAML: &str = r#"sot_id_column: REC ID
tgt_id_column: Record ID
column_mapping:
  REC Name: Record Name
  Description: Description
  Owner: Owner
  Status: Status
id_prefix: REC-
orphan_ignore_statuses: [Retired]
"#;

pub const SOT_CSV: &str = "\
REC ID,REC Name,Description,Owner,Status,Notes
REC-001,Alpha,New desc,Alice,Active,internal
REC-002,Beta,Brand new,Bob,Active,internal
REC-003,Gamma,Same,Carol,Active,
";

pub const TGT_CSV: &str = "\
Record ID,Record Name,Description,Owner,Status,Reviewer
REC-001,Alpha,Old desc,Alice,Active,Zed
REC-003,Gamma,Same,Carol,Active,Yan
REC-999,Legacy,Orphan row,Dan,Active,Xi
REC-998,Retired one,Gone,Eve,Retired,Wu
OLD-100,Imported,Out of scope,Fay,Active,Vo
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
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

    /// Writes the sample SOT, TGT and configuration files.
    pub fn with_samples(&self) -> (PathBuf, PathBuf, PathBuf) {
        (
            self.write("sot.csv", SOT_CSV),
            self.write("tgt.csv", TGT_CSV),
            self.write("sync.yaml", CONFIG_YAML),
        )
    }
}
