//! The per-run report artifact.
//!
//! Callers supply the path template and the timestamp token; this module only
//! substitutes `{timestamp}` and performs the two writes a run makes: the diff
//! section (truncating) followed by the orphan section (appending).

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    config::TIMESTAMP_PLACEHOLDER,
    error::{Result, SyncError},
};

#[derive(Debug, Clone)]
pub struct ReportArtifact {
    path: PathBuf,
}

impl ReportArtifact {
    /// Resolves `template` under `base_dir` unless the template is absolute.
    pub fn new(base_dir: &Path, template: &str, timestamp: &str) -> Self {
        let resolved = PathBuf::from(template.replace(TIMESTAMP_PLACEHOLDER, timestamp));
        let path = if resolved.is_absolute() {
            resolved
        } else {
            base_dir.join(resolved)
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, contents: &str) -> Result<()> {
        self.ensure_parent()?;
        fs::write(&self.path, contents).map_err(|err| SyncError::report(&self.path, err))
    }

    pub fn append(&self, contents: &str) -> Result<()> {
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| SyncError::report(&self.path, err))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|err| SyncError::report(&self.path, err))
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|err| SyncError::report(parent, err))
            }
            _ => Ok(()),
        }
    }
}
