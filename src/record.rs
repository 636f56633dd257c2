//! Records and datasets as handed over by the I/O layer.
//!
//! A [`Record`] is a name-keyed set of trimmed cell values. Absent keys and
//! blank cells are indistinguishable: both read back as `""`. A [`Dataset`]
//! adds the header row (in file order) and a label used in error messages.

use std::collections::{BTreeMap, BTreeSet};

/// Free-text marker that shields a record from the change report.
pub const PROTECTED_MARKER: &str = "Record Should Not be Touched";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value of `column`, or `""` when the column is absent.
    pub fn value(&self, column: &str) -> &str {
        self.fields.get(column).map(|v| v.trim()).unwrap_or("")
    }

    /// Identifier stored under `column`, `None` when it is blank or absent.
    pub fn id(&self, column: &str) -> Option<&str> {
        let value = self.value(column);
        (!value.is_empty()).then_some(value)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> BTreeSet<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// True when any value carries [`PROTECTED_MARKER`].
    pub fn is_protected(&self) -> bool {
        self.fields.values().any(|v| v.contains(PROTECTED_MARKER))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Ordered rows from one source file.
///
/// `headers` holds the named columns only. The file's header row and the
/// cells of every loaded row are also kept as read, blank header cells and
/// cells past the header width included, so the file can be written back
/// with only named cells replaced.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub label: String,
    pub headers: Vec<String>,
    pub rows: Vec<Record>,
    pub raw_headers: Vec<String>,
    /// Parallel to the leading `rows`; rows appended later have no entry.
    pub raw_rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(label: impl Into<String>, headers: Vec<String>, rows: Vec<Record>) -> Self {
        Self {
            label: label.into(),
            raw_headers: headers.clone(),
            headers,
            rows,
            raw_rows: Vec::new(),
        }
    }

    pub fn with_raw(mut self, raw_headers: Vec<String>, raw_rows: Vec<Vec<String>>) -> Self {
        self.raw_headers = raw_headers;
        self.raw_rows = raw_rows;
        self
    }

    /// Raw column position of every named column, in file order.
    pub fn column_positions(&self) -> Vec<(usize, &str)> {
        self.raw_headers
            .iter()
            .enumerate()
            .map(|(pos, name)| (pos, name.trim()))
            .filter(|(_, name)| !name.is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
