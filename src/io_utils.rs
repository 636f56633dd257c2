//! CSV input and output for SOT and TGT datasets.
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, unless
//!   overridden on the command line.
//! - **Encoding**: inputs are decoded via `encoding_rs`, defaulting to UTF-8.
//!   Output is written in the same encoding as the TGT input.
//! - **Reading**: header cells are trimmed, blank header cells name no
//!   column, and rows blank in every named column are skipped. The raw header
//!   row and raw cells are kept alongside the records.
//! - **Writing**: the TGT header row is written back verbatim. Each loaded
//!   row is written from its raw cells with only changed named cells
//!   replaced; appended records are laid out by header-resolved position.

use std::{
    collections::HashSet,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    error::SyncError,
    record::{Dataset, Record},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// How a dataset file is decoded.
#[derive(Debug, Clone, Copy)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl CsvFormat {
    pub fn for_path(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Self {
            delimiter: resolve_input_delimiter(path, delimiter),
            encoding,
        }
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

fn decode_raw(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Loads `path` into a [`Dataset`] labelled `label`.
pub fn read_dataset(path: &Path, label: &str, format: CsvFormat) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Opening {label} file {path:?}"))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(format.delimiter)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let raw_headers = reader
        .byte_headers()
        .with_context(|| format!("Reading {label} headers from {path:?}"))?
        .iter()
        .map(|field| decode_raw(field, format.encoding))
        .collect::<Result<Vec<_>>>()?;

    let columns: Vec<(usize, String)> = raw_headers
        .iter()
        .enumerate()
        .map(|(pos, name)| (pos, name.trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    let mut seen = HashSet::new();
    for (_, name) in &columns {
        if !seen.insert(name.as_str()) {
            return Err(SyncError::schema(format!(
                "{path:?}: duplicate column name '{name}' detected in {label}"
            ))
            .into());
        }
    }

    let mut rows = Vec::new();
    let mut raw_rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record
            .with_context(|| format!("Reading {label} row {} in {path:?}", row_idx + 2))?;
        let cells = record
            .iter()
            .map(|field| decode_raw(field, format.encoding))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Decoding {label} row {}", row_idx + 2))?;
        let mut row = Record::new();
        let mut any_value = false;
        for (position, name) in &columns {
            let value = cells.get(*position).map_or("", |cell| cell.trim());
            any_value |= !value.is_empty();
            row.set(name.as_str(), value);
        }
        if any_value {
            rows.push(row);
            raw_rows.push(cells);
        }
    }

    let headers = columns.into_iter().map(|(_, name)| name).collect::<Vec<_>>();
    debug!(
        "{label}: {} row(s) across {} column(s) from {path:?}",
        rows.len(),
        headers.len()
    );
    Ok(Dataset::new(label, headers, rows).with_raw(raw_headers, raw_rows))
}

/// Output file name: `<output_dir>/<tgt stem>_updated_<timestamp>.<ext>`.
pub fn updated_output_path(tgt_path: &Path, output_dir: &Path, timestamp: &str) -> PathBuf {
    let stem = tgt_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("target");
    let extension = tgt_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("csv");
    output_dir.join(format!("{stem}_updated_{timestamp}.{extension}"))
}

/// Writes `dataset` back in its original layout.
///
/// Loaded rows keep every raw cell, including cells under blank headers and
/// past the header width; a named cell is replaced only when its trimmed
/// value changed. Appended records fill the named positions and leave the
/// rest blank.
pub fn write_dataset(path: &Path, dataset: &Dataset, format: CsvFormat) -> Result<()> {
    let positions = dataset.column_positions();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .quote_style(QuoteStyle::Necessary)
        .flexible(true)
        .from_writer(Vec::new());
    writer
        .write_record(&dataset.raw_headers)
        .context("Writing output headers")?;
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        let mut cells = dataset.raw_rows.get(row_idx).cloned().unwrap_or_default();
        if cells.len() < dataset.raw_headers.len() {
            cells.resize(dataset.raw_headers.len(), String::new());
        }
        for (position, column) in &positions {
            let value = row.value(column);
            if cells[*position].trim() != value {
                cells[*position] = value.to_string();
            }
        }
        writer
            .write_record(&cells)
            .with_context(|| format!("Writing row {}", row_idx + 2))?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing output buffer: {}", err.error()))?;

    let bytes = if format.encoding == UTF_8 {
        buffer
    } else {
        let text = String::from_utf8(buffer).context("Output is not valid UTF-8")?;
        let (encoded, _, had_errors) = format.encoding.encode(&text);
        if had_errors {
            return Err(anyhow!(
                "Failed to encode output using {}",
                format.encoding.name()
            ));
        }
        encoded.into_owned()
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating output directory {parent:?}"))?;
    }
    fs::write(path, bytes).with_context(|| format!("Creating output file {path:?}"))
}
