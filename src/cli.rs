use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Reconcile a target dataset against a source of truth", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Propagate SOT values into TGT, write the updated TGT and a change report
    Sync(SyncArgs),
    /// Run the pre-sync checks without writing anything
    Validate(InputArgs),
    /// List TGT records whose identifier is absent from SOT
    Orphans(InputArgs),
    /// Compare two TGT snapshots and write a change report
    Diff(DiffArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Source-of-truth CSV file
    #[arg(long = "sot")]
    pub sot: PathBuf,
    /// Target CSV file to reconcile
    #[arg(long = "tgt")]
    pub tgt: PathBuf,
    /// YAML or JSON configuration with identifier columns and column mapping
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Directory for the updated TGT file and the report (overrides the config)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Token substituted into output names (defaults to the current local time)
    #[arg(long)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// TGT snapshot before the change
    #[arg(long = "old")]
    pub old: PathBuf,
    /// TGT snapshot after the change
    #[arg(long = "new")]
    pub new: PathBuf,
    /// YAML or JSON configuration with identifier columns and column mapping
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
