use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Reconcile two CSV datasets and report data quality differences", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare a source and a target dataset and produce a data quality report
    Compare(CompareArgs),
    /// Show column set and column order differences between two datasets
    Columns(ColumnsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    /// Source (reference) CSV file
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Target CSV file compared against the source
    #[arg(short = 't', long = "target")]
    pub target: PathBuf,
    /// Key column(s) identifying a record; repeat or comma-separate for composite keys
    #[arg(short = 'k', long = "key", action = clap::ArgAction::Append)]
    pub keys: Vec<String>,
    /// YAML comparison config; command-line flags take precedence
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of both input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Cell text treated as null; repeatable, replaces the default token list
    #[arg(long = "null-token", action = clap::ArgAction::Append)]
    pub null_tokens: Vec<String>,
    /// Display name for the source dataset (defaults to its file name)
    #[arg(long = "source-label")]
    pub source_label: Option<String>,
    /// Display name for the target dataset (defaults to its file name)
    #[arg(long = "target-label")]
    pub target_label: Option<String>,
    /// Write the text report to this file (stdout if omitted)
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,
    /// Write classified error records to this CSV file
    #[arg(short = 'e', long = "errors-output")]
    pub errors_output: Option<PathBuf>,
    /// Write per-category counts as JSON to this file
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,
    /// Directory receiving the report and error records under derived names
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ColumnsArgs {
    /// Source (reference) CSV file
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Target CSV file
    #[arg(short = 't', long = "target")]
    pub target: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of both input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
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
