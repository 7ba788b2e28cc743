//! In-memory tabular model shared by every comparison stage.
//!
//! A [`Dataset`] holds the declared column order, one inferred
//! [`ColumnType`] per column and the typed rows. [`Record`] is a borrowed
//! view pairing column names with one row's values. CSV loading samples every
//! row to infer column types, then parses each cell; configured null tokens
//! load as [`Value::Null`].

use std::{collections::HashSet, fmt, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Value, parse_naive_date, parse_naive_datetime, parse_typed_value},
    io_utils,
};

pub const DEFAULT_NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NULL", "null", "NaN", "nan"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl ColumnType {
    /// Textual and temporal values are quoted in value-diff output.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ColumnType::String | ColumnType::Date | ColumnType::DateTime
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::String => "String",
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::Boolean => "Boolean",
            ColumnType::Date => "Date",
            ColumnType::DateTime => "DateTime",
        };
        f.write_str(label)
    }
}

/// Which of the two compared datasets a record or column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Borrowed view of one row: an ordered mapping from column name to value.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn new(columns: &'a [String], values: &'a [Value]) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub types: Vec<ColumnType>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub null_tokens: Vec<String>,
}

impl LoadOptions {
    pub fn new(delimiter: u8, encoding: &'static Encoding) -> Self {
        Self {
            delimiter,
            encoding,
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_index(name)
            .and_then(|idx| self.types.get(idx).copied())
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        self.rows
            .get(row)
            .map(|values| Record::new(&self.headers, values))
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows
            .iter()
            .map(|values| Record::new(&self.headers, values))
    }

    /// Iterates one column's values; missing cells in short rows read as null.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows
            .iter()
            .map(move |row| row.get(idx).unwrap_or(&Value::Null))
    }

    /// Builds a dataset from raw text cells, inferring column types first.
    pub fn from_raw(
        name: impl Into<String>,
        headers: Vec<String>,
        raw_rows: Vec<Vec<String>>,
        null_tokens: &[String],
    ) -> Result<Self> {
        let name = name.into();
        let headers = dedupe_headers(headers);
        let nulls: HashSet<&str> = null_tokens.iter().map(|t| t.as_str()).collect();

        let mut candidates = vec![TypeCandidate::new(); headers.len()];
        for (row_idx, row) in raw_rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(anyhow!(
                    "Row {} in '{name}' has {} field(s), expected {}",
                    row_idx + 2,
                    row.len(),
                    headers.len()
                ));
            }
            for (candidate, cell) in candidates.iter_mut().zip(row) {
                if !nulls.contains(cell.as_str()) {
                    candidate.observe(cell);
                }
            }
        }
        let types: Vec<ColumnType> = candidates.iter().map(TypeCandidate::decide).collect();

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (row_idx, raw) in raw_rows.into_iter().enumerate() {
            let mut typed = Vec::with_capacity(raw.len());
            for (col_idx, cell) in raw.iter().enumerate() {
                if nulls.contains(cell.as_str()) {
                    typed.push(Value::Null);
                    continue;
                }
                let value = parse_typed_value(cell, types[col_idx]).with_context(|| {
                    format!(
                        "Row {} column '{}' in '{name}'",
                        row_idx + 2,
                        headers[col_idx]
                    )
                })?;
                typed.push(value);
            }
            rows.push(typed);
        }

        Ok(Dataset {
            name,
            headers,
            types,
            rows,
        })
    }

    /// Convenience constructor over string literals using the default null tokens.
    pub fn from_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let null_tokens: Vec<String> = DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect();
        Self::from_raw(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
            &null_tokens,
        )
    }

    pub fn from_csv_path(path: &Path, name: &str, options: &LoadOptions) -> Result<Self> {
        let mut reader = io_utils::open_input(path, options.delimiter)?;
        let headers = io_utils::read_header_row(&mut reader, options.encoding)
            .with_context(|| format!("Reading headers from {path:?}"))?;
        let mut raw_rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            raw_rows.push(io_utils::decode_record(&record, options.encoding)?);
        }
        Self::from_raw(name, headers, raw_rows, &options.null_tokens)
            .with_context(|| format!("Loading dataset from {path:?}"))
    }
}

/// Reads only the header row of `path`, normalised exactly as a full load
/// would name the columns.
pub fn read_headers(path: &Path, options: &LoadOptions) -> Result<Vec<String>> {
    let mut reader = io_utils::open_input(path, options.delimiter)?;
    let headers = io_utils::read_header_row(&mut reader, options.encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    Ok(dedupe_headers(headers))
}

/// Repeated header names get a `.N` suffix so every column is addressable.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());
    for name in headers {
        let mut candidate = name.clone();
        let mut counter = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{name}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

/// Largest magnitude an integer can have and still survive widening to `f64`.
const F64_EXACT_INTEGER_LIMIT: i64 = 1 << 53;

/// Optional sign followed by ASCII digits only.
fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Narrows a column's type from its non-null cells.
///
/// A typed column must render every cell back to its exact text, because key
/// tuples, merge keys, identities and exports all work on the rendered form.
/// Floats are the one lenient case (`3.0` renders as `3`), but an integer
/// literal that cannot be held exactly as `i64` and `f64` keeps the column
/// textual.
#[derive(Debug, Clone)]
struct TypeCandidate {
    observed: bool,
    possible_integer: bool,
    possible_float: bool,
    possible_boolean: bool,
    possible_date: bool,
    possible_datetime: bool,
    wide_integer: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            observed: false,
            possible_integer: true,
            possible_float: true,
            possible_boolean: true,
            possible_date: true,
            possible_datetime: true,
            wide_integer: false,
        }
    }

    fn observe(&mut self, value: &str) {
        self.observed = true;
        if self.possible_boolean && !matches!(value, "true" | "false") {
            self.possible_boolean = false;
        }
        if is_integer_literal(value) {
            match value.parse::<i64>() {
                Ok(parsed) if parsed.to_string() == value => {
                    if parsed.unsigned_abs() > F64_EXACT_INTEGER_LIMIT as u64 {
                        self.wide_integer = true;
                    }
                }
                _ => {
                    self.possible_integer = false;
                    self.possible_float = false;
                }
            }
        } else {
            self.possible_integer = false;
            if self.possible_float && value.parse::<f64>().is_err() {
                self.possible_float = false;
            }
        }
        if self.possible_date
            && !parse_naive_date(value).is_ok_and(|d| Value::Date(d).as_display() == value)
        {
            self.possible_date = false;
        }
        if self.possible_datetime
            && !parse_naive_datetime(value)
                .is_ok_and(|dt| Value::DateTime(dt).as_display() == value)
        {
            self.possible_datetime = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if !self.observed {
            ColumnType::String
        } else if self.possible_boolean {
            ColumnType::Boolean
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float && !self.wide_integer {
            ColumnType::Float
        } else if self.possible_date {
            ColumnType::Date
        } else if self.possible_datetime {
            ColumnType::DateTime
        } else {
            ColumnType::String
        }
    }
}
