//! Duplicate and presence classification.
//!
//! Every source and target record that is a full-row duplicate, a key-based
//! duplicate, missing from the target or extra in the target is reported once
//! per distinct row (duplicates) or distinct key (presence). Duplicate
//! detection and presence detection are independent passes, so a duplicated
//! source key that is also absent from the target is reported under both
//! `f`/`k` and `m`.
//!
//! The output is sorted by error code (`e`, `f`, `k`, `m`) and then by side
//! label; the sort is stable, so within one group records keep the order in
//! which they first occur in their dataset.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    dataset::{Dataset, Record, Side},
    error::ClassificationError,
    keys::{KeyColumns, KeyTuple, key_tuple},
};

pub const ERROR_TYPE_COLUMN: &str = "error_type";
pub const SOURCE_COLUMN: &str = "source";
pub const NUM_ERRORS_COLUMN: &str = "num_errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "f")]
    FullDuplicate,
    #[serde(rename = "k")]
    KeyDuplicate,
    #[serde(rename = "m")]
    Missing,
    #[serde(rename = "e")]
    Extra,
}

impl ErrorType {
    pub const ALL: [ErrorType; 4] = [
        ErrorType::FullDuplicate,
        ErrorType::KeyDuplicate,
        ErrorType::Missing,
        ErrorType::Extra,
    ];

    /// Stable single-letter serialization.
    pub fn code(self) -> &'static str {
        match self {
            ErrorType::FullDuplicate => "f",
            ErrorType::KeyDuplicate => "k",
            ErrorType::Missing => "m",
            ErrorType::Extra => "e",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub error_type: ErrorType,
    pub source: Side,
    pub num_errors: usize,
    /// Zero-based index of the displayed row within its dataset.
    pub row: usize,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub records: Vec<ClassifiedRecord>,
    source_headers: Vec<String>,
    target_headers: Vec<String>,
}

impl Classification {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn of_type(&self, error_type: ErrorType) -> impl Iterator<Item = &ClassifiedRecord> {
        self.records
            .iter()
            .filter(move |r| r.error_type == error_type)
    }

    pub fn count(&self, error_type: ErrorType) -> usize {
        self.of_type(error_type).count()
    }

    pub fn headers(&self, side: Side) -> &[String] {
        match side {
            Side::Source => &self.source_headers,
            Side::Target => &self.target_headers,
        }
    }

    pub fn record<'a>(&'a self, classified: &'a ClassifiedRecord) -> Record<'a> {
        Record::new(self.headers(classified.source), &classified.values)
    }

    /// Source columns, then target-only columns, then the three tag columns.
    pub fn export_columns(&self) -> Vec<String> {
        let mut columns = self.source_headers.clone();
        for column in &self.target_headers {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns.push(ERROR_TYPE_COLUMN.to_string());
        columns.push(SOURCE_COLUMN.to_string());
        columns.push(NUM_ERRORS_COLUMN.to_string());
        columns
    }

    pub fn export_rows(&self) -> Vec<Vec<String>> {
        let columns = self.export_columns();
        let data_columns = &columns[..columns.len() - 3];
        self.records
            .iter()
            .map(|classified| {
                let record = self.record(classified);
                let mut row = data_columns
                    .iter()
                    .map(|column| {
                        record
                            .get(column)
                            .map(Value::as_csv_field)
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>();
                row.push(classified.error_type.code().to_string());
                row.push(classified.source.label().to_string());
                row.push(classified.num_errors.to_string());
                row
            })
            .collect()
    }
}

pub fn classify(
    source: &Dataset,
    target: &Dataset,
    keys: &KeyColumns,
) -> Result<Classification, ClassificationError> {
    let indices = keys.resolve(source, target)?;
    ensure_rectangular(source, Side::Source)?;
    ensure_rectangular(target, Side::Target)?;

    let (source_full, source_mask) = full_duplicates(source, Side::Source);
    let (target_full, target_mask) = full_duplicates(target, Side::Target);
    let source_keyed = key_duplicates(source, Side::Source, &indices.source, &source_mask);
    let target_keyed = key_duplicates(target, Side::Target, &indices.target, &target_mask);

    let source_keys = key_set(source, &indices.source);
    let target_keys = key_set(target, &indices.target);
    let missing = absent_keys(
        source,
        Side::Source,
        &indices.source,
        &target_keys,
        ErrorType::Missing,
    );
    let extra = absent_keys(
        target,
        Side::Target,
        &indices.target,
        &source_keys,
        ErrorType::Extra,
    );

    debug!(
        "Classified f={}/{} k={}/{} m={} e={}",
        source_full.len(),
        target_full.len(),
        source_keyed.len(),
        target_keyed.len(),
        missing.len(),
        extra.len()
    );

    let mut records = Vec::with_capacity(
        source_full.len()
            + target_full.len()
            + source_keyed.len()
            + target_keyed.len()
            + missing.len()
            + extra.len(),
    );
    records.extend(source_full);
    records.extend(target_full);
    records.extend(source_keyed);
    records.extend(target_keyed);
    records.extend(missing);
    records.extend(extra);
    records.sort_by(|a, b| {
        a.error_type
            .code()
            .cmp(b.error_type.code())
            .then_with(|| a.source.label().cmp(b.source.label()))
    });

    Ok(Classification {
        records,
        source_headers: source.headers.clone(),
        target_headers: target.headers.clone(),
    })
}

fn ensure_rectangular(dataset: &Dataset, side: Side) -> Result<(), ClassificationError> {
    let expected = dataset.headers.len();
    match dataset
        .rows
        .iter()
        .position(|row| row.len() != expected)
    {
        Some(row) => Err(ClassificationError::RaggedRow {
            side,
            row: row + 1,
            expected,
            found: dataset.rows[row].len(),
        }),
        None => Ok(()),
    }
}

fn classified(
    dataset: &Dataset,
    side: Side,
    error_type: ErrorType,
    row: usize,
    num_errors: usize,
) -> ClassifiedRecord {
    ClassifiedRecord {
        error_type,
        source: side,
        num_errors,
        row,
        values: dataset.rows[row].clone(),
    }
}

/// Groups identical rows. Returns one record per duplicated row value and a
/// per-row mask of every row belonging to a duplicated group.
fn full_duplicates(dataset: &Dataset, side: Side) -> (Vec<ClassifiedRecord>, Vec<bool>) {
    let mut group_of: HashMap<&[Value], usize> = HashMap::new();
    let mut groups: Vec<(usize, usize)> = Vec::new();
    let mut row_groups = Vec::with_capacity(dataset.rows.len());
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        let group = *group_of.entry(row.as_slice()).or_insert_with(|| {
            groups.push((row_idx, 0));
            groups.len() - 1
        });
        groups[group].1 += 1;
        row_groups.push(group);
    }

    let mask = row_groups
        .iter()
        .map(|group| groups[*group].1 > 1)
        .collect();
    let records = groups
        .iter()
        .filter(|(_, count)| *count > 1)
        .map(|(first, count)| classified(dataset, side, ErrorType::FullDuplicate, *first, *count))
        .collect();
    (records, mask)
}

/// Groups rows by key, skipping full duplicates and every key already
/// reported as a full duplicate, so a key never carries both `f` and `k`.
fn key_duplicates(
    dataset: &Dataset,
    side: Side,
    key_indices: &[usize],
    full_mask: &[bool],
) -> Vec<ClassifiedRecord> {
    let full_keys: HashSet<KeyTuple> = dataset
        .rows
        .iter()
        .zip(full_mask)
        .filter(|(_, is_full)| **is_full)
        .map(|(row, _)| key_tuple(row, key_indices))
        .collect();

    let mut group_of: HashMap<KeyTuple, usize> = HashMap::new();
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        if full_mask[row_idx] {
            continue;
        }
        let key = key_tuple(row, key_indices);
        if full_keys.contains(&key) {
            continue;
        }
        let group = *group_of.entry(key).or_insert_with(|| {
            groups.push((row_idx, 0));
            groups.len() - 1
        });
        groups[group].1 += 1;
    }

    groups
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(first, count)| classified(dataset, side, ErrorType::KeyDuplicate, first, count))
        .collect()
}

fn key_set(dataset: &Dataset, key_indices: &[usize]) -> HashSet<KeyTuple> {
    dataset
        .rows
        .iter()
        .map(|row| key_tuple(row, key_indices))
        .collect()
}

/// One record per distinct key of `dataset` that is absent from `other_keys`.
fn absent_keys(
    dataset: &Dataset,
    side: Side,
    key_indices: &[usize],
    other_keys: &HashSet<KeyTuple>,
    error_type: ErrorType,
) -> Vec<ClassifiedRecord> {
    let mut emitted: HashSet<KeyTuple> = HashSet::new();
    let mut records = Vec::new();
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        let key = key_tuple(row, key_indices);
        if other_keys.contains(&key) || emitted.contains(&key) {
            continue;
        }
        emitted.insert(key);
        records.push(classified(dataset, side, error_type, row_idx, 1));
    }
    records
}
