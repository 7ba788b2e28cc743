//! Cell-level comparison of records whose merge key exists in both datasets.
//!
//! Records are inner-joined on their merge key. When several records share a
//! merge key only the first source record and the first target record with
//! that key are compared; the rest are dropped and counted in
//! [`ValueDiff::dropped_duplicate_keys`]. A column that cannot be compared is
//! reported as a failed outcome and the remaining columns are still compared.

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::Serialize;

use crate::{
    data::Value,
    dataset::{Dataset, Side},
    error::{ColumnComparisonError, ConfigurationError},
    identity::IdentityResolver,
    keys::{KeyColumns, merge_key},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub identity: String,
    pub source_value: Value,
    pub target_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMismatches {
    pub column: String,
    /// Values render quoted when either side's column is textual or temporal.
    pub quoted: bool,
    pub mismatches: Vec<Mismatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    Mismatches(ColumnMismatches),
    Failed {
        column: String,
        error: ColumnComparisonError,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueDiff {
    pub columns: Vec<ColumnOutcome>,
    pub matched_pairs: usize,
    pub dropped_duplicate_keys: usize,
}

impl ValueDiff {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn mismatch_count(&self) -> usize {
        self.columns
            .iter()
            .map(|outcome| match outcome {
                ColumnOutcome::Mismatches(column) => column.mismatches.len(),
                ColumnOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Report lines, in comparison order.
    pub fn lines(&self) -> Vec<String> {
        self.line_groups().into_iter().flatten().collect()
    }

    /// One block of lines per compared column: a heading and its entries, or
    /// a single error line.
    pub fn line_groups(&self) -> Vec<Vec<String>> {
        let mut groups = Vec::with_capacity(self.columns.len());
        for outcome in &self.columns {
            let mut lines = Vec::new();
            match outcome {
                ColumnOutcome::Mismatches(column) => {
                    lines.push(format!("Value mismatches in column '{}':", column.column));
                    for mismatch in &column.mismatches {
                        lines.push(format!("  - {}:", mismatch.identity));
                        lines.push(format!(
                            "    Source: {}",
                            render(&mismatch.source_value, column.quoted)
                        ));
                        lines.push(format!(
                            "    Target: {}",
                            render(&mismatch.target_value, column.quoted)
                        ));
                    }
                }
                ColumnOutcome::Failed { column, error } => {
                    lines.push(format!("Error comparing column '{column}': {error}"));
                }
            }
            groups.push(lines);
        }
        groups
    }
}

fn render(value: &Value, quoted: bool) -> String {
    if quoted {
        format!("'{value}'")
    } else {
        value.to_string()
    }
}

pub fn compare_values(
    source: &Dataset,
    target: &Dataset,
    common_columns: &[String],
    keys: &KeyColumns,
) -> Result<ValueDiff, ConfigurationError> {
    let indices = keys.resolve(source, target)?;
    let resolver = IdentityResolver::new(keys.clone());

    let mut target_first: HashMap<String, usize> = HashMap::new();
    let mut target_counts: HashMap<String, usize> = HashMap::new();
    for (row_idx, row) in target.rows.iter().enumerate() {
        let key = merge_key(row, &indices.target);
        *target_counts.entry(key.clone()).or_insert(0) += 1;
        target_first.entry(key).or_insert(row_idx);
    }

    let mut source_counts: HashMap<String, usize> = HashMap::new();
    for row in &source.rows {
        *source_counts
            .entry(merge_key(row, &indices.source))
            .or_insert(0) += 1;
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut dropped = 0usize;
    for (row_idx, row) in source.rows.iter().enumerate() {
        let key = merge_key(row, &indices.source);
        if seen.contains(&key) {
            continue;
        }
        if let Some(target_idx) = target_first.get(&key) {
            let candidates = source_counts.get(&key).copied().unwrap_or(1)
                * target_counts.get(&key).copied().unwrap_or(1);
            if candidates > 1 {
                dropped += 1;
            }
            pairs.push((row_idx, *target_idx));
            seen.insert(key);
        }
    }
    if dropped > 0 {
        warn!(
            "{dropped} merge key(s) matched more than one record pair; only the first pair per key was compared"
        );
    }

    let mut diff = ValueDiff {
        columns: Vec::new(),
        matched_pairs: pairs.len(),
        dropped_duplicate_keys: dropped,
    };
    for column in common_columns {
        if keys.contains(column) {
            continue;
        }
        match compare_column(source, target, column, &pairs, &resolver) {
            Ok(Some(mismatches)) => diff.columns.push(ColumnOutcome::Mismatches(mismatches)),
            Ok(None) => {}
            Err(error) => {
                warn!("Skipping column '{column}': {error}");
                diff.columns.push(ColumnOutcome::Failed {
                    column: column.clone(),
                    error,
                });
            }
        }
    }
    Ok(diff)
}

fn compare_column(
    source: &Dataset,
    target: &Dataset,
    column: &str,
    pairs: &[(usize, usize)],
    resolver: &IdentityResolver,
) -> Result<Option<ColumnMismatches>, ColumnComparisonError> {
    let missing = |side: Side| ColumnComparisonError::MissingColumn {
        column: column.to_string(),
        side,
    };
    let source_idx = source
        .column_index(column)
        .ok_or_else(|| missing(Side::Source))?;
    let target_idx = target
        .column_index(column)
        .ok_or_else(|| missing(Side::Target))?;
    let quoted = source.types[source_idx].is_textual() || target.types[target_idx].is_textual();

    let mut mismatches = Vec::new();
    for (source_row, target_row) in pairs {
        let source_value = source.rows[*source_row]
            .get(source_idx)
            .unwrap_or(&Value::Null);
        let target_value = target.rows[*target_row]
            .get(target_idx)
            .unwrap_or(&Value::Null);
        if source_value.as_display() == target_value.as_display() {
            continue;
        }
        let identity = source
            .record(*source_row)
            .map(|record| resolver.resolve(&record))
            .unwrap_or_default();
        mismatches.push(Mismatch {
            identity,
            source_value: source_value.clone(),
            target_value: target_value.clone(),
        });
    }

    if mismatches.is_empty() {
        Ok(None)
    } else {
        Ok(Some(ColumnMismatches {
            column: column.to_string(),
            quoted,
            mismatches,
        }))
    }
}
