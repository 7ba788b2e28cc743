//! Text report assembly, error record export and run summaries.

use std::{fmt::Write as _, io::Write, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    classify::{Classification, ErrorType},
    identity::IdentityResolver,
    io_utils,
    keys::KeyColumns,
    profile::{DistinctMismatch, FormatFinding, NullMismatch, StatisticalDrift, TypeMismatch},
    schema_diff::SchemaDiff,
    value_diff::ValueDiff,
};

/// Everything one comparison run produced.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub generated_at: String,
    pub source_label: String,
    pub target_label: String,
    pub keys: KeyColumns,
    pub source_rows: usize,
    pub target_rows: usize,
    pub schema: SchemaDiff,
    pub type_mismatches: Vec<TypeMismatch>,
    pub null_mismatches: Vec<NullMismatch>,
    pub format_findings: Vec<FormatFinding>,
    pub value_diff: ValueDiff,
    pub statistical_drift: Vec<StatisticalDrift>,
    pub classification: Classification,
    pub distinct_mismatches: Vec<DistinctMismatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub target: String,
    pub key_columns: Vec<String>,
    pub source_records: usize,
    pub target_records: usize,
    pub record_counts_match: bool,
    pub missing_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub full_duplicates: usize,
    pub key_duplicates: usize,
    pub missing_records: usize,
    pub extra_records: usize,
    pub value_mismatches: usize,
}

impl ComparisonReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            source: self.source_label.clone(),
            target: self.target_label.clone(),
            key_columns: self.keys.as_slice().to_vec(),
            source_records: self.source_rows,
            target_records: self.target_rows,
            record_counts_match: self.source_rows == self.target_rows,
            missing_columns: self.schema.missing_in_target.clone(),
            extra_columns: self.schema.extra_in_target.clone(),
            full_duplicates: self.classification.count(ErrorType::FullDuplicate),
            key_duplicates: self.classification.count(ErrorType::KeyDuplicate),
            missing_records: self.classification.count(ErrorType::Missing),
            extra_records: self.classification.count(ErrorType::Extra),
            value_mismatches: self.value_diff.mismatch_count(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== COMPARISON DETAILS ===");
        let _ = writeln!(out, "Comparison performed on: {}", self.generated_at);
        let _ = writeln!(out, "Source: {}", self.source_label);
        let _ = writeln!(out, "Target: {}", self.target_label);
        let _ = writeln!(out, "Key columns: {}", self.keys);

        section(&mut out, "BASIC RECORD COUNT");
        let verdict = if self.source_rows == self.target_rows {
            "PASS"
        } else {
            "FAIL"
        };
        let _ = writeln!(out, "Record Count Check: {verdict}");
        let _ = writeln!(out, "Source records: {}", self.source_rows);
        let _ = writeln!(out, "Target records: {}", self.target_rows);

        section(&mut out, "COLUMN ANALYSIS");
        out.push_str(&render_schema(&self.schema));

        section(&mut out, "DATA TYPE CONSISTENCY");
        for mismatch in &self.type_mismatches {
            let _ = writeln!(
                out,
                "Data type mismatch in column '{}': Source={}, Target={}",
                mismatch.column, mismatch.source, mismatch.target
            );
        }

        section(&mut out, "NULL VALUE ANALYSIS");
        for mismatch in &self.null_mismatches {
            let _ = writeln!(out, "Null value mismatch in '{}':", mismatch.column);
            let _ = writeln!(out, "  Source: {} nulls", mismatch.source_nulls);
            let _ = writeln!(out, "  Target: {} nulls", mismatch.target_nulls);
        }

        section(&mut out, "FORMAT CONSISTENCY");
        for finding in &self.format_findings {
            if let Some((source, target)) = finding.padded {
                let _ = writeln!(
                    out,
                    "Leading/trailing space differences in '{}':",
                    finding.column
                );
                let _ = writeln!(out, "  Source: {source} values with extra spaces");
                let _ = writeln!(out, "  Target: {target} values with extra spaces");
            }
            if finding.case_mismatches > 0 {
                let _ = writeln!(
                    out,
                    "Case sensitivity differences in '{}': {} mismatches",
                    finding.column, finding.case_mismatches
                );
            }
        }

        section(&mut out, "VALUE COMPARISON");
        for group in self.value_diff.line_groups() {
            out.push('\n');
            for line in group {
                let _ = writeln!(out, "{line}");
            }
        }

        section(&mut out, "STATISTICAL COMPARISON");
        for drift in &self.statistical_drift {
            let _ = writeln!(out, "\nStatistical differences in column '{}':", drift.column);
            let _ = writeln!(
                out,
                "  Source: mean={}, median={}",
                fixed2(drift.source.mean),
                fixed2(drift.source.median)
            );
            let _ = writeln!(
                out,
                "  Target: mean={}, median={}",
                fixed2(drift.target.mean),
                fixed2(drift.target.median)
            );
        }

        section(&mut out, "ERROR RECORDS SUMMARY");
        if self.classification.is_empty() {
            let _ = writeln!(out, "No error records found");
        } else {
            out.push_str(&render_error_records(&self.classification, &self.keys));
        }

        section(&mut out, "VALUE DISTRIBUTION");
        for mismatch in &self.distinct_mismatches {
            let _ = writeln!(
                out,
                "Different number of unique values in '{}':",
                mismatch.column
            );
            let _ = writeln!(out, "  Source: {} unique values", mismatch.source_distinct);
            let _ = writeln!(out, "  Target: {} unique values", mismatch.target_distinct);
        }
        out
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n=== {title} ===");
}

fn fixed2(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn render_schema(schema: &SchemaDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Common columns: {}", schema.common.len());
    if !schema.missing_in_target.is_empty() {
        let _ = writeln!(
            out,
            "Missing columns in target: {}",
            schema.missing_in_target.iter().join(", ")
        );
    }
    if !schema.extra_in_target.is_empty() {
        let _ = writeln!(
            out,
            "Extra columns in target: {}",
            schema.extra_in_target.iter().join(", ")
        );
    }
    if schema.missing_in_target.is_empty() && schema.extra_in_target.is_empty() {
        let _ = writeln!(out, "All columns match");
    }
    if !schema.order_differences.is_empty() {
        let _ = writeln!(out, "\nColumn Order Differences:");
        for diff in &schema.order_differences {
            let _ = writeln!(
                out,
                "  Column '{}': position {} in source, position {} in target",
                diff.column, diff.source_position, diff.target_position
            );
        }
    }
    out
}

fn render_error_records(classification: &Classification, keys: &KeyColumns) -> String {
    let resolver = IdentityResolver::new(keys.clone());
    let mut out = String::new();
    let _ = writeln!(out, "Total error records found: {}", classification.len());

    let sections = [
        (ErrorType::FullDuplicate, "Full-row duplicates"),
        (ErrorType::KeyDuplicate, "Key-based duplicates"),
        (ErrorType::Missing, "Missing records in target"),
        (ErrorType::Extra, "Extra records in target"),
    ];
    for (error_type, title) in sections {
        let count = classification.count(error_type);
        if count == 0 {
            continue;
        }
        let _ = writeln!(out, "\n{title} ({count}):");
        for classified in classification.of_type(error_type) {
            let identity = resolver.resolve(&classification.record(classified));
            match error_type {
                ErrorType::FullDuplicate | ErrorType::KeyDuplicate => {
                    let _ = writeln!(
                        out,
                        "  - {identity} in {} (appears {} times)",
                        classified.source, classified.num_errors
                    );
                }
                ErrorType::Missing | ErrorType::Extra => {
                    let _ = writeln!(out, "  - {identity}");
                }
            }
        }
    }
    out
}

pub fn write_text(path: Option<&Path>, text: &str) -> Result<()> {
    let mut writer = io_utils::create_output(path)?;
    writer
        .write_all(text.as_bytes())
        .context("Writing report text")?;
    writer.flush().context("Flushing report text")
}

/// Writes classified records with the column layout of
/// [`Classification::export_columns`].
pub fn write_error_records(path: &Path, classification: &Classification) -> Result<()> {
    let mut writer = io_utils::csv_writer(Some(path))?;
    writer
        .write_record(classification.export_columns())
        .context("Writing error record headers")?;
    for row in classification.export_rows() {
        writer.write_record(&row).context("Writing error record")?;
    }
    writer.flush().context("Flushing error records")
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let mut writer = io_utils::create_output(Some(path))?;
    serde_json::to_writer_pretty(&mut writer, summary).context("Writing summary JSON")?;
    writer.flush().context("Flushing summary JSON")
}

/// Report and error file names derived from the two input file stems.
pub fn output_filenames(source: &Path, target: &Path) -> (String, String) {
    let stem = |path: &Path| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stdin".to_string())
    };
    let suffix = format!("__{}_vs_{}", stem(source), stem(target));
    (
        format!("comparison_results{suffix}.txt"),
        format!("error_records{suffix}.csv"),
    )
}
