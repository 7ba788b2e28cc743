//! Column-level quality checks layered around the core comparison: type
//! consistency, null counts, whitespace/case formatting, numeric drift and
//! distinct value counts. Each check runs independently over the common
//! columns in source order.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    data::Value,
    dataset::{ColumnType, Dataset},
};

const RELATIVE_TOLERANCE: f64 = 1e-5;
const ABSOLUTE_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMismatch {
    pub column: String,
    pub source: ColumnType,
    pub target: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NullMismatch {
    pub column: String,
    pub source_nulls: usize,
    pub target_nulls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatFinding {
    pub column: String,
    /// Values with leading or trailing whitespace, per side; `None` when equal.
    pub padded: Option<(usize, usize)>,
    /// Positions whose lowercased values differ; `0` when not comparable.
    pub case_mismatches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticalDrift {
    pub column: String,
    pub source: NumericSummary,
    pub target: NumericSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistinctMismatch {
    pub column: String,
    pub source_distinct: usize,
    pub target_distinct: usize,
}

fn paired_columns<'a>(
    source: &'a Dataset,
    target: &'a Dataset,
    common: &'a [String],
) -> impl Iterator<Item = (&'a String, usize, usize)> + 'a {
    common.iter().filter_map(|column| {
        Some((
            column,
            source.column_index(column)?,
            target.column_index(column)?,
        ))
    })
}

pub fn type_mismatches(source: &Dataset, target: &Dataset, common: &[String]) -> Vec<TypeMismatch> {
    paired_columns(source, target, common)
        .filter(|(_, s, t)| source.types[*s] != target.types[*t])
        .map(|(column, s, t)| TypeMismatch {
            column: column.clone(),
            source: source.types[s],
            target: target.types[t],
        })
        .collect()
}

pub fn null_mismatches(source: &Dataset, target: &Dataset, common: &[String]) -> Vec<NullMismatch> {
    paired_columns(source, target, common)
        .filter_map(|(column, s, t)| {
            let source_nulls = source.column_values(s).filter(|v| v.is_null()).count();
            let target_nulls = target.column_values(t).filter(|v| v.is_null()).count();
            (source_nulls != target_nulls).then(|| NullMismatch {
                column: column.clone(),
                source_nulls,
                target_nulls,
            })
        })
        .collect()
}

fn padded_count(dataset: &Dataset, idx: usize) -> usize {
    dataset
        .column_values(idx)
        .filter(|value| match value {
            Value::String(s) => s.trim().len() != s.len(),
            _ => false,
        })
        .count()
}

pub fn format_findings(
    source: &Dataset,
    target: &Dataset,
    common: &[String],
) -> Vec<FormatFinding> {
    paired_columns(source, target, common)
        .filter(|(_, s, t)| {
            source.types[*s] == ColumnType::String && target.types[*t] == ColumnType::String
        })
        .filter_map(|(column, s, t)| {
            let source_padded = padded_count(source, s);
            let target_padded = padded_count(target, t);
            let padded = (source_padded != target_padded).then_some((source_padded, target_padded));
            let case_mismatches = if source.len() == target.len() {
                source
                    .column_values(s)
                    .zip(target.column_values(t))
                    .filter(|(a, b)| {
                        a.as_display().to_lowercase() != b.as_display().to_lowercase()
                    })
                    .count()
            } else {
                0
            };
            (padded.is_some() || case_mismatches > 0).then(|| FormatFinding {
                column: column.clone(),
                padded,
                case_mismatches,
            })
        })
        .collect()
}

impl NumericSummary {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
        let std_dev = match mean {
            Some(mean) if count > 1 => {
                let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (count as f64 - 1.0);
                Some(variance.sqrt())
            }
            _ => None,
        };
        Self {
            count,
            mean,
            std_dev,
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }

    fn metrics(&self) -> [Option<f64>; 8] {
        [
            Some(self.count as f64),
            self.mean,
            self.std_dev,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }

    /// Element-wise closeness of every metric; two missing metrics are equal.
    pub fn is_close(&self, other: &Self) -> bool {
        self.metrics()
            .iter()
            .zip(other.metrics().iter())
            .all(|(a, b)| match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => (a - b).abs() <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * b.abs(),
                _ => false,
            })
    }
}

/// Linear interpolation between closest ranks over sorted input.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

fn numeric_summary(dataset: &Dataset, idx: usize) -> NumericSummary {
    NumericSummary::from_values(dataset.column_values(idx).filter_map(Value::as_f64))
}

pub fn statistical_drift(
    source: &Dataset,
    target: &Dataset,
    common: &[String],
) -> Vec<StatisticalDrift> {
    paired_columns(source, target, common)
        .filter(|(_, s, t)| source.types[*s].is_numeric() && target.types[*t].is_numeric())
        .filter_map(|(column, s, t)| {
            let source_summary = numeric_summary(source, s);
            let target_summary = numeric_summary(target, t);
            (!source_summary.is_close(&target_summary)).then(|| StatisticalDrift {
                column: column.clone(),
                source: source_summary,
                target: target_summary,
            })
        })
        .collect()
}

fn distinct_count(dataset: &Dataset, idx: usize) -> usize {
    dataset
        .column_values(idx)
        .filter(|v| !v.is_null())
        .collect::<HashSet<_>>()
        .len()
}

pub fn distinct_mismatches(
    source: &Dataset,
    target: &Dataset,
    common: &[String],
) -> Vec<DistinctMismatch> {
    paired_columns(source, target, common)
        .filter_map(|(column, s, t)| {
            let source_distinct = distinct_count(source, s);
            let target_distinct = distinct_count(target, t);
            (source_distinct != target_distinct).then(|| DistinctMismatch {
                column: column.clone(),
                source_distinct,
                target_distinct,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn summary_matches_describe_style_quantiles() {
        let summary = NumericSummary::from_values([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, Some(2.5));
        assert_eq!(summary.median, Some(2.5));
        assert_eq!(summary.q25, Some(1.75));
        assert_eq!(summary.q75, Some(3.25));
        let std = summary.std_dev.unwrap();
        assert!((std - 1.2909944).abs() < 1e-6);
    }

    #[test]
    fn empty_summary_has_no_metrics() {
        let summary = NumericSummary::from_values(Vec::new());
        assert_eq!(summary.count, 0);
        assert!(summary.mean.is_none());
        assert!(summary.is_close(&NumericSummary::from_values(Vec::new())));
    }

    #[test]
    fn reports_type_null_and_distinct_differences() {
        let source = Dataset::from_rows(
            "s",
            &["id", "code", "note"],
            &[&["1", "10", "a"], &["2", "20", ""]],
        )
        .unwrap();
        let target = Dataset::from_rows(
            "t",
            &["id", "code", "note"],
            &[&["1", "x", "a"], &["2", "x", "b"]],
        )
        .unwrap();
        let cols = common(&["id", "code", "note"]);

        assert_eq!(
            type_mismatches(&source, &target, &cols),
            vec![TypeMismatch {
                column: "code".to_string(),
                source: ColumnType::Integer,
                target: ColumnType::String,
            }]
        );
        assert_eq!(
            null_mismatches(&source, &target, &cols),
            vec![NullMismatch {
                column: "note".to_string(),
                source_nulls: 1,
                target_nulls: 0,
            }]
        );
        let distinct = distinct_mismatches(&source, &target, &cols);
        assert_eq!(distinct.len(), 2);
        assert_eq!(distinct[0].column, "code");
        assert_eq!((distinct[0].source_distinct, distinct[0].target_distinct), (2, 1));
    }

    #[test]
    fn detects_padding_and_case_differences() {
        let source =
            Dataset::from_rows("s", &["name"], &[&[" Ann"], &["bob"]]).unwrap();
        let target = Dataset::from_rows("t", &["name"], &[&["Ann"], &["BOB"]]).unwrap();
        let findings = format_findings(&source, &target, &common(&["name"]));
        assert_eq!(
            findings,
            vec![FormatFinding {
                column: "name".to_string(),
                padded: Some((1, 0)),
                case_mismatches: 1,
            }]
        );
    }

    #[test]
    fn numeric_drift_respects_tolerance() {
        let source = Dataset::from_rows("s", &["v"], &[&["1.0"], &["2.0"]]).unwrap();
        let same = Dataset::from_rows("t", &["v"], &[&["1.000001"], &["2.0"]]).unwrap();
        let shifted = Dataset::from_rows("t", &["v"], &[&["5.0"], &["2.0"]]).unwrap();
        assert!(statistical_drift(&source, &same, &common(&["v"])).is_empty());
        let drift = statistical_drift(&source, &shifted, &common(&["v"]));
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].target.mean, Some(3.5));
    }
}
