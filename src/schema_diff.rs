//! Column set and column order reconciliation between source and target.

use std::collections::HashSet;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOrderDifference {
    pub column: String,
    /// 1-based position in the source header.
    pub source_position: usize,
    /// 1-based position in the target header.
    pub target_position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    /// Columns present in both, in source order.
    pub common: Vec<String>,
    /// Columns only in source, in source order.
    pub missing_in_target: Vec<String>,
    /// Columns only in target, in target order.
    pub extra_in_target: Vec<String>,
    pub order_differences: Vec<ColumnOrderDifference>,
}

impl SchemaDiff {
    pub fn is_identical(&self) -> bool {
        self.missing_in_target.is_empty()
            && self.extra_in_target.is_empty()
            && self.order_differences.is_empty()
    }
}

pub fn reconcile(source: &[String], target: &[String]) -> SchemaDiff {
    let target_set: HashSet<&str> = target.iter().map(String::as_str).collect();
    let source_set: HashSet<&str> = source.iter().map(String::as_str).collect();

    let mut diff = SchemaDiff::default();
    for (idx, column) in source.iter().enumerate() {
        if !target_set.contains(column.as_str()) {
            diff.missing_in_target.push(column.clone());
            continue;
        }
        diff.common.push(column.clone());
        if let Some(target_idx) = target.iter().position(|c| c == column)
            && target_idx != idx
        {
            diff.order_differences.push(ColumnOrderDifference {
                column: column.clone(),
                source_position: idx + 1,
                target_position: target_idx + 1,
            });
        }
    }
    diff.extra_in_target = target
        .iter()
        .filter(|c| !source_set.contains(c.as_str()))
        .cloned()
        .collect();
    diff
}
