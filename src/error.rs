//! Error taxonomy for a comparison run.
//!
//! Configuration and classification errors are fatal and surface to the
//! caller unchanged. Identity and column comparison errors are recovered where
//! they happen and degrade into report text instead of aborting the run.

use thiserror::Error;

use crate::dataset::Side;

/// Invalid key configuration, detected before any data is scanned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("At least one key column is required")]
    EmptyKey,
    #[error("Key column '{column}' not found in {side} dataset")]
    MissingKeyColumn { column: String, side: Side },
}

/// Fatal failure of duplicate/presence classification. No partial result is
/// ever returned alongside one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Row {row} in {side} dataset has {found} value(s), expected {expected}")]
    RaggedRow {
        side: Side,
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Internal to the identity resolver; callers only ever see the sentinels.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum IdentityResolutionError {
    #[error("record has {columns} column(s) but {values} value(s)")]
    ShapeMismatch { columns: usize, values: usize },
}

/// Failure to compare one column; the remaining columns are still compared.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColumnComparisonError {
    #[error("column '{column}' not found in {side} dataset")]
    MissingColumn { column: String, side: Side },
}
