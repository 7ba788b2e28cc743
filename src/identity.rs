//! Human-readable record identity for report lines.
//!
//! Resolution order, first non-empty result wins:
//! 1. `column=value` for every key column present in the record, joined by `", "`;
//! 2. the first column outside [`RESERVED_COLUMNS`], even when its value is null;
//! 3. the first non-null column of any kind;
//! 4. [`UNKNOWN_RECORD`].
//!
//! Resolution never fails outward; internal inconsistencies yield
//! [`IDENTITY_ERROR`].

use itertools::Itertools;

use crate::{dataset::Record, error::IdentityResolutionError, keys::KeyColumns};

pub const UNKNOWN_RECORD: &str = "Unknown record";
pub const IDENTITY_ERROR: &str = "Error identifying record";

/// Helper columns that never identify a record on their own.
pub const RESERVED_COLUMNS: &[&str] = &[
    "_merge_key",
    "record_identifier",
    "source_file",
    "error_type",
    "num_errors",
];

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    keys: KeyColumns,
}

impl IdentityResolver {
    pub fn new(keys: KeyColumns) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyColumns {
        &self.keys
    }

    pub fn resolve(&self, record: &Record<'_>) -> String {
        self.try_resolve(record)
            .unwrap_or_else(|_| IDENTITY_ERROR.to_string())
    }

    fn try_resolve(&self, record: &Record<'_>) -> Result<String, IdentityResolutionError> {
        let columns = record.columns();
        let values = record.values();
        if columns.len() != values.len() {
            return Err(IdentityResolutionError::ShapeMismatch {
                columns: columns.len(),
                values: values.len(),
            });
        }

        let key_parts = self
            .keys
            .iter()
            .filter_map(|key| record.get(key).map(|value| format!("{key}={value}")))
            .collect::<Vec<_>>();
        if !key_parts.is_empty() {
            return Ok(key_parts.iter().join(", "));
        }

        if let Some((column, value)) = columns
            .iter()
            .zip(values)
            .find(|(column, _)| !RESERVED_COLUMNS.contains(&column.as_str()))
        {
            return Ok(format!("{column}={value}"));
        }

        if let Some((column, value)) = columns.iter().zip(values).find(|(_, v)| !v.is_null()) {
            return Ok(format!("{column}={value}"));
        }

        Ok(UNKNOWN_RECORD.to_string())
    }
}
