//! Record identity configuration: the validated key column list, string key
//! tuples for presence tests and merge keys for the value comparison join.

use itertools::Itertools;

use crate::{
    data::Value,
    dataset::{Dataset, Side},
    error::ConfigurationError,
};

const MERGE_KEY_SEPARATOR: &str = "_";

/// Non-empty ordered list of key column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumns(Vec<String>);

/// Positions of the key columns in each dataset, in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIndices {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
}

impl KeyIndices {
    pub fn for_side(&self, side: Side) -> &[usize] {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }
}

/// Key values of one record, each coerced to its string form.
pub type KeyTuple = Vec<String>;

impl KeyColumns {
    pub fn new<I, S>(columns: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = columns
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>();
        if columns.is_empty() {
            Err(ConfigurationError::EmptyKey)
        } else {
            Ok(Self(columns))
        }
    }

    /// Accepts entries that may themselves be comma-separated (`id,region`).
    pub fn parse_list<S: AsRef<str>>(values: &[S]) -> Result<Self, ConfigurationError> {
        Self::new(values.iter().flat_map(|v| {
            v.as_ref()
                .split(',')
                .map(str::to_string)
                .collect::<Vec<_>>()
        }))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }

    /// Resolves key positions, failing on the first key column absent from
    /// either dataset.
    pub fn resolve(
        &self,
        source: &Dataset,
        target: &Dataset,
    ) -> Result<KeyIndices, ConfigurationError> {
        let mut indices = KeyIndices {
            source: Vec::with_capacity(self.0.len()),
            target: Vec::with_capacity(self.0.len()),
        };
        for column in &self.0 {
            let source_idx =
                source
                    .column_index(column)
                    .ok_or_else(|| ConfigurationError::MissingKeyColumn {
                        column: column.clone(),
                        side: Side::Source,
                    })?;
            let target_idx =
                target
                    .column_index(column)
                    .ok_or_else(|| ConfigurationError::MissingKeyColumn {
                        column: column.clone(),
                        side: Side::Target,
                    })?;
            indices.source.push(source_idx);
            indices.target.push(target_idx);
        }
        Ok(indices)
    }
}

impl std::fmt::Display for KeyColumns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

fn key_value(row: &[Value], idx: usize) -> String {
    row.get(idx).unwrap_or(&Value::Null).as_display()
}

pub fn key_tuple(row: &[Value], indices: &[usize]) -> KeyTuple {
    indices.iter().map(|idx| key_value(row, *idx)).collect()
}

/// Join key for matching records across datasets; not used for display.
pub fn merge_key(row: &[Value], indices: &[usize]) -> String {
    match indices {
        [single] => key_value(row, *single),
        _ => indices
            .iter()
            .map(|idx| key_value(row, *idx))
            .join(MERGE_KEY_SEPARATOR),
    }
}
