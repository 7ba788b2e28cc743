//! Comparison settings from an optional YAML file merged with command-line
//! flags. Flags win over file values; key columns have no default.
//!
//! ```yaml
//! key_columns: [employee_id]
//! delimiter: ";"
//! input_encoding: windows-1252
//! null_tokens: ["", "N/A"]
//! source_label: hr_export
//! target_label: payroll_export
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::{
    cli::{CompareArgs, parse_delimiter},
    dataset::{DEFAULT_NULL_TOKENS, LoadOptions},
    io_utils,
    keys::KeyColumns,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    pub key_columns: Vec<String>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub null_tokens: Option<Vec<String>>,
    pub source_label: Option<String>,
    pub target_label: Option<String>,
}

impl CompareConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).with_context(|| format!("Parsing config YAML {path:?}"))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Parsing config YAML")
    }
}

/// Fully resolved settings for one comparison run.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub keys: KeyColumns,
    pub source_load: LoadOptions,
    pub target_load: LoadOptions,
    pub source_label: String,
    pub target_label: String,
}

fn file_label(path: &Path) -> String {
    if io_utils::is_stdio(path) {
        return "stdin".to_string();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn resolve(args: &CompareArgs, config: &CompareConfig) -> Result<ResolvedOptions> {
    let keys = if args.keys.is_empty() {
        KeyColumns::parse_list(&config.key_columns)
    } else {
        KeyColumns::parse_list(&args.keys)
    }
    .map_err(|err| anyhow!("{err}; pass --key or set key_columns in the config file"))?;

    let delimiter = match (args.delimiter, config.delimiter.as_deref()) {
        (Some(delimiter), _) => Some(delimiter),
        (None, Some(raw)) => Some(
            parse_delimiter(raw).map_err(|err| anyhow!("Invalid delimiter in config: {err}"))?,
        ),
        (None, None) => None,
    };
    let encoding: &'static Encoding = io_utils::resolve_encoding(
        args.input_encoding
            .as_deref()
            .or(config.input_encoding.as_deref()),
    )?;
    let null_tokens = if !args.null_tokens.is_empty() {
        args.null_tokens.clone()
    } else if let Some(tokens) = &config.null_tokens {
        tokens.clone()
    } else {
        DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect()
    };

    let load = |path: &Path| LoadOptions {
        delimiter: io_utils::resolve_input_delimiter(path, delimiter),
        encoding,
        null_tokens: null_tokens.clone(),
    };

    Ok(ResolvedOptions {
        keys,
        source_load: load(&args.source),
        target_load: load(&args.target),
        source_label: args
            .source_label
            .clone()
            .or_else(|| config.source_label.clone())
            .unwrap_or_else(|| file_label(&args.source)),
        target_label: args
            .target_label
            .clone()
            .or_else(|| config.target_label.clone())
            .unwrap_or_else(|| file_label(&args.target)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> CompareArgs {
        CompareArgs {
            source: PathBuf::from("data/hr.tsv"),
            target: PathBuf::from("data/payroll.csv"),
            keys: Vec::new(),
            config: None,
            delimiter: None,
            input_encoding: None,
            null_tokens: Vec::new(),
            source_label: None,
            target_label: None,
            report: None,
            errors_output: None,
            summary_json: None,
            output_dir: None,
        }
    }

    #[test]
    fn config_supplies_keys_when_flags_absent() {
        let config = CompareConfig::from_yaml_str(
            "key_columns: [employee_id]\nnull_tokens: ['', 'N/A']\nsource_label: hr\n",
        )
        .unwrap();
        let resolved = resolve(&args(), &config).unwrap();
        assert_eq!(resolved.keys.as_slice(), &["employee_id"]);
        assert_eq!(resolved.source_load.null_tokens, vec!["", "N/A"]);
        assert_eq!(resolved.source_label, "hr");
        assert_eq!(resolved.target_label, "payroll.csv");
        assert_eq!(resolved.source_load.delimiter, b'\t');
        assert_eq!(resolved.target_load.delimiter, b',');
    }

    #[test]
    fn flags_override_config() {
        let config = CompareConfig::from_yaml_str("key_columns: [a]\ndelimiter: ';'\n").unwrap();
        let mut args = args();
        args.keys = vec!["b,c".to_string()];
        args.delimiter = Some(b'|');
        let resolved = resolve(&args, &config).unwrap();
        assert_eq!(resolved.keys.as_slice(), &["b", "c"]);
        assert_eq!(resolved.source_load.delimiter, b'|');
    }

    #[test]
    fn missing_keys_is_an_error() {
        let err = resolve(&args(), &CompareConfig::default()).unwrap_err();
        assert!(err.to_string().contains("At least one key column is required"));
    }

    #[test]
    fn unknown_config_fields_are_rejected() {
        assert!(CompareConfig::from_yaml_str("keys: [id]\n").is_err());
    }
}
