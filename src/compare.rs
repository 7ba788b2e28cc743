use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use log::{debug, info};

use crate::{
    classify::{self, ErrorType},
    cli::CompareArgs,
    config::{self, CompareConfig},
    dataset::{Dataset, LoadOptions},
    error::ClassificationError,
    io_utils,
    keys::KeyColumns,
    profile,
    report::{self, ComparisonReport},
    schema_diff, value_diff,
};

/// Runs every comparison stage over two loaded datasets.
///
/// Classification runs first so key configuration errors surface before any
/// other work; a classification failure aborts the whole run.
pub fn compare_datasets(
    source: &Dataset,
    target: &Dataset,
    keys: &KeyColumns,
) -> Result<ComparisonReport, ClassificationError> {
    let classification = classify::classify(source, target, keys)?;
    let schema = schema_diff::reconcile(&source.headers, &target.headers);
    let value_diff = value_diff::compare_values(source, target, &schema.common, keys)?;

    Ok(ComparisonReport {
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        source_label: source.name.clone(),
        target_label: target.name.clone(),
        keys: keys.clone(),
        source_rows: source.len(),
        target_rows: target.len(),
        type_mismatches: profile::type_mismatches(source, target, &schema.common),
        null_mismatches: profile::null_mismatches(source, target, &schema.common),
        format_findings: profile::format_findings(source, target, &schema.common),
        statistical_drift: profile::statistical_drift(source, target, &schema.common),
        distinct_mismatches: profile::distinct_mismatches(source, target, &schema.common),
        value_diff,
        classification,
        schema,
    })
}

pub fn execute(args: &CompareArgs) -> Result<()> {
    if io_utils::is_stdio(&args.target) {
        return Err(anyhow!(
            "Target input cannot be stdin; provide a file path"
        ));
    }
    let config = match &args.config {
        Some(path) => CompareConfig::load(path)
            .with_context(|| format!("Loading config from {path:?}"))?,
        None => CompareConfig::default(),
    };
    let options = config::resolve(args, &config)?;
    debug!("Key columns: {}", options.keys);

    let source = load(&args.source, &options.source_label, &options.source_load)?;
    let target = load(&args.target, &options.target_label, &options.target_load)?;

    let report = compare_datasets(&source, &target, &options.keys)?;
    info!(
        "Classified {} error record(s): f={} k={} m={} e={}; {} value mismatch(es)",
        report.classification.len(),
        report.classification.count(ErrorType::FullDuplicate),
        report.classification.count(ErrorType::KeyDuplicate),
        report.classification.count(ErrorType::Missing),
        report.classification.count(ErrorType::Extra),
        report.value_diff.mismatch_count()
    );

    let (report_path, errors_path) = output_paths(args);
    report::write_text(report_path.as_deref(), &report.render_text())?;
    if let Some(path) = &report_path {
        info!("Report written to {path:?}");
    }

    if let Some(path) = &errors_path {
        if report.classification.is_empty() {
            info!("No error records found; skipping {path:?}");
        } else {
            report::write_error_records(path, &report.classification)
                .with_context(|| format!("Writing error records to {path:?}"))?;
            info!(
                "{} error record(s) written to {path:?}",
                report.classification.len()
            );
        }
    }

    if let Some(path) = &args.summary_json {
        report::write_summary_json(path, &report.summary())
            .with_context(|| format!("Writing summary to {path:?}"))?;
    }
    Ok(())
}

fn load(path: &Path, label: &str, options: &LoadOptions) -> Result<Dataset> {
    let dataset = Dataset::from_csv_path(path, label, options)?;
    info!(
        "Loaded '{}' with {} row(s) across {} column(s)",
        label,
        dataset.len(),
        dataset.headers.len()
    );
    Ok(dataset)
}

/// Explicit paths win; otherwise `--output-dir` supplies derived names.
fn output_paths(args: &CompareArgs) -> (Option<PathBuf>, Option<PathBuf>) {
    let derived = args.output_dir.as_ref().map(|dir| {
        let (report_name, errors_name) = report::output_filenames(&args.source, &args.target);
        (dir.join(report_name), dir.join(errors_name))
    });
    let report_path = args
        .report
        .clone()
        .or_else(|| derived.as_ref().map(|(report, _)| report.clone()));
    let errors_path = args
        .errors_output
        .clone()
        .or_else(|| derived.map(|(_, errors)| errors));
    (report_path, errors_path)
}
