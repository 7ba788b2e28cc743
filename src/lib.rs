pub mod classify;
pub mod cli;
pub mod compare;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod identity;
pub mod io_utils;
pub mod keys;
pub mod profile;
pub mod report;
pub mod schema_diff;
pub mod value_diff;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, ColumnsArgs, Commands},
    dataset::LoadOptions,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_reconcile", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => compare::execute(&args),
        Commands::Columns(args) => handle_columns(&args),
    }
}

fn handle_columns(args: &ColumnsArgs) -> Result<()> {
    if io_utils::is_stdio(&args.target) {
        return Err(anyhow!("Target input cannot be stdin; provide a file path"));
    }
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let options = |path: &Path| {
        LoadOptions::new(io_utils::resolve_input_delimiter(path, args.delimiter), encoding)
    };
    let source_headers = dataset::read_headers(&args.source, &options(&args.source))?;
    let target_headers = dataset::read_headers(&args.target, &options(&args.target))?;
    info!(
        "Reconciling {} source column(s) with {} target column(s)",
        source_headers.len(),
        target_headers.len()
    );
    let diff = schema_diff::reconcile(&source_headers, &target_headers);
    report::write_text(None, &report::render_schema(&diff))
}
