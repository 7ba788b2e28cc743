#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_reconcile::dataset::Dataset;
use csv_reconcile::keys::KeyColumns;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a dataset from string rows using the default null tokens.
pub fn dataset(name: &str, headers: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset::from_rows(name, headers, rows).expect("build dataset")
}

pub fn keys(names: &[&str]) -> KeyColumns {
    KeyColumns::new(names.iter().copied()).expect("key columns")
}
