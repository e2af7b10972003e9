#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use housing_insights::{cleaner::Cleaner, config::AnalyticsConfig, generate, record::PropertyRecord};
use tempfile::{TempDir, tempdir};

/// Generated and cleaned records for the default configuration.
pub fn cleaned_records(count: usize, seed: u64) -> (AnalyticsConfig, Vec<PropertyRecord>) {
    let config = AnalyticsConfig::default();
    let raw = generate(&config, count, seed).expect("generate records");
    let cleaned = Cleaner::new(&config).clean(&raw);
    (config, cleaned)
}

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
