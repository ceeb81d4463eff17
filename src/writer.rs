use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde_json::Value;

use crate::error::{AnalyzerError, Result};
use crate::report::QualityReport;

/// Writes the report to a fixed path, replacing whatever was there.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize with two-space indentation and overwrite the file.
    pub fn write(&self, report: &QualityReport) -> Result<()> {
        let mut contents = serde_json::to_string_pretty(report)
            .map_err(|e| AnalyzerError::filesystem(&self.path, e.into()))?;
        contents.push('\n');

        fs::write(&self.path, contents).map_err(|e| AnalyzerError::filesystem(&self.path, e))?;
        info!("Saved report to {}", self.path.display());
        Ok(())
    }

    /// Read back a saved report as raw JSON.
    pub fn read(&self) -> Result<Value> {
        if !self.path.exists() {
            return Err(AnalyzerError::ReportMissing(self.path.clone()));
        }
        let contents =
            fs::read_to_string(&self.path).map_err(|e| AnalyzerError::filesystem(&self.path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| AnalyzerError::ReportInvalid(vec![format!("not valid JSON: {}", e)]))
    }
}
