//! Results snapshot persistence.

use std::path::Path;

use log::info;

use crate::error::ReportError;
use crate::models::{RunReport, RunSnapshot};

/// Writes the run's snapshot (statistics block plus every record) as pretty
/// JSON to the given path.
pub fn save_snapshot(report: &RunReport, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(&report.to_snapshot())?;
    std::fs::write(path, json).map_err(|e| ReportError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Results saved to {}", path.display());
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<RunSnapshot, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReportError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&content)?)
}
