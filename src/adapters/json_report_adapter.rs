//! JSON report writer.

use crate::domain::error::PairfolioError;
use crate::domain::sweep::{CurveReport, SweepReport, TrendReport};
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Writes reports as pretty-printed JSON, creating parent directories.
#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_json<T: Serialize>(&self, value: &T, output: &Path) -> Result<(), PairfolioError> {
        let body = serde_json::to_string_pretty(value).map_err(|e| PairfolioError::Report {
            reason: format!("failed to serialize report: {e}"),
        })?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(output, body)?;
        info!(path = %output.display(), "report written");
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_sweep(&self, report: &SweepReport, output: &Path) -> Result<(), PairfolioError> {
        self.write_json(report, output)
    }

    fn write_trend(&self, report: &TrendReport, output: &Path) -> Result<(), PairfolioError> {
        self.write_json(report, output)
    }

    fn write_curve(&self, report: &CurveReport, output: &Path) -> Result<(), PairfolioError> {
        self.write_json(report, output)
    }
}
