//! Report output port.

use crate::domain::error::PairfolioError;
use crate::domain::sweep::{CurveReport, SweepReport, TrendReport};
use std::path::Path;

/// Port for writing analysis results.
pub trait ReportPort {
    fn write_sweep(&self, report: &SweepReport, output: &Path) -> Result<(), PairfolioError>;

    fn write_trend(&self, report: &TrendReport, output: &Path) -> Result<(), PairfolioError>;

    fn write_curve(&self, report: &CurveReport, output: &Path) -> Result<(), PairfolioError>;
}
