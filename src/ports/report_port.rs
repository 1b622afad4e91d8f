//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SievetraderError;
use crate::domain::screen::Screen;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        screen: &Screen,
        output_path: &str,
    ) -> Result<(), SievetraderError>;
}
