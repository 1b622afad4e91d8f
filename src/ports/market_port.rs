//! Market data access port trait.

use crate::domain::error::SievetraderError;
use crate::domain::screen::Screen;
use crate::domain::snapshot::{EarningsReport, StockSnapshot};
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Point-in-time candidate snapshots for one screen on one date.
    /// Implementations return rows ordered by data quality then market
    /// cap, best first, and must answer repeat calls for the same
    /// arguments identically within a run.
    fn candidates_for_date(
        &self,
        screen: &Screen,
        date: NaiveDate,
    ) -> Result<Vec<StockSnapshot>, SievetraderError>;

    /// Earnings reports published on `date`.
    fn earnings_reports_on(&self, date: NaiveDate)
        -> Result<Vec<EarningsReport>, SievetraderError>;
}
