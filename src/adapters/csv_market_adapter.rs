//! CSV file market data adapter.
//!
//! Reads two flat files: a fundamentals file of per-symbol daily
//! snapshots, and an earnings file of report events. Empty cells in
//! optional columns become absent metrics, not zeros.

use crate::domain::error::SievetraderError;
use crate::domain::screen::Screen;
use crate::domain::snapshot::{EarningsReport, StockSnapshot};
use crate::ports::market_port::MarketDataPort;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;

pub struct CsvMarketAdapter {
    fundamentals_path: PathBuf,
    earnings_path: PathBuf,
}

impl CsvMarketAdapter {
    pub fn new(fundamentals_path: PathBuf, earnings_path: PathBuf) -> Self {
        Self {
            fundamentals_path,
            earnings_path,
        }
    }

    fn read_file(path: &PathBuf) -> Result<String, SievetraderError> {
        fs::read_to_string(path).map_err(|e| SievetraderError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

fn get_col<'a>(record: &'a csv::StringRecord, idx: usize, name: &str) -> Result<&'a str, SievetraderError> {
    record.get(idx).ok_or_else(|| SievetraderError::Database {
        reason: format!("missing {name} column"),
    })
}

fn parse_date(value: &str, name: &str) -> Result<NaiveDate, SievetraderError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| SievetraderError::Database {
        reason: format!("invalid {name} value: {e}"),
    })
}

fn parse_f64(value: &str, name: &str) -> Result<f64, SievetraderError> {
    value.parse().map_err(|e| SievetraderError::Database {
        reason: format!("invalid {name} value: {e}"),
    })
}

/// An empty cell is an absent metric; anything else must parse.
fn parse_opt_f64(value: &str, name: &str) -> Result<Option<f64>, SievetraderError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_f64(value, name).map(Some)
}

fn parse_bool(value: &str, name: &str) -> Result<bool, SievetraderError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(SievetraderError::Database {
            reason: format!("invalid {name} value: {value}"),
        }),
    }
}

/// Candidate ordering for the daily pull: best data quality first, then
/// largest market cap, symbols with a missing value after those with one.
fn candidate_order(a: &StockSnapshot, b: &StockSnapshot) -> Ordering {
    fn desc_nones_last(a: Option<f64>, b: Option<f64>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
    desc_nones_last(a.data_quality, b.data_quality)
        .then_with(|| desc_nones_last(a.market_cap, b.market_cap))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

impl MarketDataPort for CsvMarketAdapter {
    fn candidates_for_date(
        &self,
        _screen: &Screen,
        date: NaiveDate,
    ) -> Result<Vec<StockSnapshot>, SievetraderError> {
        let content = Self::read_file(&self.fundamentals_path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut snapshots = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SievetraderError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let row_date = parse_date(get_col(&record, 1, "date")?, "date")?;
            if row_date != date {
                continue;
            }

            snapshots.push(StockSnapshot {
                symbol: get_col(&record, 0, "symbol")?.to_string(),
                date: row_date,
                price: parse_opt_f64(get_col(&record, 2, "price")?, "price")?,
                market_cap: parse_opt_f64(get_col(&record, 3, "market_cap")?, "market_cap")?,
                pe_ratio: parse_opt_f64(get_col(&record, 4, "pe_ratio")?, "pe_ratio")?,
                ps_ratio: parse_opt_f64(get_col(&record, 5, "ps_ratio")?, "ps_ratio")?,
                pb_ratio: parse_opt_f64(get_col(&record, 6, "pb_ratio")?, "pb_ratio")?,
                dividend_yield: parse_opt_f64(
                    get_col(&record, 7, "dividend_yield")?,
                    "dividend_yield",
                )?,
                debt_to_equity: parse_opt_f64(
                    get_col(&record, 8, "debt_to_equity")?,
                    "debt_to_equity",
                )?,
                return_on_equity: parse_opt_f64(
                    get_col(&record, 9, "return_on_equity")?,
                    "return_on_equity",
                )?,
                momentum_3m: parse_opt_f64(get_col(&record, 10, "momentum_3m")?, "momentum_3m")?,
                avg_volume: parse_opt_f64(get_col(&record, 11, "avg_volume")?, "avg_volume")?,
                data_quality: parse_opt_f64(get_col(&record, 12, "data_quality")?, "data_quality")?,
            });
        }

        snapshots.sort_by(candidate_order);
        Ok(snapshots)
    }

    fn earnings_reports_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<EarningsReport>, SievetraderError> {
        let content = Self::read_file(&self.earnings_path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut reports = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SievetraderError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let report_date = parse_date(get_col(&record, 1, "report_date")?, "report_date")?;
            if report_date != date {
                continue;
            }

            reports.push(EarningsReport {
                symbol: get_col(&record, 0, "symbol")?.to_string(),
                report_date,
                actual_eps: parse_f64(get_col(&record, 2, "actual_eps")?, "actual_eps")?,
                estimated_eps: parse_f64(get_col(&record, 3, "estimated_eps")?, "estimated_eps")?,
                surprise_pct: parse_f64(get_col(&record, 4, "surprise_pct")?, "surprise_pct")?,
                beat: parse_bool(get_col(&record, 5, "beat")?, "beat")?,
            });
        }

        Ok(reports)
    }
}
