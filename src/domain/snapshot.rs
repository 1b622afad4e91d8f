//! Point-in-time stock snapshots and the metrics they carry.

use chrono::NaiveDate;

/// A named fundamental or technical metric that screens can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    PeRatio,
    PsRatio,
    PbRatio,
    MarketCap,
    DividendYield,
    DebtToEquity,
    ReturnOnEquity,
    Momentum3m,
    AvgVolume,
}

impl Metric {
    /// Every filterable metric, in canonical order.
    pub const ALL: [Metric; 9] = [
        Metric::PeRatio,
        Metric::PsRatio,
        Metric::PbRatio,
        Metric::MarketCap,
        Metric::DividendYield,
        Metric::DebtToEquity,
        Metric::ReturnOnEquity,
        Metric::Momentum3m,
        Metric::AvgVolume,
    ];

    /// Stable snake_case name used in config keys and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::PeRatio => "pe_ratio",
            Metric::PsRatio => "ps_ratio",
            Metric::PbRatio => "pb_ratio",
            Metric::MarketCap => "market_cap",
            Metric::DividendYield => "dividend_yield",
            Metric::DebtToEquity => "debt_to_equity",
            Metric::ReturnOnEquity => "return_on_equity",
            Metric::Momentum3m => "momentum_3m",
            Metric::AvgVolume => "avg_volume",
        }
    }

    /// Parse a metric from its snake_case name.
    pub fn parse(s: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.as_str() == s)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stock's fundamentals, price, and momentum as of a single date.
///
/// Every metric is optional: ingestion fills what the vendor supplied, and
/// evaluation treats absence as "no opinion", never as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StockSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub momentum_3m: Option<f64>,
    pub avg_volume: Option<f64>,
    pub data_quality: Option<f64>,
}

impl StockSnapshot {
    /// A snapshot with no metrics populated.
    pub fn empty(symbol: impl Into<String>, date: NaiveDate) -> Self {
        StockSnapshot {
            symbol: symbol.into(),
            date,
            price: None,
            market_cap: None,
            pe_ratio: None,
            ps_ratio: None,
            pb_ratio: None,
            dividend_yield: None,
            debt_to_equity: None,
            return_on_equity: None,
            momentum_3m: None,
            avg_volume: None,
            data_quality: None,
        }
    }

    /// Look up one metric by name.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::PeRatio => self.pe_ratio,
            Metric::PsRatio => self.ps_ratio,
            Metric::PbRatio => self.pb_ratio,
            Metric::MarketCap => self.market_cap,
            Metric::DividendYield => self.dividend_yield,
            Metric::DebtToEquity => self.debt_to_equity,
            Metric::ReturnOnEquity => self.return_on_equity,
            Metric::Momentum3m => self.momentum_3m,
            Metric::AvgVolume => self.avg_volume,
        }
    }
}

/// A quarterly earnings report as published on its report date.
#[derive(Debug, Clone, PartialEq)]
pub struct EarningsReport {
    pub symbol: String,
    pub report_date: NaiveDate,
    pub actual_eps: f64,
    pub estimated_eps: f64,
    pub surprise_pct: f64,
    pub beat: bool,
}
