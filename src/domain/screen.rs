//! Screen definitions: named metric filters driving one trading strategy.

use crate::domain::snapshot::Metric;

/// Lower bound on the per-day entry cap a screen may configure.
pub const MIN_POSITIONS_PER_DAY: u32 = 5;
/// Upper bound on the per-day entry cap a screen may configure.
pub const MAX_POSITIONS_PER_DAY: u32 = 15;
/// Earnings surprise threshold applied when a screen does not set one.
pub const DEFAULT_MIN_SURPRISE_PCT: f64 = 5.0;
/// Per-day entry cap applied when a screen does not set one.
pub const DEFAULT_POSITIONS_PER_DAY: u32 = 10;

/// Which opportunity style a screen hunts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Value,
    Earnings,
}

impl ScreenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenKind::Value => "value",
            ScreenKind::Earnings => "earnings",
        }
    }

    pub fn parse(s: &str) -> Option<ScreenKind> {
        match s {
            "value" => Some(ScreenKind::Value),
            "earnings" => Some(ScreenKind::Earnings),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive bound pair on one metric. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricFilter {
    pub metric: Metric,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MetricFilter {
    pub fn new(metric: Metric, min: Option<f64>, max: Option<f64>) -> Self {
        MetricFilter { metric, min, max }
    }

    pub fn at_least(metric: Metric, min: f64) -> Self {
        MetricFilter::new(metric, Some(min), None)
    }

    pub fn at_most(metric: Metric, max: f64) -> Self {
        MetricFilter::new(metric, None, Some(max))
    }

    pub fn between(metric: Metric, min: f64, max: f64) -> Self {
        MetricFilter::new(metric, Some(min), Some(max))
    }

    /// A value passes when it sits inside both bounds. A missing value
    /// always passes: lack of data never excludes a stock.
    pub fn passes(&self, value: Option<f64>) -> bool {
        let Some(v) = value else { return true };
        if self.min.is_some_and(|min| v < min) {
            return false;
        }
        if self.max.is_some_and(|max| v > max) {
            return false;
        }
        true
    }
}

/// A saved stock screen: filters plus the capital and pacing settings
/// the simulation and live paths read. The catalog itself is managed
/// elsewhere; this side only ever reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub id: i64,
    pub name: String,
    pub kind: ScreenKind,
    pub filters: Vec<MetricFilter>,
    pub is_active: bool,
    pub allocated_capital: Option<f64>,
    pub current_capital: Option<f64>,
    pub max_positions_per_day: u32,
    pub min_surprise_pct: f64,
}

impl Screen {
    pub fn new(id: i64, name: impl Into<String>, kind: ScreenKind) -> Self {
        Screen {
            id,
            name: name.into(),
            kind,
            filters: Vec::new(),
            is_active: true,
            allocated_capital: None,
            current_capital: None,
            max_positions_per_day: DEFAULT_POSITIONS_PER_DAY,
            min_surprise_pct: DEFAULT_MIN_SURPRISE_PCT,
        }
    }

    /// Whether this screen carries its own capital pool.
    pub fn has_pool(&self) -> bool {
        self.pool_capital().is_some()
    }

    /// Remaining pool balance: the running balance when one exists,
    /// otherwise the initial allocation.
    pub fn pool_capital(&self) -> Option<f64> {
        self.current_capital.or(self.allocated_capital)
    }

    /// Clamp a configured per-day entry cap into the supported range.
    pub fn clamp_positions_per_day(n: i64) -> u32 {
        let n = n.clamp(MIN_POSITIONS_PER_DAY as i64, MAX_POSITIONS_PER_DAY as i64);
        n as u32
    }
}

/// One symbol that passed a screen, with its composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistItem {
    pub screen_id: i64,
    pub symbol: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_passes_inside_bounds() {
        let filter = MetricFilter::between(Metric::PeRatio, 5.0, 25.0);
        assert!(filter.passes(Some(5.0)));
        assert!(filter.passes(Some(25.0)));
        assert!(filter.passes(Some(15.0)));
    }

    #[test]
    fn test_filter_rejects_out_of_range() {
        let filter = MetricFilter::between(Metric::PeRatio, 5.0, 25.0);
        assert!(!filter.passes(Some(4.99)));
        assert!(!filter.passes(Some(25.01)));
    }

    #[test]
    fn test_filter_missing_value_always_passes() {
        let filter = MetricFilter::between(Metric::PbRatio, 0.5, 3.0);
        assert!(filter.passes(None));
    }

    #[test]
    fn test_filter_one_sided_bounds() {
        let floor = MetricFilter::at_least(Metric::MarketCap, 1e9);
        assert!(floor.passes(Some(2e9)));
        assert!(!floor.passes(Some(5e8)));

        let ceil = MetricFilter::at_most(Metric::DebtToEquity, 1.5);
        assert!(ceil.passes(Some(0.2)));
        assert!(!ceil.passes(Some(2.0)));
    }

    #[test]
    fn test_screen_kind_round_trip() {
        for kind in [ScreenKind::Value, ScreenKind::Earnings] {
            assert_eq!(ScreenKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ScreenKind::parse("growth"), None);
    }

    #[test]
    fn test_pool_capital_prefers_running_balance() {
        let mut screen = Screen::new(1, "pool", ScreenKind::Earnings);
        assert!(!screen.has_pool());

        screen.allocated_capital = Some(25_000.0);
        assert!((screen.pool_capital().unwrap() - 25_000.0).abs() < f64::EPSILON);

        screen.current_capital = Some(21_400.0);
        assert!((screen.pool_capital().unwrap() - 21_400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_positions_per_day() {
        assert_eq!(Screen::clamp_positions_per_day(1), 5);
        assert_eq!(Screen::clamp_positions_per_day(5), 5);
        assert_eq!(Screen::clamp_positions_per_day(10), 10);
        assert_eq!(Screen::clamp_positions_per_day(15), 15);
        assert_eq!(Screen::clamp_positions_per_day(40), 15);
    }
}
