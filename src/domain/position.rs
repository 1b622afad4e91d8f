//! Open positions and the immutable trade records they close into.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<PositionStatus> {
        match s {
            "open" => Some(PositionStatus::Open),
            "closed" => Some(PositionStatus::Closed),
            _ => None,
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TrailingStop,
    NegativeMomentum,
    TimeCutoff,
    BacktestEnd,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::NegativeMomentum => "negative_momentum",
            ExitReason::TimeCutoff => "time_cutoff",
            ExitReason::BacktestEnd => "backtest_end",
        }
    }

    pub fn parse(s: &str) -> Option<ExitReason> {
        match s {
            "trailing_stop" => Some(ExitReason::TrailingStop),
            "negative_momentum" => Some(ExitReason::NegativeMomentum),
            "time_cutoff" => Some(ExitReason::TimeCutoff),
            "backtest_end" => Some(ExitReason::BacktestEnd),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A long position being simulated or held, with its trailing-stop state.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Storage id once persisted; `None` while in-memory only.
    pub id: Option<i64>,
    pub screen_id: Option<i64>,
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub current_price: f64,
    pub high_water_mark: f64,
    pub trailing_stop_price: f64,
    pub trailing_stop_pct: f64,
    /// Trading days this position has been marked since entry.
    pub days_held: u32,
    pub status: PositionStatus,
}

impl Position {
    /// Open a new position at `price`. The high-water mark starts at the
    /// entry price and the stop starts `trailing_stop_pct` below it.
    pub fn open(
        symbol: impl Into<String>,
        quantity: i64,
        price: f64,
        date: NaiveDate,
        trailing_stop_pct: f64,
    ) -> Self {
        Position {
            id: None,
            screen_id: None,
            symbol: symbol.into(),
            quantity,
            entry_price: price,
            entry_date: date,
            current_price: price,
            high_water_mark: price,
            trailing_stop_price: price * (1.0 - trailing_stop_pct / 100.0),
            trailing_stop_pct,
            days_held: 0,
            status: PositionStatus::Open,
        }
    }

    pub fn with_screen(mut self, screen_id: i64) -> Self {
        self.screen_id = Some(screen_id);
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Capital spent opening this position.
    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.entry_price
    }

    /// Worth at the last marked price.
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.current_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.market_value() - self.cost_basis()
    }
}

/// Immutable record of a closed position.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub screen_id: Option<i64>,
    pub quantity: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub exit_price: f64,
    pub exit_date: NaiveDate,
    pub pnl: f64,
    pub pnl_pct: f64,
    /// Trading days held, from the position's day counter.
    pub hold_days: i64,
    pub exit_reason: ExitReason,
}

/// A live buy execution: what the automation path records at fill time,
/// before any exit exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub screen_id: i64,
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
    pub date: NaiveDate,
}

impl Fill {
    /// Capital debited from the pool by this fill.
    pub fn cost(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}
