#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use sievetrader::domain::backtest::BacktestConfig;
use sievetrader::domain::calendar::is_trading_day;
use sievetrader::domain::error::SievetraderError;
use sievetrader::domain::ledger::LedgerEntry;
use sievetrader::domain::position::{Fill, Position, Trade};
use sievetrader::domain::screen::{Screen, ScreenKind, WatchlistItem};
use sievetrader::domain::snapshot::{EarningsReport, StockSnapshot};
use sievetrader::ports::market_port::MarketDataPort;
use sievetrader::ports::notify_port::NotifyPort;
use sievetrader::ports::store_port::StorePort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockMarketPort {
    pub snapshots: HashMap<NaiveDate, Vec<StockSnapshot>>,
    pub reports: HashMap<NaiveDate, Vec<EarningsReport>>,
    pub fail: bool,
}

impl MockMarketPort {
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
            reports: HashMap::new(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        let mut port = Self::new();
        port.fail = true;
        port
    }

    pub fn with_day(mut self, date: NaiveDate, snapshots: Vec<StockSnapshot>) -> Self {
        self.snapshots.entry(date).or_default().extend(snapshots);
        self
    }

    pub fn with_reports(mut self, date: NaiveDate, reports: Vec<EarningsReport>) -> Self {
        self.reports.entry(date).or_default().extend(reports);
        self
    }
}

impl MarketDataPort for MockMarketPort {
    fn candidates_for_date(
        &self,
        _screen: &Screen,
        date: NaiveDate,
    ) -> Result<Vec<StockSnapshot>, SievetraderError> {
        if self.fail {
            return Err(SievetraderError::Database {
                reason: "mock market failure".to_string(),
            });
        }
        Ok(self.snapshots.get(&date).cloned().unwrap_or_default())
    }

    fn earnings_reports_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<EarningsReport>, SievetraderError> {
        if self.fail {
            return Err(SievetraderError::Database {
                reason: "mock market failure".to_string(),
            });
        }
        Ok(self.reports.get(&date).cloned().unwrap_or_default())
    }
}

/// In-memory store that records every call for later assertions.
#[derive(Default)]
pub struct RecordingStore {
    pub screens: RefCell<Vec<Screen>>,
    pub positions: RefCell<Vec<Position>>,
    pub fills: RefCell<Vec<(Fill, f64)>>,
    pub trades: RefCell<Vec<Trade>>,
    pub ledger_posts: RefCell<Vec<(i64, LedgerEntry)>>,
    pub watchlists: RefCell<HashMap<i64, Vec<WatchlistItem>>>,
    pub capital_updates: RefCell<Vec<(i64, f64)>>,
    pub fill_errors: RefCell<HashMap<String, String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(self, screen: Screen) -> Self {
        self.screens.borrow_mut().push(screen);
        self
    }

    pub fn with_fill_error(self, symbol: &str, reason: &str) -> Self {
        self.fill_errors
            .borrow_mut()
            .insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl StorePort for RecordingStore {
    fn list_screens(&self) -> Result<Vec<Screen>, SievetraderError> {
        Ok(self.screens.borrow().clone())
    }

    fn get_screen(&self, id: i64) -> Result<Screen, SievetraderError> {
        self.screens
            .borrow()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(SievetraderError::ScreenNotFound { id })
    }

    fn replace_watchlist(
        &self,
        screen_id: i64,
        items: &[WatchlistItem],
    ) -> Result<(), SievetraderError> {
        self.watchlists
            .borrow_mut()
            .insert(screen_id, items.to_vec());
        Ok(())
    }

    fn watchlist(&self, screen_id: i64) -> Result<Vec<WatchlistItem>, SievetraderError> {
        Ok(self
            .watchlists
            .borrow()
            .get(&screen_id)
            .cloned()
            .unwrap_or_default())
    }

    fn record_fill(
        &self,
        position: &Position,
        fill: &Fill,
        pool_after: f64,
    ) -> Result<i64, SievetraderError> {
        if let Some(reason) = self.fill_errors.borrow().get(&fill.symbol) {
            return Err(SievetraderError::Database {
                reason: reason.clone(),
            });
        }
        let id = self.positions.borrow().len() as i64 + 1;
        let mut stored = position.clone();
        stored.id = Some(id);
        self.positions.borrow_mut().push(stored);
        self.fills.borrow_mut().push((fill.clone(), pool_after));
        Ok(id)
    }

    fn open_positions(&self, screen_id: i64) -> Result<Vec<Position>, SievetraderError> {
        Ok(self
            .positions
            .borrow()
            .iter()
            .filter(|p| p.screen_id == Some(screen_id) && p.is_open())
            .cloned()
            .collect())
    }

    fn record_trade(&self, trade: &Trade) -> Result<(), SievetraderError> {
        self.trades.borrow_mut().push(trade.clone());
        Ok(())
    }

    fn post_ledger_entry(
        &self,
        screen_id: i64,
        entry: &LedgerEntry,
    ) -> Result<(), SievetraderError> {
        self.ledger_posts
            .borrow_mut()
            .push((screen_id, entry.clone()));
        Ok(())
    }

    fn ledger(&self, screen_id: i64) -> Result<Vec<LedgerEntry>, SievetraderError> {
        Ok(self
            .ledger_posts
            .borrow()
            .iter()
            .filter(|(id, _)| *id == screen_id)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn update_screen_capital(&self, screen_id: i64, capital: f64) -> Result<(), SievetraderError> {
        self.capital_updates.borrow_mut().push((screen_id, capital));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotify {
    pub fills: RefCell<Vec<(Fill, String)>>,
    pub quiet_days: RefCell<Vec<(String, NaiveDate)>>,
    pub fail: bool,
}

impl RecordingNotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mut notify = Self::default();
        notify.fail = true;
        notify
    }
}

impl NotifyPort for RecordingNotify {
    fn notify_fill(&self, fill: &Fill, screen_name: &str) -> Result<(), SievetraderError> {
        if self.fail {
            return Err(SievetraderError::Notify {
                reason: "mock notify failure".to_string(),
            });
        }
        self.fills
            .borrow_mut()
            .push((fill.clone(), screen_name.to_string()));
        Ok(())
    }

    fn notify_no_opportunities(
        &self,
        screen_name: &str,
        date: NaiveDate,
    ) -> Result<(), SievetraderError> {
        if self.fail {
            return Err(SievetraderError::Notify {
                reason: "mock notify failure".to_string(),
            });
        }
        self.quiet_days
            .borrow_mut()
            .push((screen_name.to_string(), date));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_snapshot(symbol: &str, date: NaiveDate, price: f64) -> StockSnapshot {
    let mut snap = StockSnapshot::empty(symbol, date);
    snap.price = Some(price);
    snap
}

pub fn make_momentum_snapshot(
    symbol: &str,
    date: NaiveDate,
    price: f64,
    momentum: f64,
) -> StockSnapshot {
    let mut snap = make_snapshot(symbol, date, price);
    snap.momentum_3m = Some(momentum);
    snap
}

pub fn make_report(symbol: &str, date: NaiveDate, surprise: f64, beat: bool) -> EarningsReport {
    EarningsReport {
        symbol: symbol.to_string(),
        report_date: date,
        actual_eps: 1.0 + surprise / 100.0,
        estimated_eps: 1.0,
        surprise_pct: surprise,
        beat,
    }
}

pub fn make_value_screen() -> Screen {
    Screen::new(1, "Deep Value", ScreenKind::Value)
}

pub fn make_earnings_screen(pool: f64) -> Screen {
    let mut screen = Screen::new(2, "Surprise Momentum", ScreenKind::Earnings);
    screen.allocated_capital = Some(pool);
    screen
}

/// One trading week, Monday 2024-03-11 through Friday 2024-03-15.
pub fn sample_backtest_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 3, 11),
        end_date: date(2024, 3, 15),
        initial_capital: 10_000.0,
        max_positions: 10,
        trailing_stop_pct: 2.0,
    }
}

/// Seed one snapshot per trading day for a symbol, walking forward from
/// `start` and skipping weekends. Every day carries the same momentum.
pub fn seed_daily_prices(
    market: &mut MockMarketPort,
    symbol: &str,
    start: NaiveDate,
    prices: &[f64],
    momentum: Option<f64>,
) {
    let mut day = start;
    for &price in prices {
        while !is_trading_day(day) {
            day += Duration::days(1);
        }
        let mut snap = make_snapshot(symbol, day, price);
        snap.momentum_3m = momentum;
        market.snapshots.entry(day).or_default().push(snap);
        day += Duration::days(1);
    }
}
