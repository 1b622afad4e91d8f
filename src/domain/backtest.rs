//! Backtest orchestration: one screen over one date range, simulated
//! day by day on the weekday calendar.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::calendar::trading_days;
use crate::domain::error::SievetraderError;
use crate::domain::ledger::CapitalLedger;
use crate::domain::metrics::BacktestMetrics;
use crate::domain::position::{ExitReason, Position, Trade};
use crate::domain::ranking::rank_value_candidates;
use crate::domain::score::{evaluate_candidates, ScoredCandidate};
use crate::domain::screen::Screen;
use crate::domain::simulator::{close_position, step_position, DayOutcome};
use crate::domain::sizing::{select_sizer, shares_for, SizingContext};
use crate::domain::snapshot::StockSnapshot;
use crate::ports::market_port::MarketDataPort;

/// Minimum three-month momentum for a new entry.
pub const ENTRY_MOMENTUM_THRESHOLD: f64 = 5.0;
/// Trades kept on the result, newest first; metrics still cover all.
pub const RESULT_TRADE_CAP: usize = 20;

/// Parameters for one historical simulation run.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub max_positions: usize,
    pub trailing_stop_pct: f64,
}

/// One point of the daily portfolio value series.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyValue {
    pub date: NaiveDate,
    /// Cash plus open positions at their last marked price.
    pub total_value: f64,
    pub cash: f64,
    pub positions_value: f64,
    pub open_positions: usize,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub screen_id: i64,
    pub initial_capital: f64,
    pub final_value: f64,
    /// Most recent [`RESULT_TRADE_CAP`] trades, newest first.
    pub trades: Vec<Trade>,
    pub daily_values: Vec<DailyValue>,
    pub ledger: CapitalLedger,
    pub metrics: BacktestMetrics,
}

/// Ranked survivors eligible to open today: positive momentum above the
/// entry threshold, a price to buy at, and not already held.
fn entry_candidates<'a>(
    ranked: &'a [ScoredCandidate],
    open: &[Position],
) -> Vec<&'a ScoredCandidate> {
    ranked
        .iter()
        .filter(|c| {
            c.snapshot
                .momentum_3m
                .is_some_and(|m| m > ENTRY_MOMENTUM_THRESHOLD)
        })
        .filter(|c| c.snapshot.price.is_some())
        .filter(|c| !open.iter().any(|p| p.symbol == c.snapshot.symbol))
        .collect()
}

/// Run one screen through the day-stepped simulation.
///
/// Each trading day: pull the day's snapshots, update every open
/// position (symbols without data stay frozen), close whatever exited,
/// record the portfolio value, then open new positions if slots remain.
/// Whatever is still open at the end of the range is force-closed at its
/// last marked price.
pub fn run_backtest(
    screen: &Screen,
    market: &dyn MarketDataPort,
    config: &BacktestConfig,
) -> Result<BacktestResult, SievetraderError> {
    let days = trading_days(config.start_date, config.end_date);
    let sizer = select_sizer(screen, config.max_positions);

    let mut cash = config.initial_capital;
    let mut open: Vec<Position> = Vec::new();
    let mut trades: Vec<Trade> = Vec::new();
    let mut daily_values: Vec<DailyValue> = Vec::new();
    let mut ledger = CapitalLedger::new();

    for &day in &days {
        let candidates = market.candidates_for_date(screen, day)?;
        let by_symbol: HashMap<&str, &StockSnapshot> =
            candidates.iter().map(|s| (s.symbol.as_str(), s)).collect();

        // Update pass: mark each position, close the ones that exit.
        let mut day_pnl = 0.0;
        let mut day_had_close = false;
        let mut still_open = Vec::with_capacity(open.len());
        for mut position in open {
            let snapshot = by_symbol.get(position.symbol.as_str()).copied();
            match step_position(&mut position, snapshot) {
                DayOutcome::Exit(reason) => {
                    let price = position.current_price;
                    let trade = close_position(&mut position, price, day, reason);
                    cash += trade.exit_price * trade.quantity as f64;
                    day_pnl += trade.pnl;
                    day_had_close = true;
                    trades.push(trade);
                }
                DayOutcome::Held | DayOutcome::Frozen => still_open.push(position),
            }
        }
        open = still_open;

        let positions_value: f64 = open.iter().map(|p| p.market_value()).sum();
        daily_values.push(DailyValue {
            date: day,
            total_value: cash + positions_value,
            cash,
            positions_value,
            open_positions: open.len(),
        });

        // Entry pass, only while slots remain.
        if open.len() < config.max_positions && !candidates.is_empty() {
            let ranked = rank_value_candidates(evaluate_candidates(screen, &candidates));
            let qualified = entry_candidates(&ranked, &open);
            let slots = config.max_positions - open.len();
            let size = sizer.position_size(&SizingContext {
                available_capital: cash,
                qualified_today: qualified.len(),
            });

            for candidate in qualified.into_iter().take(slots) {
                let Some(price) = candidate.snapshot.price else {
                    continue;
                };
                let quantity = shares_for(size.min(cash), price);
                if quantity < 1 {
                    continue;
                }
                let cost = quantity as f64 * price;
                if cost > cash {
                    continue;
                }
                cash -= cost;
                open.push(
                    Position::open(
                        candidate.snapshot.symbol.clone(),
                        quantity,
                        price,
                        day,
                        config.trailing_stop_pct,
                    )
                    .with_screen(screen.id),
                );
            }
        }

        if day_had_close {
            ledger.post(day, cash, day_pnl);
        }
    }

    // Force-close whatever survived the range at its last marked price.
    if let Some(&last_day) = days.last() {
        let mut day_pnl = 0.0;
        let mut closed_any = false;
        for mut position in std::mem::take(&mut open) {
            let price = position.current_price;
            let trade = close_position(&mut position, price, last_day, ExitReason::BacktestEnd);
            cash += trade.exit_price * trade.quantity as f64;
            day_pnl += trade.pnl;
            closed_any = true;
            trades.push(trade);
        }
        if closed_any {
            ledger.post(last_day, cash, day_pnl);
        }
    }

    let metrics = BacktestMetrics::compute(config.initial_capital, &trades, &daily_values);
    let recent_trades: Vec<Trade> = trades.iter().rev().take(RESULT_TRADE_CAP).cloned().collect();

    Ok(BacktestResult {
        screen_id: screen.id,
        initial_capital: config.initial_capital,
        final_value: cash,
        trades: recent_trades,
        daily_values,
        ledger,
        metrics,
    })
}
