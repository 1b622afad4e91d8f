//! Daily position state machine: mark to market, ratchet the trailing
//! stop, then evaluate the exit rules in fixed precedence order.

use chrono::NaiveDate;

use crate::domain::position::{ExitReason, Position, PositionStatus, Trade};
use crate::domain::snapshot::StockSnapshot;

/// Trading days a position may be held before the time cutoff fires.
pub const MAX_HOLD_DAYS: u32 = 5;
/// Three-month momentum below this forces an exit.
pub const NEGATIVE_MOMENTUM_EXIT: f64 = -10.0;

/// Outcome of one simulated day for one open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    /// No snapshot or no price for the symbol today. Price, stop, and the
    /// day counter all stay frozen.
    Frozen,
    /// Marked to today's price and still open.
    Held,
    /// An exit rule fired at today's price.
    Exit(ExitReason),
}

/// Advance one open position by one trading day.
///
/// The high-water mark only ever rises, so the stop ratchets up on new
/// highs and never loosens on declines. Exit rules run after the ratchet,
/// first true wins: trailing stop, then negative momentum, then the
/// holding-period cutoff.
pub fn step_position(position: &mut Position, snapshot: Option<&StockSnapshot>) -> DayOutcome {
    let Some(snap) = snapshot else {
        return DayOutcome::Frozen;
    };
    let Some(price) = snap.price else {
        return DayOutcome::Frozen;
    };

    position.current_price = price;
    position.days_held += 1;

    if price > position.high_water_mark {
        position.high_water_mark = price;
        position.trailing_stop_price = price * (1.0 - position.trailing_stop_pct / 100.0);
    }

    if price <= position.trailing_stop_price {
        return DayOutcome::Exit(ExitReason::TrailingStop);
    }
    if snap
        .momentum_3m
        .is_some_and(|m| m < NEGATIVE_MOMENTUM_EXIT)
    {
        return DayOutcome::Exit(ExitReason::NegativeMomentum);
    }
    if position.days_held >= MAX_HOLD_DAYS {
        return DayOutcome::Exit(ExitReason::TimeCutoff);
    }
    DayOutcome::Held
}

/// Close a position at `price`, producing its immutable trade record.
/// P&L is exactly `(exit - entry) * quantity`.
pub fn close_position(
    position: &mut Position,
    price: f64,
    date: NaiveDate,
    reason: ExitReason,
) -> Trade {
    position.current_price = price;
    position.status = PositionStatus::Closed;

    let pnl = (price - position.entry_price) * position.quantity as f64;
    let pnl_pct = if position.entry_price > 0.0 {
        (price - position.entry_price) / position.entry_price * 100.0
    } else {
        0.0
    };

    Trade {
        symbol: position.symbol.clone(),
        screen_id: position.screen_id,
        quantity: position.quantity,
        entry_price: position.entry_price,
        entry_date: position.entry_date,
        exit_price: price,
        exit_date: date,
        pnl,
        pnl_pct,
        hold_days: i64::from(position.days_held),
        exit_reason: reason,
    }
}
