//! Persistence port trait for screens, watchlists, positions, trades,
//! and the capital ledger.

use crate::domain::error::SievetraderError;
use crate::domain::ledger::LedgerEntry;
use crate::domain::position::{Fill, Position, Trade};
use crate::domain::screen::{Screen, WatchlistItem};

pub trait StorePort {
    /// Every saved screen, with filters attached.
    fn list_screens(&self) -> Result<Vec<Screen>, SievetraderError>;

    fn get_screen(&self, id: i64) -> Result<Screen, SievetraderError>;

    /// Atomically replace a screen's watchlist with a fresh ranking.
    fn replace_watchlist(
        &self,
        screen_id: i64,
        items: &[WatchlistItem],
    ) -> Result<(), SievetraderError>;

    /// Current watchlist for a screen, best score first.
    fn watchlist(&self, screen_id: i64) -> Result<Vec<WatchlistItem>, SievetraderError>;

    /// Persist a live entry: the position, its fill record, the pool
    /// debit down to `pool_after`, and the day's ledger row, all in one
    /// transaction. Returns the stored position id.
    fn record_fill(
        &self,
        position: &Position,
        fill: &Fill,
        pool_after: f64,
    ) -> Result<i64, SievetraderError>;

    /// Open positions for a screen, oldest entry first.
    fn open_positions(&self, screen_id: i64) -> Result<Vec<Position>, SievetraderError>;

    /// Persist one closed trade.
    fn record_trade(&self, trade: &Trade) -> Result<(), SievetraderError>;

    /// Upsert one ledger row: capital overwrites, P&L accumulates, and
    /// the screen's window is pruned to the newest 90 days.
    fn post_ledger_entry(
        &self,
        screen_id: i64,
        entry: &LedgerEntry,
    ) -> Result<(), SievetraderError>;

    /// Ledger rows for a screen in ascending date order.
    fn ledger(&self, screen_id: i64) -> Result<Vec<LedgerEntry>, SievetraderError>;

    /// Overwrite a screen's running pool balance.
    fn update_screen_capital(&self, screen_id: i64, capital: f64) -> Result<(), SievetraderError>;
}

/// Convenience for persisting a whole backtest outcome.
pub fn persist_backtest_trades(
    store: &dyn StorePort,
    screen_id: i64,
    trades: &[Trade],
    ledger_entries: &[LedgerEntry],
) -> Result<(), SievetraderError> {
    for trade in trades {
        store.record_trade(trade)?;
    }
    for entry in ledger_entries {
        store.post_ledger_entry(screen_id, entry)?;
    }
    Ok(())
}
