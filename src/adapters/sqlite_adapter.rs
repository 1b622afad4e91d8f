//! SQLite persistence adapter.
//!
//! Backs both the market data port (snapshots, earnings) and the store
//! port (screens, watchlists, positions, trades, capital ledger) from a
//! single pooled database.

use crate::domain::error::SievetraderError;
use crate::domain::ledger::{LEDGER_WINDOW, LedgerEntry};
use crate::domain::position::{ExitReason, Fill, Position, PositionStatus, Trade};
use crate::domain::screen::{MetricFilter, Screen, ScreenKind, WatchlistItem};
use crate::domain::snapshot::{EarningsReport, Metric, StockSnapshot};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::MarketDataPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Dates are stored as `%Y-%m-%d` text.
fn sql_date(column: usize, value: String) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn bad_text(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, message.into())
}

fn screen_from_row(row: &rusqlite::Row<'_>) -> Result<Screen, rusqlite::Error> {
    let kind_str: String = row.get(2)?;
    let kind = ScreenKind::parse(&kind_str)
        .ok_or_else(|| bad_text(2, format!("unknown screen kind: {kind_str}")))?;
    Ok(Screen {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        filters: Vec::new(),
        is_active: row.get(3)?,
        allocated_capital: row.get(4)?,
        current_capital: row.get(5)?,
        max_positions_per_day: row.get::<_, i64>(6)? as u32,
        min_surprise_pct: row.get(7)?,
    })
}

fn load_filters(
    conn: &rusqlite::Connection,
    screen_id: i64,
) -> Result<Vec<MetricFilter>, SievetraderError> {
    let query = "SELECT metric, min_value, max_value FROM screen_filters
                 WHERE screen_id = ?1 ORDER BY metric ASC";

    let mut stmt =
        conn.prepare(query)
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

    let rows = stmt
        .query_map(params![screen_id], |row| {
            let metric_str: String = row.get(0)?;
            let metric = Metric::parse(&metric_str)
                .ok_or_else(|| bad_text(0, format!("unknown metric: {metric_str}")))?;
            Ok(MetricFilter::new(metric, row.get(1)?, row.get(2)?))
        })
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

    let mut filters = Vec::new();
    for row in rows {
        filters.push(
            row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?,
        );
    }

    Ok(filters)
}

/// Ledger upsert: capital overwrites the day's balance, P&L accumulates
/// into it, then the screen's history is pruned to the newest
/// [`LEDGER_WINDOW`] days.
fn upsert_ledger(
    conn: &rusqlite::Connection,
    screen_id: i64,
    date: NaiveDate,
    capital: f64,
    pnl_delta: f64,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO capital_ledger (screen_id, date, capital, pnl_delta)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(screen_id, date) DO UPDATE SET
             capital = excluded.capital,
             pnl_delta = capital_ledger.pnl_delta + excluded.pnl_delta",
        params![screen_id, date_str(date), capital, pnl_delta],
    )?;

    conn.execute(
        "DELETE FROM capital_ledger
         WHERE screen_id = ?1
           AND date NOT IN (
               SELECT date FROM capital_ledger
               WHERE screen_id = ?1
               ORDER BY date DESC
               LIMIT ?2
           )",
        params![screen_id, LEDGER_WINDOW as i64],
    )?;

    Ok(())
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SievetraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| SievetraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| SievetraderError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, SievetraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS screens (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                kind TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                allocated_capital REAL,
                current_capital REAL,
                max_positions_per_day INTEGER NOT NULL,
                min_surprise_pct REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS screen_filters (
                screen_id INTEGER NOT NULL REFERENCES screens(id),
                metric TEXT NOT NULL,
                min_value REAL,
                max_value REAL,
                PRIMARY KEY (screen_id, metric)
            );
            CREATE TABLE IF NOT EXISTS snapshots (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                price REAL,
                market_cap REAL,
                pe_ratio REAL,
                ps_ratio REAL,
                pb_ratio REAL,
                dividend_yield REAL,
                debt_to_equity REAL,
                return_on_equity REAL,
                momentum_3m REAL,
                avg_volume REAL,
                data_quality REAL,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_date ON snapshots(date);
            CREATE TABLE IF NOT EXISTS earnings (
                symbol TEXT NOT NULL,
                report_date TEXT NOT NULL,
                actual_eps REAL NOT NULL,
                estimated_eps REAL NOT NULL,
                surprise_pct REAL NOT NULL,
                beat INTEGER NOT NULL,
                PRIMARY KEY (symbol, report_date)
            );
            CREATE INDEX IF NOT EXISTS idx_earnings_date ON earnings(report_date);
            CREATE TABLE IF NOT EXISTS watchlist (
                screen_id INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                score REAL NOT NULL,
                PRIMARY KEY (screen_id, symbol)
            );
            CREATE TABLE IF NOT EXISTS positions (
                id INTEGER PRIMARY KEY,
                screen_id INTEGER,
                symbol TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                entry_price REAL NOT NULL,
                entry_date TEXT NOT NULL,
                current_price REAL NOT NULL,
                high_water_mark REAL NOT NULL,
                trailing_stop_price REAL NOT NULL,
                trailing_stop_pct REAL NOT NULL,
                days_held INTEGER NOT NULL,
                status TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_positions_screen ON positions(screen_id, status);
            CREATE TABLE IF NOT EXISTS fills (
                id INTEGER PRIMARY KEY,
                screen_id INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                date TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY,
                screen_id INTEGER,
                symbol TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                entry_price REAL NOT NULL,
                entry_date TEXT NOT NULL,
                exit_price REAL NOT NULL,
                exit_date TEXT NOT NULL,
                pnl REAL NOT NULL,
                pnl_pct REAL NOT NULL,
                hold_days INTEGER NOT NULL,
                exit_reason TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_screen ON trades(screen_id);
            CREATE TABLE IF NOT EXISTS capital_ledger (
                screen_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                capital REAL NOT NULL,
                pnl_delta REAL NOT NULL,
                PRIMARY KEY (screen_id, date)
            );",
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_snapshots(&self, snapshots: &[StockSnapshot]) -> Result<(), SievetraderError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        for snap in snapshots {
            tx.execute(
                "INSERT OR REPLACE INTO snapshots (symbol, date, price, market_cap, pe_ratio,
                     ps_ratio, pb_ratio, dividend_yield, debt_to_equity, return_on_equity,
                     momentum_3m, avg_volume, data_quality)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    snap.symbol,
                    date_str(snap.date),
                    snap.price,
                    snap.market_cap,
                    snap.pe_ratio,
                    snap.ps_ratio,
                    snap.pb_ratio,
                    snap.dividend_yield,
                    snap.debt_to_equity,
                    snap.return_on_equity,
                    snap.momentum_3m,
                    snap.avg_volume,
                    snap.data_quality
                ],
            )
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    pub fn insert_earnings(&self, reports: &[EarningsReport]) -> Result<(), SievetraderError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        for report in reports {
            tx.execute(
                "INSERT OR REPLACE INTO earnings (symbol, report_date, actual_eps,
                     estimated_eps, surprise_pct, beat)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    report.symbol,
                    date_str(report.report_date),
                    report.actual_eps,
                    report.estimated_eps,
                    report.surprise_pct,
                    report.beat
                ],
            )
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Seed or overwrite one screen definition together with its filters.
    pub fn insert_screen(&self, screen: &Screen) -> Result<(), SievetraderError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        tx.execute(
            "INSERT OR REPLACE INTO screens (id, name, kind, is_active, allocated_capital,
                 current_capital, max_positions_per_day, min_surprise_pct)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                screen.id,
                screen.name,
                screen.kind.as_str(),
                screen.is_active,
                screen.allocated_capital,
                screen.current_capital,
                screen.max_positions_per_day as i64,
                screen.min_surprise_pct
            ],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        tx.execute(
            "DELETE FROM screen_filters WHERE screen_id = ?1",
            params![screen.id],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        for filter in &screen.filters {
            tx.execute(
                "INSERT INTO screen_filters (screen_id, metric, min_value, max_value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![screen.id, filter.metric.as_str(), filter.min, filter.max],
            )
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Closed trades for a screen, oldest exit first.
    pub fn trades_for_screen(&self, screen_id: i64) -> Result<Vec<Trade>, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT symbol, screen_id, quantity, entry_price, entry_date, exit_price,
                            exit_date, pnl, pnl_pct, hold_days, exit_reason
                     FROM trades
                     WHERE screen_id = ?1
                     ORDER BY exit_date ASC, id ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![screen_id], |row| {
                let reason_str: String = row.get(10)?;
                let exit_reason = ExitReason::parse(&reason_str)
                    .ok_or_else(|| bad_text(10, format!("unknown exit reason: {reason_str}")))?;
                Ok(Trade {
                    symbol: row.get(0)?,
                    screen_id: row.get(1)?,
                    quantity: row.get(2)?,
                    entry_price: row.get(3)?,
                    entry_date: sql_date(4, row.get(4)?)?,
                    exit_price: row.get(5)?,
                    exit_date: sql_date(6, row.get(6)?)?,
                    pnl: row.get(7)?,
                    pnl_pct: row.get(8)?,
                    hold_days: row.get(9)?,
                    exit_reason,
                })
            })
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(
                row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(trades)
    }
}

impl MarketDataPort for SqliteAdapter {
    fn candidates_for_date(
        &self,
        _screen: &Screen,
        date: NaiveDate,
    ) -> Result<Vec<StockSnapshot>, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT symbol, price, market_cap, pe_ratio, ps_ratio, pb_ratio,
                            dividend_yield, debt_to_equity, return_on_equity, momentum_3m,
                            avg_volume, data_quality
                     FROM snapshots
                     WHERE date = ?1
                     ORDER BY data_quality IS NULL, data_quality DESC,
                              market_cap IS NULL, market_cap DESC, symbol ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![date_str(date)], |row| {
                Ok(StockSnapshot {
                    symbol: row.get(0)?,
                    date,
                    price: row.get(1)?,
                    market_cap: row.get(2)?,
                    pe_ratio: row.get(3)?,
                    ps_ratio: row.get(4)?,
                    pb_ratio: row.get(5)?,
                    dividend_yield: row.get(6)?,
                    debt_to_equity: row.get(7)?,
                    return_on_equity: row.get(8)?,
                    momentum_3m: row.get(9)?,
                    avg_volume: row.get(10)?,
                    data_quality: row.get(11)?,
                })
            })
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(
                row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(snapshots)
    }

    fn earnings_reports_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<EarningsReport>, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT symbol, actual_eps, estimated_eps, surprise_pct, beat
                     FROM earnings
                     WHERE report_date = ?1
                     ORDER BY symbol ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![date_str(date)], |row| {
                Ok(EarningsReport {
                    symbol: row.get(0)?,
                    report_date: date,
                    actual_eps: row.get(1)?,
                    estimated_eps: row.get(2)?,
                    surprise_pct: row.get(3)?,
                    beat: row.get(4)?,
                })
            })
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut reports = Vec::new();
        for row in rows {
            reports.push(
                row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(reports)
    }
}

impl StorePort for SqliteAdapter {
    fn list_screens(&self) -> Result<Vec<Screen>, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT id, name, kind, is_active, allocated_capital, current_capital,
                            max_positions_per_day, min_surprise_pct
                     FROM screens
                     ORDER BY id ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt.query_map(params![], screen_from_row).map_err(
            |e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            },
        )?;

        let mut screens = Vec::new();
        for row in rows {
            screens.push(
                row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }
        drop(stmt);

        for screen in &mut screens {
            screen.filters = load_filters(&conn, screen.id)?;
        }

        Ok(screens)
    }

    fn get_screen(&self, id: i64) -> Result<Screen, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT id, name, kind, is_active, allocated_capital, current_capital,
                            max_positions_per_day, min_surprise_pct
                     FROM screens
                     WHERE id = ?1";

        let mut screen = match conn.query_row(query, params![id], screen_from_row) {
            Ok(screen) => screen,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(SievetraderError::ScreenNotFound { id });
            }
            Err(e) => {
                return Err(SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                });
            }
        };

        screen.filters = load_filters(&conn, screen.id)?;
        Ok(screen)
    }

    fn replace_watchlist(
        &self,
        screen_id: i64,
        items: &[WatchlistItem],
    ) -> Result<(), SievetraderError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        tx.execute(
            "DELETE FROM watchlist WHERE screen_id = ?1",
            params![screen_id],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        for item in items {
            tx.execute(
                "INSERT INTO watchlist (screen_id, symbol, score) VALUES (?1, ?2, ?3)",
                params![screen_id, item.symbol, item.score],
            )
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn watchlist(&self, screen_id: i64) -> Result<Vec<WatchlistItem>, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT screen_id, symbol, score FROM watchlist
                     WHERE screen_id = ?1
                     ORDER BY score DESC, symbol ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![screen_id], |row| {
                Ok(WatchlistItem {
                    screen_id: row.get(0)?,
                    symbol: row.get(1)?,
                    score: row.get(2)?,
                })
            })
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(
                row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(items)
    }

    fn record_fill(
        &self,
        position: &Position,
        fill: &Fill,
        pool_after: f64,
    ) -> Result<i64, SievetraderError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        tx.execute(
            "INSERT INTO positions (screen_id, symbol, quantity, entry_price, entry_date,
                 current_price, high_water_mark, trailing_stop_price, trailing_stop_pct,
                 days_held, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                position.screen_id,
                position.symbol,
                position.quantity,
                position.entry_price,
                date_str(position.entry_date),
                position.current_price,
                position.high_water_mark,
                position.trailing_stop_price,
                position.trailing_stop_pct,
                position.days_held as i64,
                position.status.as_str()
            ],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        let position_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO fills (screen_id, symbol, quantity, price, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fill.screen_id,
                fill.symbol,
                fill.quantity,
                fill.price,
                date_str(fill.date)
            ],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        tx.execute(
            "UPDATE screens SET current_capital = ?2 WHERE id = ?1",
            params![fill.screen_id, pool_after],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        upsert_ledger(&tx, fill.screen_id, fill.date, pool_after, 0.0).map_err(
            |e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            },
        )?;

        tx.commit()
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(position_id)
    }

    fn open_positions(&self, screen_id: i64) -> Result<Vec<Position>, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT id, screen_id, symbol, quantity, entry_price, entry_date,
                            current_price, high_water_mark, trailing_stop_price,
                            trailing_stop_pct, days_held
                     FROM positions
                     WHERE screen_id = ?1 AND status = 'open'
                     ORDER BY entry_date ASC, id ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![screen_id], |row| {
                Ok(Position {
                    id: row.get(0)?,
                    screen_id: row.get(1)?,
                    symbol: row.get(2)?,
                    quantity: row.get(3)?,
                    entry_price: row.get(4)?,
                    entry_date: sql_date(5, row.get(5)?)?,
                    current_price: row.get(6)?,
                    high_water_mark: row.get(7)?,
                    trailing_stop_price: row.get(8)?,
                    trailing_stop_pct: row.get(9)?,
                    days_held: row.get::<_, i64>(10)? as u32,
                    // the WHERE clause pins status
                    status: PositionStatus::Open,
                })
            })
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut positions = Vec::new();
        for row in rows {
            positions.push(
                row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(positions)
    }

    fn record_trade(&self, trade: &Trade) -> Result<(), SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO trades (screen_id, symbol, quantity, entry_price, entry_date,
                 exit_price, exit_date, pnl, pnl_pct, hold_days, exit_reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                trade.screen_id,
                trade.symbol,
                trade.quantity,
                trade.entry_price,
                date_str(trade.entry_date),
                trade.exit_price,
                date_str(trade.exit_date),
                trade.pnl,
                trade.pnl_pct,
                trade.hold_days,
                trade.exit_reason.as_str()
            ],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn post_ledger_entry(
        &self,
        screen_id: i64,
        entry: &LedgerEntry,
    ) -> Result<(), SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        upsert_ledger(&conn, screen_id, entry.date, entry.capital, entry.pnl_delta).map_err(
            |e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            },
        )
    }

    fn ledger(&self, screen_id: i64) -> Result<Vec<LedgerEntry>, SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT date, capital, pnl_delta FROM capital_ledger
                     WHERE screen_id = ?1
                     ORDER BY date ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![screen_id], |row| {
                Ok(LedgerEntry {
                    date: sql_date(0, row.get(0)?)?,
                    capital: row.get(1)?,
                    pnl_delta: row.get(2)?,
                })
            })
            .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(
                row.map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(entries)
    }

    fn update_screen_capital(&self, screen_id: i64, capital: f64) -> Result<(), SievetraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| SievetraderError::Database {
                reason: e.to_string(),
            })?;

        conn.execute(
            "UPDATE screens SET current_capital = ?2 WHERE id = ?1",
            params![screen_id, capital],
        )
        .map_err(|e: rusqlite::Error| SievetraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
