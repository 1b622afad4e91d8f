//! SQLite store integration tests.
//!
//! Exercises the StorePort implementation end to end: screen catalog,
//! watchlists, fills with their pool debits, trades, and the capital
//! ledger window.

#![cfg(feature = "sqlite")]

use chrono::{Duration, NaiveDate};
use sievetrader::adapters::file_config_adapter::FileConfigAdapter;
use sievetrader::adapters::sqlite_adapter::SqliteAdapter;
use sievetrader::domain::error::SievetraderError;
use sievetrader::domain::ledger::{LedgerEntry, LEDGER_WINDOW};
use sievetrader::domain::position::{ExitReason, Fill, Position, Trade};
use sievetrader::domain::screen::{MetricFilter, Screen, ScreenKind, WatchlistItem};
use sievetrader::domain::snapshot::Metric;
use sievetrader::ports::store_port::StorePort;

fn store() -> SqliteAdapter {
    let adapter = SqliteAdapter::in_memory().unwrap();
    adapter.initialize_schema().unwrap();
    adapter
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn earnings_screen(id: i64, pool: f64) -> Screen {
    let mut screen = Screen::new(id, format!("surprise {id}"), ScreenKind::Earnings);
    screen.allocated_capital = Some(pool);
    screen
}

fn open_position(screen_id: i64, symbol: &str, quantity: i64, price: f64) -> Position {
    Position::open(symbol, quantity, price, date(2024, 3, 15), 2.0).with_screen(screen_id)
}

fn fill_for(position: &Position) -> Fill {
    Fill {
        screen_id: position.screen_id.unwrap(),
        symbol: position.symbol.clone(),
        quantity: position.quantity,
        price: position.entry_price,
        date: position.entry_date,
    }
}

#[test]
fn from_config_opens_on_disk_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let db_path = dir.path().join("market.db");
    let ini = format!("[sqlite]\npath = {}\npool_size = 2\n", db_path.display());
    let config = FileConfigAdapter::from_string(&ini).unwrap();

    let adapter = SqliteAdapter::from_config(&config).unwrap();
    adapter.initialize_schema().unwrap();
    adapter.insert_screen(&earnings_screen(1, 5_000.0)).unwrap();
    drop(adapter);

    // Reopen: the catalog must survive the connection.
    let adapter = SqliteAdapter::from_config(&config).unwrap();
    let screen = adapter.get_screen(1).unwrap();
    assert_eq!(screen.name, "surprise 1");
    assert_eq!(screen.allocated_capital, Some(5_000.0));
}

#[test]
fn screen_round_trip_with_filters() {
    let store = store();
    let mut screen = Screen::new(7, "deep value", ScreenKind::Value);
    screen.filters = vec![
        MetricFilter::at_most(Metric::PeRatio, 25.0),
        MetricFilter::between(Metric::PbRatio, 0.5, 3.0),
    ];
    store.insert_screen(&screen).unwrap();

    let fetched = store.get_screen(7).unwrap();
    assert_eq!(fetched.name, "deep value");
    assert_eq!(fetched.kind, ScreenKind::Value);
    assert_eq!(fetched.filters.len(), 2);
    assert!(fetched
        .filters
        .iter()
        .any(|f| f.metric == Metric::PeRatio && f.max == Some(25.0)));
}

#[test]
fn get_screen_unknown_id_fails() {
    let store = store();
    let err = store.get_screen(99).unwrap_err();
    assert!(matches!(err, SievetraderError::ScreenNotFound { id: 99 }));
}

#[test]
fn list_screens_ordered_by_id() {
    let store = store();
    store.insert_screen(&earnings_screen(2, 1_000.0)).unwrap();
    store.insert_screen(&earnings_screen(1, 2_000.0)).unwrap();

    let screens = store.list_screens().unwrap();
    let ids: Vec<i64> = screens.iter().map(|s| s.id).collect();
    assert_eq!(ids, [1, 2]);
}

#[test]
fn replace_watchlist_overwrites_previous_day() {
    let store = store();
    store
        .replace_watchlist(
            1,
            &[
                WatchlistItem {
                    screen_id: 1,
                    symbol: "OLD".into(),
                    score: 6.0,
                },
                WatchlistItem {
                    screen_id: 1,
                    symbol: "STALE".into(),
                    score: 5.0,
                },
            ],
        )
        .unwrap();
    store
        .replace_watchlist(
            1,
            &[WatchlistItem {
                screen_id: 1,
                symbol: "FRESH".into(),
                score: 8.2,
            }],
        )
        .unwrap();

    let items = store.watchlist(1).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].symbol, "FRESH");
    assert!((items[0].score - 8.2).abs() < f64::EPSILON);
}

#[test]
fn watchlist_returned_best_score_first() {
    let store = store();
    store
        .replace_watchlist(
            1,
            &[
                WatchlistItem {
                    screen_id: 1,
                    symbol: "MID".into(),
                    score: 5.0,
                },
                WatchlistItem {
                    screen_id: 1,
                    symbol: "TOP".into(),
                    score: 9.0,
                },
                WatchlistItem {
                    screen_id: 1,
                    symbol: "LOW".into(),
                    score: 2.0,
                },
            ],
        )
        .unwrap();

    let symbols: Vec<String> = store
        .watchlist(1)
        .unwrap()
        .into_iter()
        .map(|i| i.symbol)
        .collect();
    assert_eq!(symbols, ["TOP", "MID", "LOW"]);
}

#[test]
fn record_fill_persists_position_debit_and_ledger() {
    let store = store();
    store.insert_screen(&earnings_screen(1, 1_000.0)).unwrap();

    let position = open_position(1, "BEAT", 25, 40.0);
    let fill = fill_for(&position);
    let pool_after = 1_000.0 - fill.cost();

    let position_id = store.record_fill(&position, &fill, pool_after).unwrap();
    assert!(position_id > 0);

    let open = store.open_positions(1).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, Some(position_id));
    assert_eq!(open[0].symbol, "BEAT");
    assert_eq!(open[0].quantity, 25);
    assert!(open[0].is_open());

    let screen = store.get_screen(1).unwrap();
    assert_eq!(screen.current_capital, Some(0.0));
    assert_eq!(screen.pool_capital(), Some(0.0));

    // The fill day lands in the ledger with the post-debit balance.
    let ledger = store.ledger(1).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].date, fill.date);
    assert!((ledger[0].capital - 0.0).abs() < f64::EPSILON);
    assert!((ledger[0].pnl_delta - 0.0).abs() < f64::EPSILON);
}

#[test]
fn pool_balance_tracks_successive_fills() {
    let store = store();
    store.insert_screen(&earnings_screen(1, 1_000.0)).unwrap();

    let first = open_position(1, "AAA", 10, 30.0);
    let second = open_position(1, "BBB", 5, 50.0);

    let mut pool = 1_000.0;
    for position in [&first, &second] {
        let fill = fill_for(position);
        pool -= fill.cost();
        store.record_fill(position, &fill, pool).unwrap();
    }

    // 1000 - 300 - 250
    let screen = store.get_screen(1).unwrap();
    assert_eq!(screen.pool_capital(), Some(450.0));
    assert_eq!(store.open_positions(1).unwrap().len(), 2);
}

#[test]
fn open_positions_scoped_to_screen() {
    let store = store();
    let mine = open_position(1, "MINE", 10, 20.0);
    let other = open_position(2, "OTHER", 10, 20.0);
    store.record_fill(&mine, &fill_for(&mine), 800.0).unwrap();
    store.record_fill(&other, &fill_for(&other), 800.0).unwrap();

    let open = store.open_positions(1).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].symbol, "MINE");
}

#[test]
fn trades_round_trip_oldest_exit_first() {
    let store = store();
    let trade = |symbol: &str, exit: NaiveDate| Trade {
        symbol: symbol.to_string(),
        screen_id: Some(1),
        quantity: 10,
        entry_price: 100.0,
        entry_date: date(2024, 3, 11),
        exit_price: 104.0,
        exit_date: exit,
        pnl: 40.0,
        pnl_pct: 4.0,
        hold_days: 2,
        exit_reason: ExitReason::TimeCutoff,
    };

    store.record_trade(&trade("LATE", date(2024, 3, 20))).unwrap();
    store.record_trade(&trade("EARLY", date(2024, 3, 13))).unwrap();

    let trades = store.trades_for_screen(1).unwrap();
    let symbols: Vec<&str> = trades.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(symbols, ["EARLY", "LATE"]);
    assert_eq!(trades[0].exit_reason, ExitReason::TimeCutoff);
    assert!((trades[0].pnl - 40.0).abs() < f64::EPSILON);
}

#[test]
fn ledger_upsert_overwrites_capital_and_accumulates_pnl() {
    let store = store();
    let day = date(2024, 3, 15);

    store
        .post_ledger_entry(
            1,
            &LedgerEntry {
                date: day,
                capital: 9_500.0,
                pnl_delta: -500.0,
            },
        )
        .unwrap();
    store
        .post_ledger_entry(
            1,
            &LedgerEntry {
                date: day,
                capital: 9_800.0,
                pnl_delta: 300.0,
            },
        )
        .unwrap();

    let ledger = store.ledger(1).unwrap();
    assert_eq!(ledger.len(), 1);
    assert!((ledger[0].capital - 9_800.0).abs() < f64::EPSILON);
    assert!((ledger[0].pnl_delta - -200.0).abs() < f64::EPSILON);
}

#[test]
fn ledger_keeps_only_the_rolling_window() {
    let store = store();
    let start = date(2024, 1, 1);

    for offset in 0..(LEDGER_WINDOW + 5) {
        let day = start + Duration::days(offset as i64);
        store
            .post_ledger_entry(
                1,
                &LedgerEntry {
                    date: day,
                    capital: 10_000.0 + offset as f64,
                    pnl_delta: 0.0,
                },
            )
            .unwrap();
    }

    let ledger = store.ledger(1).unwrap();
    assert_eq!(ledger.len(), LEDGER_WINDOW);
    // The five oldest days fell off the front.
    assert_eq!(ledger[0].date, start + Duration::days(5));
    assert_eq!(
        ledger.last().unwrap().date,
        start + Duration::days((LEDGER_WINDOW + 4) as i64)
    );
}

#[test]
fn ledger_window_is_per_screen() {
    let store = store();
    let day = date(2024, 3, 15);
    let entry = LedgerEntry {
        date: day,
        capital: 1_000.0,
        pnl_delta: 0.0,
    };

    store.post_ledger_entry(1, &entry).unwrap();
    store.post_ledger_entry(2, &entry).unwrap();

    assert_eq!(store.ledger(1).unwrap().len(), 1);
    assert_eq!(store.ledger(2).unwrap().len(), 1);
    assert!(store.ledger(3).unwrap().is_empty());
}

#[test]
fn update_screen_capital_sets_running_balance() {
    let store = store();
    store.insert_screen(&earnings_screen(1, 5_000.0)).unwrap();

    store.update_screen_capital(1, 4_250.0).unwrap();

    let screen = store.get_screen(1).unwrap();
    assert_eq!(screen.allocated_capital, Some(5_000.0));
    assert_eq!(screen.current_capital, Some(4_250.0));
    assert_eq!(screen.pool_capital(), Some(4_250.0));
}
