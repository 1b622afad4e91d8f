//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_market_adapter::CsvMarketAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::stderr_notify_adapter::StderrNotifyAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{
    validate_account_config, validate_backtest_config, validate_screen_config,
};
use crate::domain::earnings::{execute_opportunities, identify_opportunities, AccountSettings};
use crate::domain::error::SievetraderError;
use crate::domain::ranking::{rank_value_candidates, take_watchlist};
use crate::domain::score::evaluate_candidates;
use crate::domain::screen::{
    MetricFilter, Screen, ScreenKind, DEFAULT_MIN_SURPRISE_PCT, DEFAULT_POSITIONS_PER_DAY,
};
use crate::domain::snapshot::Metric;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::MarketDataPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::report_port::ReportPort;
use crate::ports::store_port::{persist_backtest_trades, StorePort};

#[derive(Parser, Debug)]
#[command(name = "sievetrader", about = "Equity screener and paper-trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a historical backtest for a screen
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Stored screen id; defaults to the [screen] config section
        #[arg(long)]
        screen_id: Option<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Refresh a screen's watchlist for one trading date
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Trading date to evaluate (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        #[arg(long)]
        screen_id: Option<i64>,
    },
    /// Identify, and optionally fill, a day's earnings opportunities
    Earnings {
        #[arg(short, long)]
        config: PathBuf,
        /// Report date to evaluate (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Fill the identified opportunities against the screen's pool
        #[arg(long)]
        execute: bool,
        #[arg(long)]
        screen_id: Option<i64>,
    },
    /// List stored screens
    ListScreens {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            screen_id,
            output,
        } => run_backtest(&config, screen_id, output.as_ref()),
        Command::Screen {
            config,
            date,
            screen_id,
        } => run_screen(&config, &date, screen_id),
        Command::Earnings {
            config,
            date,
            execute,
            screen_id,
        } => run_earnings(&config, &date, execute, screen_id),
        Command::ListScreens { config } => run_list_screens(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SievetraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, ExitCode> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        eprintln!("error: invalid date {value}, expected YYYY-MM-DD");
        ExitCode::from(2)
    })
}

/// Build the market adapter from [csv] paths, when configured.
pub fn build_csv_market(config: &dyn ConfigPort) -> Option<CsvMarketAdapter> {
    let fundamentals = config.get_string("csv", "fundamentals_path")?;
    let earnings = config
        .get_string("csv", "earnings_path")
        .unwrap_or_else(|| "earnings.csv".to_string());
    Some(CsvMarketAdapter::new(
        PathBuf::from(fundamentals),
        PathBuf::from(earnings),
    ))
}

/// Build a screen from the [screen] config section. Filter bounds come
/// from `<metric>_min` / `<metric>_max` keys; a metric with neither key
/// gets no filter.
pub fn build_screen(config: &dyn ConfigPort) -> Result<Screen, SievetraderError> {
    let name = config
        .get_string("screen", "name")
        .ok_or_else(|| SievetraderError::ConfigMissing {
            section: "screen".into(),
            key: "name".into(),
        })?;
    let kind_str = config
        .get_string("screen", "kind")
        .ok_or_else(|| SievetraderError::ConfigMissing {
            section: "screen".into(),
            key: "kind".into(),
        })?;
    let kind = ScreenKind::parse(kind_str.trim()).ok_or_else(|| {
        SievetraderError::ConfigInvalid {
            section: "screen".into(),
            key: "kind".into(),
            reason: format!("unknown kind {kind_str}, expected value or earnings"),
        }
    })?;

    let mut screen = Screen::new(config.get_int("screen", "id", 0), name, kind);
    screen.is_active = config.get_bool("screen", "is_active", true);
    screen.allocated_capital = config.get_opt_double("screen", "allocated_capital");
    screen.current_capital = config.get_opt_double("screen", "current_capital");
    screen.max_positions_per_day = Screen::clamp_positions_per_day(config.get_int(
        "screen",
        "max_positions_per_day",
        DEFAULT_POSITIONS_PER_DAY as i64,
    ));
    screen.min_surprise_pct =
        config.get_double("screen", "min_surprise_pct", DEFAULT_MIN_SURPRISE_PCT);

    for metric in Metric::ALL {
        let min = config.get_opt_double("screen", &format!("{}_min", metric.as_str()));
        let max = config.get_opt_double("screen", &format!("{}_max", metric.as_str()));
        if min.is_some() || max.is_some() {
            screen.filters.push(MetricFilter::new(metric, min, max));
        }
    }

    Ok(screen)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SievetraderError> {
    let start_str = config
        .get_string("backtest", "start_date")
        .ok_or_else(|| SievetraderError::ConfigMissing {
            section: "backtest".into(),
            key: "start_date".into(),
        })?;
    let end_str = config.get_string("backtest", "end_date").ok_or_else(|| {
        SievetraderError::ConfigMissing {
            section: "backtest".into(),
            key: "end_date".into(),
        }
    })?;

    let start_date = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        SievetraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;
    let end_date = NaiveDate::parse_from_str(&end_str, "%Y-%m-%d").map_err(|_| {
        SievetraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "end_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: config.get_double("backtest", "initial_capital", 100_000.0),
        max_positions: config.get_int("backtest", "max_positions", 10) as usize,
        trailing_stop_pct: config.get_double("backtest", "trailing_stop_pct", 2.0),
    })
}

pub fn build_account_settings(config: &dyn ConfigPort) -> AccountSettings {
    AccountSettings {
        max_positions: config.get_int("account", "max_positions", 10) as usize,
        automation_enabled: config.get_bool("account", "automation_enabled", false),
        trailing_stop_pct: config.get_double("account", "trailing_stop_pct", 2.0),
    }
}

/// Resolve the screen to operate on: a stored screen when `--screen-id`
/// is given, the [screen] config section otherwise.
fn resolve_screen(
    adapter: &FileConfigAdapter,
    screen_id: Option<i64>,
) -> Result<Screen, ExitCode> {
    match screen_id {
        None => {
            if let Err(e) = validate_screen_config(adapter) {
                eprintln!("error: {e}");
                return Err((&e).into());
            }
            build_screen(adapter).map_err(|e| {
                eprintln!("error: {e}");
                (&e).into()
            })
        }
        Some(id) => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;

                let store = SqliteAdapter::from_config(adapter).map_err(|e| {
                    eprintln!("error: {e}");
                    ExitCode::from(&e)
                })?;
                store.get_screen(id).map_err(|e| {
                    eprintln!("error: {e}");
                    (&e).into()
                })
            }

            #[cfg(not(feature = "sqlite"))]
            {
                let _ = id;
                eprintln!("error: sqlite feature is required for --screen-id");
                Err(ExitCode::from(1))
            }
        }
    }
}

fn run_backtest(
    config_path: &PathBuf,
    screen_id: Option<i64>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate backtest config
    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Resolve the screen
    let screen = match resolve_screen(&adapter, screen_id) {
        Ok(s) => s,
        Err(code) => return code,
    };
    eprintln!("Loading screen: {}", screen.name);

    // Stage 4: Build BacktestConfig
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Market data source, CSV paths first
    if let Some(market) = build_csv_market(&adapter) {
        return run_backtest_pipeline(&market, None, &screen, &bt_config, output_path);
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let db = match SqliteAdapter::from_config(&adapter) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        run_backtest_pipeline(
            &db,
            Some(&db as &dyn StorePort),
            &screen,
            &bt_config,
            output_path,
        )
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&screen, &bt_config, output_path);
        eprintln!("error: configure [csv] paths or build with the sqlite feature");
        ExitCode::from(1)
    }
}

pub fn run_backtest_pipeline(
    market: &dyn MarketDataPort,
    store: Option<&dyn StorePort>,
    screen: &Screen,
    bt_config: &BacktestConfig,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    eprintln!(
        "Running backtest: {}, {} to {}",
        screen.name, bt_config.start_date, bt_config.end_date,
    );

    let result = match backtest_engine::run_backtest(screen, market, bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let metrics = &result.metrics;
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Initial Capital:  ${:.2}", result.initial_capital);
    eprintln!("Final Value:      ${:.2}", result.final_value);
    eprintln!("Total Return:     {:.2}%", metrics.total_return_pct);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown_pct);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Avg Hold:         {:.1} days", metrics.avg_hold_days);

    if let Some(store) = store {
        match persist_backtest_trades(store, screen.id, &result.trades, result.ledger.entries()) {
            Ok(()) => eprintln!(
                "Saved {} trades and {} ledger entries",
                result.trades.len(),
                result.ledger.len(),
            ),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("report"));

    let report = CsvReportAdapter::new();
    match report.write(&result, screen, &output.display().to_string()) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_screen(config_path: &PathBuf, date_str: &str, screen_id: Option<i64>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let date = match parse_date_arg(date_str) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let screen = match resolve_screen(&adapter, screen_id) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if let Some(market) = build_csv_market(&adapter) {
        return run_screen_pipeline(&market, None, &screen, date);
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let db = match SqliteAdapter::from_config(&adapter) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        run_screen_pipeline(&db, Some(&db as &dyn StorePort), &screen, date)
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&screen, date);
        eprintln!("error: configure [csv] paths or build with the sqlite feature");
        ExitCode::from(1)
    }
}

pub fn run_screen_pipeline(
    market: &dyn MarketDataPort,
    store: Option<&dyn StorePort>,
    screen: &Screen,
    date: NaiveDate,
) -> ExitCode {
    eprintln!("Screening {} on {}", screen.name, date);

    let candidates = match market.candidates_for_date(screen, date) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if candidates.is_empty() {
        let err = SievetraderError::NoCandidates {
            screen: screen.name.clone(),
            date,
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    let ranked = rank_value_candidates(evaluate_candidates(screen, &candidates));
    let items = take_watchlist(screen.id, &ranked);

    eprintln!(
        "{} candidates, pool of {}, watchlist of {}",
        candidates.len(),
        ranked.len(),
        items.len(),
    );
    for (rank, item) in items.iter().enumerate() {
        println!("{:>3}. {:<8} {:.2}", rank + 1, item.symbol, item.score);
    }

    if let Some(store) = store {
        if let Err(e) = store.replace_watchlist(screen.id, &items) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Watchlist saved ({} symbols)", items.len());
    }

    ExitCode::SUCCESS
}

fn run_earnings(
    config_path: &PathBuf,
    date_str: &str,
    execute: bool,
    screen_id: Option<i64>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_account_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let account = build_account_settings(&adapter);

    let date = match parse_date_arg(date_str) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let screen = match resolve_screen(&adapter, screen_id) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if let Some(market) = build_csv_market(&adapter) {
        return run_earnings_pipeline(&market, None, &screen, &account, date, execute);
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let db = match SqliteAdapter::from_config(&adapter) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        run_earnings_pipeline(
            &db,
            Some(&db as &dyn StorePort),
            &screen,
            &account,
            date,
            execute,
        )
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&screen, &account, date, execute);
        eprintln!("error: configure [csv] paths or build with the sqlite feature");
        ExitCode::from(1)
    }
}

pub fn run_earnings_pipeline(
    market: &dyn MarketDataPort,
    store: Option<&dyn StorePort>,
    screen: &Screen,
    account: &AccountSettings,
    date: NaiveDate,
    execute: bool,
) -> ExitCode {
    eprintln!("Scanning earnings for {} on {}", screen.name, date);
    let notifier = StderrNotifyAdapter::new();

    let opportunities = match identify_opportunities(screen, date, market, account) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if opportunities.is_empty() {
        if let Err(e) = notifier.notify_no_opportunities(&screen.name, date) {
            eprintln!("Warning: notification failed: {e}");
        }
        return ExitCode::SUCCESS;
    }

    eprintln!("{} opportunities found", opportunities.len());
    for opportunity in &opportunities {
        println!(
            "{:<8} {:+.1}% surprise @ {:.2}",
            opportunity.symbol, opportunity.surprise_pct, opportunity.price,
        );
    }

    if !execute {
        return ExitCode::SUCCESS;
    }
    if !account.automation_enabled {
        eprintln!("automation_enabled is off; nothing filled");
        return ExitCode::SUCCESS;
    }

    let Some(store) = store else {
        eprintln!("error: a sqlite store is required to execute fills");
        return ExitCode::from(1);
    };

    let fills = match execute_opportunities(screen, date, &opportunities, store, &notifier, account)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let spent: f64 = fills.iter().map(|f| f.cost()).sum();
    eprintln!("{} fills made, ${:.2} deployed", fills.len(), spent);
    ExitCode::SUCCESS
}

fn run_list_screens(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if adapter.get_string("sqlite", "path").is_some() {
        #[cfg(feature = "sqlite")]
        {
            use crate::adapters::sqlite_adapter::SqliteAdapter;

            let store = match SqliteAdapter::from_config(&adapter) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            return print_stored_screens(&store);
        }

        #[cfg(not(feature = "sqlite"))]
        {
            eprintln!("error: sqlite feature is required to list stored screens");
            return ExitCode::from(1);
        }
    }

    // No store configured: show the screen defined inline.
    if let Err(e) = validate_screen_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let screen = match build_screen(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    println!("{}", screen_line(&screen, None));
    ExitCode::SUCCESS
}

fn screen_line(screen: &Screen, open_positions: Option<usize>) -> String {
    let pool = screen
        .pool_capital()
        .map(|c| format!("${c:.2}"))
        .unwrap_or_else(|| "-".to_string());
    let open = open_positions
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>4}  {:<24} {:<9} pool {:>12}  open {}",
        screen.id, screen.name, screen.kind, pool, open,
    )
}

#[cfg(feature = "sqlite")]
fn print_stored_screens(store: &dyn StorePort) -> ExitCode {
    let screens = match store.list_screens() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if screens.is_empty() {
        eprintln!("No screens stored");
        return ExitCode::SUCCESS;
    }

    for screen in &screens {
        let open = match store.open_positions(screen.id) {
            Ok(positions) => positions.len(),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        println!("{}", screen_line(screen, Some(open)));
    }
    eprintln!("{} screens", screens.len());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("  [backtest] ok");

    if let Err(e) = validate_screen_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("  [screen] ok");

    if let Err(e) = validate_account_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("  [account] ok");

    let screen = match build_screen(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nScreen: {} ({})", screen.name, screen.kind);
    for filter in &screen.filters {
        eprintln!("  {}", filter_line(filter));
    }
    if screen.kind == ScreenKind::Earnings {
        eprintln!("  min surprise: {:.1}%", screen.min_surprise_pct);
        eprintln!("  max positions/day: {}", screen.max_positions_per_day);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn filter_line(filter: &MetricFilter) -> String {
    match (filter.min, filter.max) {
        (Some(min), Some(max)) => format!("{} between {} and {}", filter.metric, min, max),
        (Some(min), None) => format!("{} >= {}", filter.metric, min),
        (None, Some(max)) => format!("{} <= {}", filter.metric, max),
        (None, None) => format!("{} unbounded", filter.metric),
    }
}
