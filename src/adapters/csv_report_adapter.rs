//! CSV report adapter implementing ReportPort.
//!
//! Writes a backtest result as three flat files under the output
//! directory: a metric summary, the trade log, and the daily value
//! series.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SievetraderError;
use crate::domain::screen::Screen;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_err(e: csv::Error) -> SievetraderError {
    SievetraderError::Io(std::io::Error::other(e.to_string()))
}

fn write_summary(
    result: &BacktestResult,
    screen: &Screen,
    path: &Path,
) -> Result<(), SievetraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(["metric", "value"]).map_err(csv_err)?;

    let m = &result.metrics;
    let rows = [
        ("screen", screen.name.clone()),
        ("initial_capital", format!("{:.2}", result.initial_capital)),
        ("final_value", format!("{:.2}", result.final_value)),
        ("total_return", format!("{:.2}", m.total_return)),
        ("total_return_pct", format!("{:.2}", m.total_return_pct)),
        ("total_trades", m.total_trades.to_string()),
        ("wins", m.wins.to_string()),
        ("losses", m.losses.to_string()),
        ("win_rate", format!("{:.2}", m.win_rate)),
        ("avg_gain_pct", format!("{:.4}", m.avg_gain_pct)),
        ("avg_loss_pct", format!("{:.4}", m.avg_loss_pct)),
        ("best_trade_pct", format!("{:.2}", m.best_trade_pct)),
        ("worst_trade_pct", format!("{:.2}", m.worst_trade_pct)),
        ("profit_factor", format!("{:.4}", m.profit_factor)),
        ("sharpe_ratio", format!("{:.4}", m.sharpe_ratio)),
        ("max_drawdown_pct", format!("{:.2}", m.max_drawdown_pct)),
        ("avg_hold_days", format!("{:.2}", m.avg_hold_days)),
    ];
    for (name, value) in rows {
        writer.write_record([name, value.as_str()]).map_err(csv_err)?;
    }

    writer.flush().map_err(SievetraderError::Io)?;
    Ok(())
}

fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), SievetraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record([
            "symbol",
            "quantity",
            "entry_date",
            "entry_price",
            "exit_date",
            "exit_price",
            "pnl",
            "pnl_pct",
            "hold_days",
            "exit_reason",
        ])
        .map_err(csv_err)?;

    for trade in &result.trades {
        writer
            .write_record([
                trade.symbol.as_str(),
                &trade.quantity.to_string(),
                &trade.entry_date.format("%Y-%m-%d").to_string(),
                &format!("{:.2}", trade.entry_price),
                &trade.exit_date.format("%Y-%m-%d").to_string(),
                &format!("{:.2}", trade.exit_price),
                &format!("{:.2}", trade.pnl),
                &format!("{:.2}", trade.pnl_pct),
                &trade.hold_days.to_string(),
                trade.exit_reason.as_str(),
            ])
            .map_err(csv_err)?;
    }

    writer.flush().map_err(SievetraderError::Io)?;
    Ok(())
}

fn write_daily_values(result: &BacktestResult, path: &Path) -> Result<(), SievetraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record([
            "date",
            "total_value",
            "cash",
            "positions_value",
            "open_positions",
        ])
        .map_err(csv_err)?;

    for day in &result.daily_values {
        writer
            .write_record([
                day.date.format("%Y-%m-%d").to_string().as_str(),
                &format!("{:.2}", day.total_value),
                &format!("{:.2}", day.cash),
                &format!("{:.2}", day.positions_value),
                &day.open_positions.to_string(),
            ])
            .map_err(csv_err)?;
    }

    writer.flush().map_err(SievetraderError::Io)?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        screen: &Screen,
        output_path: &str,
    ) -> Result<(), SievetraderError> {
        let dir = Path::new(output_path);
        fs::create_dir_all(dir).map_err(SievetraderError::Io)?;

        write_summary(result, screen, &dir.join("summary.csv"))?;
        write_trades(result, &dir.join("trades.csv"))?;
        write_daily_values(result, &dir.join("daily_values.csv"))?;

        Ok(())
    }
}
