//! Backtest performance statistics.

use crate::domain::backtest::DailyValue;
use crate::domain::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestMetrics {
    /// Final value minus initial capital, in dollars.
    pub total_return: f64,
    pub total_return_pct: f64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Winning trades over all trades, as a percentage.
    pub win_rate: f64,
    /// Mean winner P&L normalized to starting capital, as a percentage.
    pub avg_gain_pct: f64,
    /// Mean loser magnitude normalized to starting capital, as a percentage.
    pub avg_loss_pct: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub avg_hold_days: f64,
}

impl BacktestMetrics {
    pub fn compute(initial_capital: f64, trades: &[Trade], daily_values: &[DailyValue]) -> Self {
        let final_value = daily_values
            .last()
            .map(|p| p.total_value)
            .unwrap_or(initial_capital);

        let total_return = final_value - initial_capital;
        let total_return_pct = if initial_capital > 0.0 {
            total_return / initial_capital * 100.0
        } else {
            0.0
        };

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_gain = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut best_trade_pct = f64::NEG_INFINITY;
        let mut worst_trade_pct = f64::INFINITY;
        let mut total_hold_days = 0i64;

        for trade in trades {
            if trade.pnl > 0.0 {
                wins += 1;
                gross_gain += trade.pnl;
            } else if trade.pnl < 0.0 {
                losses += 1;
                gross_loss += trade.pnl.abs();
            }
            if trade.pnl_pct > best_trade_pct {
                best_trade_pct = trade.pnl_pct;
            }
            if trade.pnl_pct < worst_trade_pct {
                worst_trade_pct = trade.pnl_pct;
            }
            total_hold_days += trade.hold_days;
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let normalize = |pnl_sum: f64, count: usize| -> f64 {
            if count > 0 && initial_capital > 0.0 {
                pnl_sum / count as f64 / initial_capital * 100.0
            } else {
                0.0
            }
        };
        let avg_gain_pct = normalize(gross_gain, wins);
        let avg_loss_pct = normalize(gross_loss, losses);

        // A loss-free run reports the gross gain itself rather than an
        // infinite ratio.
        let profit_factor = if gross_loss > 0.0 {
            gross_gain / gross_loss
        } else if gross_gain > 0.0 {
            gross_gain
        } else {
            0.0
        };

        let avg_hold_days = if total_trades > 0 {
            total_hold_days as f64 / total_trades as f64
        } else {
            0.0
        };

        BacktestMetrics {
            total_return,
            total_return_pct,
            total_trades,
            wins,
            losses,
            win_rate,
            avg_gain_pct,
            avg_loss_pct,
            best_trade_pct: if total_trades > 0 { best_trade_pct } else { 0.0 },
            worst_trade_pct: if total_trades > 0 { worst_trade_pct } else { 0.0 },
            profit_factor,
            sharpe_ratio: sharpe_ratio(&daily_returns(daily_values)),
            max_drawdown_pct: compute_max_drawdown(initial_capital, daily_values),
            avg_hold_days,
        }
    }
}

/// Day-over-day portfolio returns from the recorded value series.
fn daily_returns(daily_values: &[DailyValue]) -> Vec<f64> {
    daily_values
        .windows(2)
        .map(|w| {
            let prev = w[0].total_value;
            let curr = w[1].total_value;
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect()
}

/// Annualized Sharpe over daily returns: `mean / stdev * sqrt(252)`,
/// zero when the series is flat or too short.
fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();
    if stdev > 0.0 {
        mean / stdev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Largest peak-to-trough decline as a percentage of the peak. The
/// running peak starts at initial capital.
fn compute_max_drawdown(initial_capital: f64, daily_values: &[DailyValue]) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;
    for point in daily_values {
        if point.total_value > peak {
            peak = point.total_value;
        } else if peak > 0.0 {
            let dd = (peak - point.total_value) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
