//! Earnings-surprise opportunities: find today's qualifying beats and,
//! when automation is on, fill them against the screen's capital pool.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::error::SievetraderError;
use crate::domain::position::{Fill, Position};
use crate::domain::ranking::rank_earnings_reports;
use crate::domain::screen::{Screen, ScreenKind};
use crate::domain::sizing::{shares_for, PoolProportionalSizing, PositionSizer, SizingContext};
use crate::ports::market_port::MarketDataPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::store_port::StorePort;

/// Account-wide settings the live path reads.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSettings {
    pub max_positions: usize,
    /// When off, opportunities are reported but never filled.
    pub automation_enabled: bool,
    pub trailing_stop_pct: f64,
}

impl Default for AccountSettings {
    fn default() -> Self {
        AccountSettings {
            max_positions: 10,
            automation_enabled: false,
            trailing_stop_pct: 2.0,
        }
    }
}

/// One actionable earnings beat: a symbol, its surprise, and the price
/// it can be bought at today.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub symbol: String,
    pub surprise_pct: f64,
    pub price: f64,
}

/// Find today's opportunities for an earnings-style screen: reports
/// published today that beat estimates at or above the screen's surprise
/// threshold, biggest surprise first, capped, and priced from today's
/// snapshots. Symbols with no price today are dropped.
pub fn identify_opportunities(
    screen: &Screen,
    today: NaiveDate,
    market: &dyn MarketDataPort,
    account: &AccountSettings,
) -> Result<Vec<Opportunity>, SievetraderError> {
    if screen.kind != ScreenKind::Earnings {
        return Err(SievetraderError::ScreenInvalid {
            name: screen.name.clone(),
            reason: format!("kind {} cannot identify earnings opportunities", screen.kind),
        });
    }

    let beats: Vec<_> = market
        .earnings_reports_on(today)?
        .into_iter()
        .filter(|r| r.beat)
        .collect();
    let ranked = rank_earnings_reports(screen, account.max_positions, today, beats);
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let snapshots = market.candidates_for_date(screen, today)?;
    let prices: HashMap<&str, f64> = snapshots
        .iter()
        .filter_map(|s| s.price.map(|p| (s.symbol.as_str(), p)))
        .collect();

    let mut opportunities = Vec::with_capacity(ranked.len());
    for report in ranked {
        match prices.get(report.symbol.as_str()) {
            Some(&price) => opportunities.push(Opportunity {
                symbol: report.symbol,
                surprise_pct: report.surprise_pct,
                price,
            }),
            None => {
                eprintln!("Warning: no price for {} today, dropping", report.symbol);
            }
        }
    }
    Ok(opportunities)
}

/// Fill today's opportunities against the screen's pool and return the
/// fills made.
///
/// The pool is split evenly across today's opportunities. Each fill is
/// persisted atomically with its pool debit; a symbol the pool cannot
/// afford one share of is skipped, and a failed persist skips the symbol
/// without touching the pool. Notification failures only warn.
pub fn execute_opportunities(
    screen: &Screen,
    today: NaiveDate,
    opportunities: &[Opportunity],
    store: &dyn StorePort,
    notify: &dyn NotifyPort,
    account: &AccountSettings,
) -> Result<Vec<Fill>, SievetraderError> {
    if !account.automation_enabled || opportunities.is_empty() {
        return Ok(Vec::new());
    }

    let mut pool = screen
        .pool_capital()
        .ok_or_else(|| SievetraderError::MissingCapitalPool {
            name: screen.name.clone(),
        })?;

    let sizer = PoolProportionalSizing;
    let size = sizer.position_size(&SizingContext {
        available_capital: pool,
        qualified_today: opportunities.len(),
    });

    let mut fills = Vec::new();
    for opportunity in opportunities {
        let quantity = shares_for(size.min(pool), opportunity.price);
        if quantity < 1 {
            continue;
        }

        let position = Position::open(
            opportunity.symbol.clone(),
            quantity,
            opportunity.price,
            today,
            account.trailing_stop_pct,
        )
        .with_screen(screen.id);
        let fill = Fill {
            screen_id: screen.id,
            symbol: opportunity.symbol.clone(),
            quantity,
            price: opportunity.price,
            date: today,
        };

        let pool_after = pool - fill.cost();
        match store.record_fill(&position, &fill, pool_after) {
            Ok(_) => {
                pool = pool_after;
                if let Err(e) = notify.notify_fill(&fill, &screen.name) {
                    eprintln!("Warning: notification for {} failed: {e}", fill.symbol);
                }
                fills.push(fill);
            }
            Err(e) => {
                eprintln!("Warning: could not record fill for {}: {e}", fill.symbol);
            }
        }
    }
    Ok(fills)
}
