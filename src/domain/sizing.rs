//! Position sizing: how much capital a new position is offered.

use crate::domain::screen::Screen;

/// Inputs to one day's sizing decision.
#[derive(Debug, Clone, Copy)]
pub struct SizingContext {
    /// Capital available to deploy: account cash, or a screen's pool.
    pub available_capital: f64,
    /// Opportunities that qualified today, before any slot cap.
    pub qualified_today: usize,
}

/// Strategy seam: turns a day's context into a per-position dollar size.
pub trait PositionSizer {
    fn position_size(&self, ctx: &SizingContext) -> f64;
}

/// Equal slots against a fixed account-level position cap.
#[derive(Debug, Clone, Copy)]
pub struct FixedSlotSizing {
    pub max_positions: usize,
}

impl PositionSizer for FixedSlotSizing {
    fn position_size(&self, ctx: &SizingContext) -> f64 {
        if self.max_positions == 0 {
            return 0.0;
        }
        ctx.available_capital / self.max_positions as f64
    }
}

/// Divide the pool across the opportunities that actually fired, so thin
/// signal days deploy larger per-position sizes instead of stranding
/// capital in unused slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolProportionalSizing;

impl PositionSizer for PoolProportionalSizing {
    fn position_size(&self, ctx: &SizingContext) -> f64 {
        ctx.available_capital / ctx.qualified_today.max(1) as f64
    }
}

/// Pick the sizer for a screen: pooled screens split their pool across
/// the day's signals, the rest use fixed account slots.
pub fn select_sizer(screen: &Screen, max_positions: usize) -> Box<dyn PositionSizer> {
    if screen.has_pool() {
        Box::new(PoolProportionalSizing)
    } else {
        Box::new(FixedSlotSizing { max_positions })
    }
}

/// Whole shares affordable at `price` with the offered size. Zero means
/// the symbol is skipped.
pub fn shares_for(position_size: f64, price: f64) -> i64 {
    if price <= 0.0 || position_size <= 0.0 {
        return 0;
    }
    (position_size / price).floor() as i64
}
