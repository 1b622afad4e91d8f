//! Console notification adapter.

use crate::domain::error::SievetraderError;
use crate::domain::position::Fill;
use crate::ports::notify_port::NotifyPort;
use chrono::NaiveDate;

/// Writes alerts to stderr. Construction can disable it outright, which
/// turns every notification into a no-op instead of forcing callers to
/// branch on whether alerting is configured.
pub struct StderrNotifyAdapter {
    enabled: bool,
}

impl StderrNotifyAdapter {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for StderrNotifyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyPort for StderrNotifyAdapter {
    fn notify_fill(&self, fill: &Fill, screen_name: &str) -> Result<(), SievetraderError> {
        if self.enabled {
            eprintln!(
                "[{}] {}: bought {} {} @ {:.2} (cost {:.2})",
                fill.date,
                screen_name,
                fill.quantity,
                fill.symbol,
                fill.price,
                fill.cost()
            );
        }
        Ok(())
    }

    fn notify_no_opportunities(
        &self,
        screen_name: &str,
        date: NaiveDate,
    ) -> Result<(), SievetraderError> {
        if self.enabled {
            eprintln!("[{date}] {screen_name}: no opportunities today");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fill() -> Fill {
        Fill {
            screen_id: 1,
            symbol: "MSFT".to_string(),
            quantity: 3,
            price: 80.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        }
    }

    #[test]
    fn notifications_succeed() {
        let notifier = StderrNotifyAdapter::new();
        notifier.notify_fill(&sample_fill(), "earnings beat").unwrap();
        notifier
            .notify_no_opportunities("earnings beat", NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .unwrap();
    }

    #[test]
    fn disabled_notifier_is_a_no_op() {
        let notifier = StderrNotifyAdapter::disabled();
        notifier.notify_fill(&sample_fill(), "earnings beat").unwrap();
    }
}
