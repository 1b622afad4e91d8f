//! Screen-scoped capital ledger with a rolling 90-day window.

use chrono::NaiveDate;

/// Entries kept per screen; older days fall off.
pub const LEDGER_WINDOW: usize = 90;

/// One (screen, day) row: the pool balance after the day's activity and
/// the day's accumulated P&L.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub capital: f64,
    pub pnl_delta: f64,
}

/// Rolling capital history for one screen.
///
/// Posting to an existing date adds to that day's P&L and overwrites its
/// capital; posting to a new date appends. Either way the window keeps
/// only the newest [`LEDGER_WINDOW`] entries, oldest dropped first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapitalLedger {
    entries: Vec<LedgerEntry>,
}

impl CapitalLedger {
    pub fn new() -> Self {
        CapitalLedger::default()
    }

    /// Rebuild a ledger from stored rows, restoring date order and the
    /// window bound.
    pub fn from_entries(mut entries: Vec<LedgerEntry>) -> Self {
        entries.sort_by_key(|e| e.date);
        if entries.len() > LEDGER_WINDOW {
            let excess = entries.len() - LEDGER_WINDOW;
            entries.drain(..excess);
        }
        CapitalLedger { entries }
    }

    /// Record one day's state: `capital` replaces the day's balance,
    /// `pnl_delta` accumulates into it.
    pub fn post(&mut self, date: NaiveDate, capital: f64, pnl_delta: f64) {
        match self.entries.iter_mut().find(|e| e.date == date) {
            Some(entry) => {
                entry.capital = capital;
                entry.pnl_delta += pnl_delta;
            }
            None => {
                self.entries.push(LedgerEntry {
                    date,
                    capital,
                    pnl_delta,
                });
                self.entries.sort_by_key(|e| e.date);
            }
        }
        if self.entries.len() > LEDGER_WINDOW {
            let excess = self.entries.len() - LEDGER_WINDOW;
            self.entries.drain(..excess);
        }
    }

    /// Entries in ascending date order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn post_appends_new_dates_in_order() {
        let mut ledger = CapitalLedger::new();
        ledger.post(day(2), 900.0, -100.0);
        ledger.post(day(0), 1000.0, 0.0);
        ledger.post(day(1), 950.0, -50.0);

        let dates: Vec<NaiveDate> = ledger.entries().iter().map(|e| e.date).collect();
        assert_eq!(dates, [day(0), day(1), day(2)]);
        assert_eq!(ledger.latest().unwrap().date, day(2));
    }

    #[test]
    fn post_same_day_accumulates_pnl_and_overwrites_capital() {
        let mut ledger = CapitalLedger::new();
        ledger.post(day(0), 980.0, -20.0);
        ledger.post(day(0), 1010.0, 30.0);

        assert_eq!(ledger.len(), 1);
        let entry = ledger.latest().unwrap();
        assert!((entry.capital - 1010.0).abs() < f64::EPSILON);
        assert!((entry.pnl_delta - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn window_drops_oldest_entries() {
        let mut ledger = CapitalLedger::new();
        for i in 0..(LEDGER_WINDOW as i64 + 10) {
            ledger.post(day(i), 1000.0 + i as f64, 0.0);
        }

        assert_eq!(ledger.len(), LEDGER_WINDOW);
        assert_eq!(ledger.entries()[0].date, day(10));
        assert_eq!(ledger.latest().unwrap().date, day(LEDGER_WINDOW as i64 + 9));
    }

    #[test]
    fn from_entries_restores_order_and_window() {
        let raw: Vec<LedgerEntry> = (0..(LEDGER_WINDOW as i64 + 5))
            .rev()
            .map(|i| LedgerEntry {
                date: day(i),
                capital: 1000.0,
                pnl_delta: 0.0,
            })
            .collect();

        let ledger = CapitalLedger::from_entries(raw);
        assert_eq!(ledger.len(), LEDGER_WINDOW);
        assert_eq!(ledger.entries()[0].date, day(5));
    }
}
