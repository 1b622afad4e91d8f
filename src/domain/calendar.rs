//! Trading-day calendar. The simulation steps weekdays only; exchange
//! holidays are treated as ordinary days with no data.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// All weekdays in `[start, end]`, ascending. Empty when `start > end`.
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        if is_trading_day(current) {
            days.push(current);
        }
        current += Duration::days(1);
    }
    days
}
