//! Opportunity ranking: order filter survivors and cap the outgoing lists.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::domain::score::ScoredCandidate;
use crate::domain::screen::{Screen, WatchlistItem};
use crate::domain::snapshot::EarningsReport;

/// Most candidates kept after scoring, before the watchlist cut.
pub const MAX_CANDIDATE_POOL: usize = 200;
/// Symbols persisted per screen per refresh.
pub const WATCHLIST_SIZE: usize = 50;

fn by_score_desc(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}

/// Rank value-style survivors by composite score, best first, keeping at
/// most [`MAX_CANDIDATE_POOL`]. Ties keep their incoming order, which the
/// data source pre-sorts by data quality then market cap.
pub fn rank_value_candidates(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(by_score_desc);
    candidates.truncate(MAX_CANDIDATE_POOL);
    candidates
}

/// Cut a ranked pool down to the persisted watchlist: the top
/// [`WATCHLIST_SIZE`] symbols with their scores.
pub fn take_watchlist(screen_id: i64, ranked: &[ScoredCandidate]) -> Vec<WatchlistItem> {
    ranked
        .iter()
        .take(WATCHLIST_SIZE)
        .map(|c| WatchlistItem {
            screen_id,
            symbol: c.snapshot.symbol.clone(),
            score: c.score,
        })
        .collect()
}

/// Rank one day's earnings reports for a screen: reports published on
/// `today` at or above the screen's surprise threshold, biggest surprise
/// first, capped at the screen's per-day limit or the account-wide
/// position cap, whichever is smaller.
pub fn rank_earnings_reports(
    screen: &Screen,
    account_max_positions: usize,
    today: NaiveDate,
    reports: Vec<EarningsReport>,
) -> Vec<EarningsReport> {
    let cap = (screen.max_positions_per_day as usize).min(account_max_positions);
    let mut qualifying: Vec<EarningsReport> = reports
        .into_iter()
        .filter(|r| r.report_date == today && r.surprise_pct >= screen.min_surprise_pct)
        .collect();
    qualifying.sort_by(|a, b| {
        b.surprise_pct
            .partial_cmp(&a.surprise_pct)
            .unwrap_or(Ordering::Equal)
    });
    qualifying.truncate(cap);
    qualifying
}
