//! Criteria evaluation: range filters plus composite value scoring.
//!
//! Filter semantics: a stock fails only on a present, out-of-range value.
//! Missing metrics pass, so thin vendor data never empties a screen.

use crate::domain::screen::{MetricFilter, Screen, ScreenKind};
use crate::domain::snapshot::StockSnapshot;

/// Lowest possible composite or sub-score.
pub const SCORE_FLOOR: f64 = 0.0;
/// Highest possible composite or sub-score.
pub const SCORE_CEIL: f64 = 10.0;

/// Sub-score assigned when a metric is absent or unusable.
const NEUTRAL_SUBSCORE: f64 = 5.0;

/// A candidate that survived a screen's filters, carrying its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub snapshot: StockSnapshot,
    pub score: f64,
}

/// Whether a snapshot passes every filter of a screen.
pub fn passes_filters(filters: &[MetricFilter], snapshot: &StockSnapshot) -> bool {
    filters.iter().all(|f| f.passes(snapshot.metric(f.metric)))
}

fn clamp_score(v: f64) -> f64 {
    v.clamp(SCORE_FLOOR, SCORE_CEIL)
}

/// Cheapness by earnings: `10 - pe/3`, clamped. Neutral when PE is
/// absent or non-positive (negative earnings carry no cheapness signal).
pub fn pe_score(pe: Option<f64>) -> f64 {
    match pe {
        Some(pe) if pe > 0.0 => clamp_score(10.0 - pe / 3.0),
        _ => NEUTRAL_SUBSCORE,
    }
}

/// Cheapness by sales: `10 - ps*3`, clamped. Neutral when PS is absent
/// or non-positive.
pub fn ps_score(ps: Option<f64>) -> f64 {
    match ps {
        Some(ps) if ps > 0.0 => clamp_score(10.0 - ps * 3.0),
        _ => NEUTRAL_SUBSCORE,
    }
}

/// Cheapness by book value: `10 - pb*3`, clamped. Neutral when PB is
/// absent or non-positive.
pub fn pb_score(pb: Option<f64>) -> f64 {
    match pb {
        Some(pb) if pb > 0.0 => clamp_score(10.0 - pb * 3.0),
        _ => NEUTRAL_SUBSCORE,
    }
}

/// Trend strength: `5 + momentum/4`, clamped. Neutral when absent, so
/// +20% momentum saturates at 10 and -20% at 0.
pub fn momentum_score(momentum_3m: Option<f64>) -> f64 {
    match momentum_3m {
        Some(m) => clamp_score(5.0 + m / 4.0),
        None => NEUTRAL_SUBSCORE,
    }
}

/// Composite 0-10 value score: the mean of the four sub-scores.
pub fn composite_score(snapshot: &StockSnapshot) -> f64 {
    let subs = [
        pe_score(snapshot.pe_ratio),
        ps_score(snapshot.ps_ratio),
        pb_score(snapshot.pb_ratio),
        momentum_score(snapshot.momentum_3m),
    ];
    subs.iter().sum::<f64>() / subs.len() as f64
}

/// Apply one screen to a day's candidates: filters first, then scoring.
///
/// Earnings-style screens keep the filter pass but skip fundamental
/// scoring; their ranking comes from the surprise feed instead.
pub fn evaluate_candidates(screen: &Screen, candidates: &[StockSnapshot]) -> Vec<ScoredCandidate> {
    candidates
        .iter()
        .filter(|snap| passes_filters(&screen.filters, snap))
        .map(|snap| ScoredCandidate {
            snapshot: snap.clone(),
            score: match screen.kind {
                ScreenKind::Value => composite_score(snap),
                ScreenKind::Earnings => 0.0,
            },
        })
        .collect()
}
