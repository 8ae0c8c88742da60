//! Value-bet detection.
//!
//! Converts best prices into implied probabilities, measures the market
//! margin (overround), removes it to get fair probabilities, and flags
//! outcomes whose fair probability exceeds the configured threshold.

use tracing::debug;

use crate::types::{BestOddsSet, Outcome, OutcomeSignal, ValueSignal};

/// Default fair-probability threshold for flagging a value bet.
pub const DEFAULT_VALUE_THRESHOLD: f64 = 0.6;

/// Flags outcomes whose margin-free probability exceeds a threshold.
#[derive(Debug, Clone, Copy)]
pub struct ValueDetector {
    threshold: f64,
}

impl Default for ValueDetector {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_THRESHOLD)
    }
}

impl ValueDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn detect(&self, best: &BestOddsSet) -> ValueSignal {
        compute_signal(best, self.threshold)
    }
}

/// Compute market margin and fair probabilities for a best-odds set.
///
/// Outcomes without a positive price never enter the `1 / price`
/// computation. With no usable price at all, the margin is `None`.
pub fn compute_signal(best: &BestOddsSet, threshold: f64) -> ValueSignal {
    let quoted: Vec<(Outcome, f64, &str, f64)> = Outcome::ALL
        .iter()
        .filter_map(|outcome| {
            let bp = best.get(*outcome)?;
            (bp.price.is_finite() && bp.price > 0.0)
                .then(|| (*outcome, bp.price, bp.bookmaker.as_str(), 1.0 / bp.price))
        })
        .collect();

    if quoted.is_empty() {
        return ValueSignal::empty(threshold);
    }

    let total: f64 = quoted.iter().map(|(_, _, _, implied)| implied).sum();
    let margin_pct = (total - 1.0) * 100.0;

    let outcomes = quoted
        .into_iter()
        .map(|(outcome, price, bookmaker, implied)| {
            let fair = implied / total;
            let is_value = fair > threshold;
            if is_value {
                debug!(
                    outcome = %outcome,
                    price,
                    bookmaker,
                    fair = %format!("{:.1}%", fair * 100.0),
                    "Value bet candidate"
                );
            }
            OutcomeSignal {
                outcome,
                price,
                bookmaker: bookmaker.to_string(),
                implied_probability: implied,
                fair_probability: fair,
                is_value,
            }
        })
        .collect();

    ValueSignal {
        threshold,
        total_implied: Some(total),
        margin_pct: Some(margin_pct),
        outcomes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
