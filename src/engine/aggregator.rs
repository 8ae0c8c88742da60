//! Best-price selection across bookmakers.
//!
//! For each head-to-head outcome, keeps the highest decimal price quoted
//! by any bookmaker along with the bookmaker that offered it.

use tracing::trace;

use crate::types::{BestOddsSet, BestPrice, BookmakerQuote, Outcome};

/// Select the best (highest) price per outcome.
///
/// Ties keep the first bookmaker seen in `quotes` order. Prices that are
/// not positive finite numbers are ignored, as are bookmakers with an
/// empty market.
pub fn compute_best_odds(quotes: &[BookmakerQuote]) -> BestOddsSet {
    let mut best = BestOddsSet::default();

    for quote in quotes {
        if quote.prices.is_empty() {
            trace!(bookmaker = %quote.title, "No h2h market, skipping");
            continue;
        }

        for outcome in Outcome::ALL {
            let Some(price) = quote.price(*outcome) else {
                continue;
            };
            if !price.is_finite() || price <= 0.0 {
                continue;
            }

            let improves = best
                .prices
                .get(outcome)
                .map_or(true, |current| price > current.price);

            if improves {
                best.prices.insert(
                    *outcome,
                    BestPrice {
                        price,
                        bookmaker: quote.title.clone(),
                    },
                );
            }
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
