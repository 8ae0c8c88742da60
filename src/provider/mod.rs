//! Quotes provider integrations.
//!
//! Defines the `QuotesProvider` trait the monitoring loop fetches through,
//! and the HTTP implementation against The Odds API.

pub mod odds_api;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{SportInfo, SportOdds};

/// Abstraction over a sports-odds data source.
///
/// Implementors return events already mapped to the domain model, with
/// head-to-head prices keyed by `Outcome`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotesProvider: Send + Sync {
    /// Fetch the catalogue of sports the provider covers.
    async fn list_sports(&self) -> Result<Vec<SportInfo>>;

    /// Fetch current head-to-head odds for every event of a sport.
    async fn fetch_odds(&self, sport_key: &str) -> Result<SportOdds>;
}

/// Check the configured sport keys against the provider's catalogue.
///
/// Returns the keys the catalogue does not list. Only informs the
/// operator; unknown keys are still fetched and fail on their own.
pub async fn verify_sports(
    provider: &dyn QuotesProvider,
    sports: &[String],
) -> Result<Vec<String>> {
    let catalogue = provider.list_sports().await?;
    let missing: Vec<String> = sports
        .iter()
        .filter(|key| !catalogue.iter().any(|s| &s.key == *key))
        .cloned()
        .collect();

    for key in &missing {
        tracing::warn!(sport = %key, "Sport key not in provider catalogue");
    }
    tracing::info!(
        available = catalogue.len(),
        configured = sports.len(),
        missing = missing.len(),
        "Provider connectivity check passed"
    );
    Ok(missing)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
