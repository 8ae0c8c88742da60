//! Shared types for the odds monitor.
//!
//! These types form the data model used across all modules: raw
//! bookmaker quotes as fetched from the provider, the derived best-price
//! and value-signal records, and the flattened export row.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// One leg of a head-to-head market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    /// All outcomes in reporting order.
    pub const ALL: &'static [Outcome] = &[Outcome::Home, Outcome::Draw, Outcome::Away];

    /// Fixed identifier used in config, logs, and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "home",
            Outcome::Draw => "draw",
            Outcome::Away => "away",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = OddsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Outcome::Home),
            "draw" => Ok(Outcome::Draw),
            "away" => Ok(Outcome::Away),
            other => Err(OddsError::Malformed(format!("unknown outcome: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw quotes
// ---------------------------------------------------------------------------

/// Head-to-head prices quoted by a single bookmaker for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerQuote {
    /// Provider key, e.g. "pinnacle".
    pub key: String,
    /// Display title, used as the bookmaker identifier in results.
    pub title: String,
    pub last_update: Option<DateTime<Utc>>,
    /// Decimal prices by outcome. Empty when the bookmaker had no h2h market.
    pub prices: BTreeMap<Outcome, f64>,
}

impl BookmakerQuote {
    pub fn price(&self, outcome: Outcome) -> Option<f64> {
        self.prices.get(&outcome).copied()
    }

    #[cfg(test)]
    pub fn sample(title: &str, home: f64, draw: Option<f64>, away: f64) -> Self {
        let mut prices = BTreeMap::new();
        prices.insert(Outcome::Home, home);
        if let Some(d) = draw {
            prices.insert(Outcome::Draw, d);
        }
        prices.insert(Outcome::Away, away);
        Self {
            key: title.to_lowercase().replace(' ', "_"),
            title: title.to_string(),
            last_update: None,
            prices,
        }
    }
}

/// A fixture with every bookmaker quote seen in one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub sport_key: String,
    pub sport_title: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub bookmakers: Vec<BookmakerQuote>,
    /// When this snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} [{}] {}",
            self.home_team,
            self.away_team,
            self.sport_title,
            self.commence_time.format("%Y-%m-%d %H:%M"),
        )
    }
}

// ---------------------------------------------------------------------------
// Derived records
// ---------------------------------------------------------------------------

/// Highest price seen for one outcome and who offered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPrice {
    pub price: f64,
    pub bookmaker: String,
}

/// Best price per outcome across all bookmakers of an event.
///
/// An outcome no bookmaker quoted has no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestOddsSet {
    pub prices: BTreeMap<Outcome, BestPrice>,
}

impl BestOddsSet {
    pub fn get(&self, outcome: Outcome) -> Option<&BestPrice> {
        self.prices.get(&outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Probability breakdown for one quoted outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSignal {
    pub outcome: Outcome,
    pub price: f64,
    pub bookmaker: String,
    /// 1 / price.
    pub implied_probability: f64,
    /// Implied probability with the market margin removed.
    pub fair_probability: f64,
    /// Fair probability exceeded the configured threshold.
    pub is_value: bool,
}

/// Market margin and per-outcome fair probabilities for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSignal {
    pub threshold: f64,
    /// Sum of implied probabilities; `None` when no outcome was quoted.
    pub total_implied: Option<f64>,
    /// Overround as a percentage; `None` when no outcome was quoted.
    pub margin_pct: Option<f64>,
    pub outcomes: Vec<OutcomeSignal>,
}

impl ValueSignal {
    /// Signal for an event with no usable prices.
    pub fn empty(threshold: f64) -> Self {
        Self {
            threshold,
            total_implied: None,
            margin_pct: None,
            outcomes: Vec::new(),
        }
    }

    pub fn get(&self, outcome: Outcome) -> Option<&OutcomeSignal> {
        self.outcomes.iter().find(|o| o.outcome == outcome)
    }

    /// Outcomes flagged as value bets.
    pub fn value_bets(&self) -> impl Iterator<Item = &OutcomeSignal> {
        self.outcomes.iter().filter(|o| o.is_value)
    }

    pub fn has_value(&self) -> bool {
        self.outcomes.iter().any(|o| o.is_value)
    }
}

/// An event with its derived best prices and value signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub event: Event,
    pub best: BestOddsSet,
    pub signal: ValueSignal,
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// One persisted row: an event snapshot as quoted by a single bookmaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub timestamp: DateTime<Utc>,
    pub sport_key: String,
    pub sport_title: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub bookmaker: String,
    pub home_odd: Option<f64>,
    pub draw_odd: Option<f64>,
    pub away_odd: Option<f64>,
}

impl ExportRow {
    pub const HEADER: &'static str = "timestamp,sport_key,sport_title,home_team,away_team,\
commence_time,bookmaker,home_odd,draw_odd,away_odd";

    pub fn new(event: &Event, quote: &BookmakerQuote) -> Self {
        Self {
            timestamp: event.fetched_at,
            sport_key: event.sport_key.clone(),
            sport_title: event.sport_title.clone(),
            home_team: event.home_team.clone(),
            away_team: event.away_team.clone(),
            commence_time: event.commence_time,
            bookmaker: quote.title.clone(),
            home_odd: quote.price(Outcome::Home),
            draw_odd: quote.price(Outcome::Draw),
            away_odd: quote.price(Outcome::Away),
        }
    }

    /// Render as one CSV record (no trailing newline).
    pub fn to_csv_record(&self) -> String {
        let price = |p: Option<f64>| p.map(|v| v.to_string()).unwrap_or_default();
        [
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            csv_field(&self.sport_key),
            csv_field(&self.sport_title),
            csv_field(&self.home_team),
            csv_field(&self.away_team),
            self.commence_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            csv_field(&self.bookmaker),
            price(self.home_odd),
            price(self.draw_odd),
            price(self.away_odd),
        ]
        .join(",")
    }
}

/// Quote a CSV field if it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Provider responses
// ---------------------------------------------------------------------------

/// Entry from the provider's sports catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportInfo {
    pub key: String,
    #[serde(default)]
    pub group: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub has_outrights: bool,
}

/// Request-quota counters reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub remaining: Option<u64>,
    pub used: Option<u64>,
}

impl fmt::Display for QuotaUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "N/A".into());
        write!(f, "{} used, {} remaining", show(self.used), show(self.remaining))
    }
}

/// Everything one odds request returned for a sport.
#[derive(Debug, Clone, PartialEq)]
pub struct SportOdds {
    pub sport_key: String,
    pub events: Vec<Event>,
    pub quota: QuotaUsage,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum OddsError {
    #[error("Transport error ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Provider returned {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
