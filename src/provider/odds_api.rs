//! The Odds API (v4) integration.
//!
//! API docs: https://the-odds-api.com/liveapi/guides/v4/
//! Base URL: https://api.the-odds-api.com/v4
//! Auth: `apiKey` query parameter.
//! Quota: every response carries `x-requests-remaining` / `x-requests-used`.
//!
//! Only the head-to-head (`h2h`) market is requested. Outcome names in the
//! response are team names (plus "Draw"); they are resolved to fixed
//! `Outcome` identifiers against the event's home and away teams.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use super::QuotesProvider;
use crate::config::ProviderConfig;
use crate::types::{BookmakerQuote, Event, OddsError, Outcome, QuotaUsage, SportInfo, SportOdds};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The only market type requested.
const H2H_MARKET: &str = "h2h";

const HEADER_REMAINING: &str = "x-requests-remaining";
const HEADER_USED: &str = "x-requests-used";

// ---------------------------------------------------------------------------
// API response types (Odds API JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiEvent {
    id: String,
    #[serde(default)]
    sport_title: String,
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    away_team: Option<String>,
    commence_time: DateTime<Utc>,
    #[serde(default)]
    bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
struct ApiBookmaker {
    key: String,
    title: String,
    #[serde(default)]
    last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
struct ApiMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
struct ApiOutcome {
    name: String,
    price: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for The Odds API.
pub struct OddsApiClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    regions: String,
    sports_timeout: Duration,
    odds_timeout: Duration,
}

impl OddsApiClient {
    pub fn new(api_key: SecretString, config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("oddswatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for The Odds API")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            regions: config.regions.clone(),
            sports_timeout: Duration::from_secs(config.sports_timeout_secs),
            odds_timeout: Duration::from_secs(config.odds_timeout_secs),
        })
    }

    /// Issue a GET and return headers and body of a 2xx response.
    ///
    /// The API key never appears in returned errors.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<(HeaderMap, String), OddsError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(endpoint = path, timeout_secs = timeout.as_secs(), "Requesting");

        let resp = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key.expose_secret().as_str())])
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(path, e))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(|e| request_error(path, e))?;

        if !status.is_success() {
            return Err(OddsError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok((headers, body))
    }
}

fn request_error(endpoint: &str, err: reqwest::Error) -> OddsError {
    if err.is_timeout() {
        OddsError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        OddsError::Transport {
            endpoint: endpoint.to_string(),
            message: err.without_url().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response mapping
// ---------------------------------------------------------------------------

/// Map a provider outcome name to a fixed outcome identifier.
///
/// Team names match the event's home/away team (case-insensitive);
/// "Draw"/"Tie" and the literal identifiers are accepted as well.
pub fn resolve_outcome(name: &str, home_team: &str, away_team: &str) -> Option<Outcome> {
    let name = name.trim();
    if !home_team.is_empty() && name.eq_ignore_ascii_case(home_team) {
        return Some(Outcome::Home);
    }
    if !away_team.is_empty() && name.eq_ignore_ascii_case(away_team) {
        return Some(Outcome::Away);
    }
    if name.eq_ignore_ascii_case("tie") {
        return Some(Outcome::Draw);
    }
    name.parse().ok()
}

/// Parse quota counters from response headers. Missing or unparsable
/// values are reported as `None`.
pub fn parse_quota(headers: &HeaderMap) -> QuotaUsage {
    let read = |name: &str| {
        let raw = headers.get(name)?.to_str().ok()?.trim();
        raw.parse::<u64>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        })
    };
    QuotaUsage {
        remaining: read(HEADER_REMAINING),
        used: read(HEADER_USED),
    }
}

/// Parse an odds response body into domain events.
pub fn parse_events(
    body: &str,
    sport_key: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<Event>, OddsError> {
    let raw: Vec<ApiEvent> = serde_json::from_str(body)
        .map_err(|e| OddsError::Malformed(format!("odds for {sport_key}: {e}")))?;
    Ok(raw
        .into_iter()
        .map(|e| to_event(e, sport_key, fetched_at))
        .collect())
}

fn to_event(raw: ApiEvent, sport_key: &str, fetched_at: DateTime<Utc>) -> Event {
    let home_team = raw.home_team.unwrap_or_default();
    let away_team = raw.away_team.unwrap_or_default();

    let bookmakers = raw
        .bookmakers
        .into_iter()
        .map(|b| {
            let mut prices = BTreeMap::new();
            if let Some(market) = b.markets.iter().find(|m| m.key == H2H_MARKET) {
                for o in &market.outcomes {
                    match resolve_outcome(&o.name, &home_team, &away_team) {
                        Some(outcome) => {
                            prices.entry(outcome).or_insert(o.price);
                        }
                        None => debug!(
                            event_id = %raw.id,
                            bookmaker = %b.key,
                            name = %o.name,
                            "Unrecognised h2h outcome name"
                        ),
                    }
                }
            }
            BookmakerQuote {
                key: b.key,
                title: b.title,
                last_update: b.last_update,
                prices,
            }
        })
        .collect();

    Event {
        id: raw.id,
        sport_key: sport_key.to_string(),
        sport_title: raw.sport_title,
        home_team,
        away_team,
        commence_time: raw.commence_time,
        bookmakers,
        fetched_at,
    }
}

// ---------------------------------------------------------------------------
// QuotesProvider trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl QuotesProvider for OddsApiClient {
    async fn list_sports(&self) -> Result<Vec<SportInfo>> {
        let (_, body) = self.get("/sports", &[], self.sports_timeout).await?;
        let sports: Vec<SportInfo> = serde_json::from_str(&body)
            .map_err(|e| OddsError::Malformed(format!("sports catalogue: {e}")))?;
        info!(count = sports.len(), "Sports catalogue fetched");
        Ok(sports)
    }

    async fn fetch_odds(&self, sport_key: &str) -> Result<SportOdds> {
        let path = format!("/sports/{}/odds", urlencoding::encode(sport_key));
        let query = [
            ("regions", self.regions.as_str()),
            ("markets", H2H_MARKET),
            ("oddsFormat", "decimal"),
            ("dateFormat", "iso"),
        ];

        let (headers, body) = self.get(&path, &query, self.odds_timeout).await?;
        let quota = parse_quota(&headers);
        let events = parse_events(&body, sport_key, Utc::now())?;

        info!(
            sport = sport_key,
            events = events.len(),
            used = ?quota.used,
            remaining = ?quota.remaining,
            "Odds fetched"
        );

        Ok(SportOdds {
            sport_key: sport_key.to_string(),
            events,
            quota,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
