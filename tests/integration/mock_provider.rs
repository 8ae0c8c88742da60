//! Mock quotes provider for integration testing.
//!
//! Provides a deterministic `QuotesProvider` implementation that returns
//! known fixtures per sport, records every request, and can be told to
//! fail specific sports or move soccer prices between requests.
//! Everything stays in memory.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use oddswatch::provider::QuotesProvider;
use oddswatch::types::*;

/// A mock odds provider for deterministic testing.
#[derive(Clone, Default)]
pub struct MockProvider {
    failing: Arc<Mutex<HashSet<String>>>,
    requests: Arc<Mutex<Vec<String>>>,
    /// Remaining quota, decremented per odds request.
    quota: Arc<Mutex<u64>>,
    /// Soccer price shift per repeated request of the same sport.
    drift: Arc<Mutex<f64>>,
}

impl MockProvider {
    pub fn new(quota: u64) -> Self {
        Self {
            quota: Arc::new(Mutex::new(quota)),
            ..Default::default()
        }
    }

    /// Make every request for `sport_key` fail until cleared.
    pub fn fail_sport(&self, sport_key: &str) {
        self.failing.lock().unwrap().insert(sport_key.to_string());
    }

    /// From the second request of a sport on, lower every soccer home
    /// price and raise every soccer away price by `step` per request.
    pub fn set_drift(&self, step: f64) {
        *self.drift.lock().unwrap() = step;
    }

    /// Sport keys requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn quote(title: &str, home: f64, draw: Option<f64>, away: f64) -> BookmakerQuote {
        let mut prices = BTreeMap::new();
        prices.insert(Outcome::Home, home);
        if let Some(d) = draw {
            prices.insert(Outcome::Draw, d);
        }
        prices.insert(Outcome::Away, away);
        BookmakerQuote {
            key: title.to_lowercase(),
            title: title.to_string(),
            last_update: Some(Utc::now()),
            prices,
        }
    }

    /// Two soccer fixtures (one with a heavy favourite) or one NBA game.
    fn fixtures(sport_key: &str, shift: f64) -> Vec<Event> {
        let now = Utc::now();
        let event = |id: &str, home: &str, away: &str, bookmakers: Vec<BookmakerQuote>| Event {
            id: id.to_string(),
            sport_key: sport_key.to_string(),
            sport_title: sport_key.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            commence_time: now + Duration::hours(6),
            bookmakers,
            fetched_at: now,
        };

        if sport_key.starts_with("basketball") {
            return vec![event(
                "nba-1",
                "Boston Celtics",
                "New York Knicks",
                vec![
                    Self::quote("FanDuel", 1.65, None, 2.30),
                    Self::quote("DraftKings", 1.70, None, 2.20),
                ],
            )];
        }

        let quote = |title: &str, home: f64, draw: f64, away: f64| {
            Self::quote(title, home - shift, Some(draw), away + shift)
        };
        vec![
            event(
                "soc-1",
                "Flamengo",
                "Palmeiras",
                vec![
                    quote("Pinnacle", 2.10, 3.30, 3.55),
                    quote("Betfair", 2.05, 3.45, 3.60),
                    quote("Unibet", 2.15, 3.20, 3.40),
                ],
            ),
            event(
                "soc-2",
                "Botafogo",
                "Cuiabá, MT",
                vec![
                    quote("Pinnacle", 1.20, 9.0, 15.0),
                    quote("Betfair", 1.18, 10.0, 14.0),
                ],
            ),
        ]
    }
}

#[async_trait]
impl QuotesProvider for MockProvider {
    async fn list_sports(&self) -> Result<Vec<SportInfo>> {
        Ok(["soccer_brazil_campeonato", "basketball_nba"]
            .iter()
            .map(|key| SportInfo {
                key: key.to_string(),
                group: String::new(),
                title: key.to_string(),
                description: String::new(),
                active: true,
                has_outrights: false,
            })
            .collect())
    }

    async fn fetch_odds(&self, sport_key: &str) -> Result<SportOdds> {
        let round = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(sport_key.to_string());
            requests.iter().filter(|k| k.as_str() == sport_key).count() - 1
        };

        if self.failing.lock().unwrap().contains(sport_key) {
            return Err(anyhow!("mock transport failure for {sport_key}"));
        }

        let mut quota = self.quota.lock().unwrap();
        *quota = quota.saturating_sub(1);

        Ok(SportOdds {
            sport_key: sport_key.to_string(),
            events: Self::fixtures(sport_key, *self.drift.lock().unwrap() * round as f64),
            quota: QuotaUsage {
                remaining: Some(*quota),
                used: None,
            },
        })
    }
}
