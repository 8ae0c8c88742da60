//! Price movement between consecutive snapshots of the same fixture.
//!
//! Compares the best price per outcome of the previous snapshot with the
//! current one. Outcomes priced in only one of the two are left out.

use serde::Serialize;
use std::fmt;

use crate::types::{EnrichedEvent, Outcome};

/// Changes smaller than this are treated as no movement.
const PRICE_TOLERANCE: f64 = 1e-9;

/// Which way a best price moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
    Steady,
}

impl Direction {
    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Steady => "→",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arrow())
    }
}

/// Best-price change for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceMove {
    pub outcome: Outcome,
    pub previous: f64,
    pub current: f64,
}

impl PriceMove {
    pub fn change(&self) -> f64 {
        self.current - self.previous
    }

    pub fn direction(&self) -> Direction {
        let change = self.change();
        if change > PRICE_TOLERANCE {
            Direction::Up
        } else if change < -PRICE_TOLERANCE {
            Direction::Down
        } else {
            Direction::Steady
        }
    }
}

/// Movement of one fixture since its previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventTrend {
    pub event_id: String,
    pub home_team: String,
    pub away_team: String,
    /// In `Outcome::ALL` order.
    pub moves: Vec<PriceMove>,
}

impl EventTrend {
    pub fn get(&self, outcome: Outcome) -> Option<&PriceMove> {
        self.moves.iter().find(|m| m.outcome == outcome)
    }
}

/// Compare two snapshots of the same fixture.
///
/// Returns `None` when the snapshots belong to different events.
pub fn compare(previous: &EnrichedEvent, current: &EnrichedEvent) -> Option<EventTrend> {
    if previous.event.id != current.event.id {
        return None;
    }

    let moves = Outcome::ALL
        .iter()
        .filter_map(|outcome| {
            let before = previous.best.get(*outcome)?;
            let now = current.best.get(*outcome)?;
            Some(PriceMove {
                outcome: *outcome,
                previous: before.price,
                current: now.price,
            })
        })
        .collect();

    Some(EventTrend {
        event_id: current.event.id.clone(),
        home_team: current.event.home_team.clone(),
        away_team: current.event.away_team.clone(),
        moves,
    })
}
