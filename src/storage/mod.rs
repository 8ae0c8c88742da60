//! Persistence layer.
//!
//! Holds the in-memory history of every enriched event seen during the
//! run and flattens it into bookmaker-grain export rows. The `Exporter`
//! trait is the seam to durable storage; `csv::CsvExporter` writes each
//! checkpoint to a new timestamped file.

pub mod csv;

use anyhow::Result;
use std::path::PathBuf;

use crate::types::{EnrichedEvent, ExportRow};

/// Destination for history checkpoints.
///
/// Each call receives the complete history flattened to rows and
/// returns the location of the artifact it produced.
pub trait Exporter: Send {
    fn export(&mut self, rows: &[ExportRow]) -> Result<PathBuf>;
}

/// Append-only ledger of enriched events across all cycles.
///
/// Repeated snapshots of the same fixture are kept as separate entries;
/// together they form the time series.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    events: Vec<EnrichedEvent>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = EnrichedEvent>,
    {
        self.events.extend(events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of event snapshots recorded.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[EnrichedEvent] {
        &self.events
    }

    /// Most recent snapshot recorded for the given event id.
    pub fn latest_for(&self, event_id: &str) -> Option<&EnrichedEvent> {
        self.events.iter().rev().find(|e| e.event.id == event_id)
    }

    /// One row per (event, bookmaker) pair, in recording order.
    pub fn flatten(&self) -> Vec<ExportRow> {
        self.events
            .iter()
            .flat_map(|e| {
                e.event
                    .bookmakers
                    .iter()
                    .map(move |quote| ExportRow::new(&e.event, quote))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
