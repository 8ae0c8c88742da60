//! Event enrichment: best prices plus value signal for each fetched event.

use tracing::debug;

use super::aggregator::compute_best_odds;
use super::signal::ValueDetector;
use crate::types::{EnrichedEvent, Event};

/// Applies best-price selection and value detection to fetched events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventProcessor {
    detector: ValueDetector,
}

impl EventProcessor {
    pub fn new(detector: ValueDetector) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &ValueDetector {
        &self.detector
    }

    /// Enrich a single event. Metadata is carried through unchanged.
    pub fn process(&self, event: Event) -> EnrichedEvent {
        let best = compute_best_odds(&event.bookmakers);
        let signal = self.detector.detect(&best);
        EnrichedEvent { event, best, signal }
    }

    /// Enrich every event of one sport fetch, preserving order.
    pub fn process_batch(&self, events: Vec<Event>) -> Vec<EnrichedEvent> {
        let enriched: Vec<EnrichedEvent> = events.into_iter().map(|e| self.process(e)).collect();
        debug!(
            events = enriched.len(),
            value_bets = enriched.iter().filter(|e| e.signal.has_value()).count(),
            "Batch processed"
        );
        enriched
    }
}
