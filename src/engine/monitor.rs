//! Scheduled monitoring loop.
//!
//! Each iteration fetches every configured sport in order, enriches the
//! events, reports them along with their price movement since the last
//! snapshot, and appends them to the history. The full
//! history is exported on checkpoint iterations and once more when the
//! loop ends, whether it ran to completion or was cancelled.
//!
//! Waiting between iterations goes through the `Scheduler` trait so tests
//! can run the loop without real delays.

use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::processor::EventProcessor;
use super::trend::{self, EventTrend};
use crate::provider::QuotesProvider;
use crate::report::Reporter;
use crate::storage::{Exporter, HistoryStore};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Fixed parameters of a monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Sport keys, fetched in this order every iteration.
    pub sports: Vec<String>,
    /// Wait between the end of one iteration and the start of the next.
    pub interval: Duration,
    pub iterations: u32,
    /// Export on every iteration index divisible by this (0-based).
    pub checkpoint_period: u32,
}

impl MonitorConfig {
    /// Whether the given 0-based iteration ends with a checkpoint.
    pub fn is_checkpoint(&self, iteration: u32) -> bool {
        iteration % self.checkpoint_period.max(1) == 0
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Suspends the loop between iterations.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, period: Duration);
}

/// Real-time scheduler backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

// ---------------------------------------------------------------------------
// Loop state
// ---------------------------------------------------------------------------

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Fetching { iteration: u32, sport: usize },
    Processing,
    Reporting,
    Checkpoint,
    Sleeping,
    Completed { cancelled: bool },
}

/// Outcome of a monitoring run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub iterations_completed: u32,
    /// Checkpoints reached, including ones skipped for empty history.
    pub checkpoints: u32,
    pub checkpoints_written: u32,
    /// Event snapshots in history at the end of the run.
    pub history_events: usize,
    pub cancelled: bool,
}

/// Collaborators the loop drives.
pub struct MonitorDeps<'a> {
    pub provider: &'a dyn QuotesProvider,
    pub reporter: &'a dyn Reporter,
    pub exporter: &'a mut dyn Exporter,
    pub scheduler: &'a dyn Scheduler,
}

// ---------------------------------------------------------------------------
// Monitoring loop
// ---------------------------------------------------------------------------

/// Drives fetch → process → report → checkpoint over a fixed number of
/// iterations and owns the accumulated history.
pub struct MonitoringLoop {
    config: MonitorConfig,
    processor: EventProcessor,
    history: HistoryStore,
    state: LoopState,
}

impl MonitoringLoop {
    pub fn new(config: MonitorConfig, processor: EventProcessor) -> Self {
        Self {
            config,
            processor,
            history: HistoryStore::new(),
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Give up the loop and keep its history.
    pub fn into_history(self) -> HistoryStore {
        self.history
    }

    fn set_state(&mut self, state: LoopState) {
        debug!(from = ?self.state, to = ?state, "Loop state");
        self.state = state;
    }

    /// Run all iterations, or until `shutdown` resolves.
    ///
    /// A final checkpoint is always attempted before returning.
    pub async fn run<F>(&mut self, deps: MonitorDeps<'_>, shutdown: F) -> MonitorSummary
    where
        F: Future<Output = ()>,
    {
        let MonitorDeps {
            provider,
            reporter,
            exporter,
            scheduler,
        } = deps;
        tokio::pin!(shutdown);

        let total = self.config.iterations;
        let interval = self.config.interval;
        let mut summary = MonitorSummary::default();

        info!(
            sports = ?self.config.sports,
            interval_secs = interval.as_secs(),
            iterations = total,
            checkpoint_period = self.config.checkpoint_period,
            "Monitoring started"
        );

        for iteration in 0..total {
            reporter.iteration_started(iteration + 1, total);

            let added = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                added = self.run_iteration(iteration, provider, reporter) => Some(added),
            };
            let Some(added) = added else {
                summary.cancelled = true;
                break;
            };
            summary.iterations_completed += 1;
            info!(
                iteration = iteration + 1,
                added,
                history = self.history.len(),
                "Iteration complete"
            );

            if self.config.is_checkpoint(iteration) {
                self.checkpoint(exporter, &mut summary);
            }

            if iteration + 1 < total {
                self.set_state(LoopState::Sleeping);
                let next = chrono::Duration::from_std(interval)
                    .ok()
                    .and_then(|wait| Utc::now().checked_add_signed(wait));
                match next {
                    Some(at) => reporter.next_check(at),
                    None => warn!(
                        interval_secs = interval.as_secs(),
                        "Next check time out of range"
                    ),
                }

                let interrupted = tokio::select! {
                    biased;
                    _ = &mut shutdown => true,
                    _ = scheduler.sleep(interval) => false,
                };
                if interrupted {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        if summary.cancelled {
            warn!(
                completed = summary.iterations_completed,
                iterations = total,
                "Monitoring cancelled, running final checkpoint"
            );
        }

        self.checkpoint(exporter, &mut summary);
        summary.history_events = self.history.len();
        self.set_state(LoopState::Completed {
            cancelled: summary.cancelled,
        });

        info!(
            iterations = summary.iterations_completed,
            checkpoints = summary.checkpoints,
            written = summary.checkpoints_written,
            history = summary.history_events,
            cancelled = summary.cancelled,
            "Monitoring finished"
        );
        reporter.finished(&summary);
        summary
    }

    /// Fetch, process, report, and record every sport once.
    /// Returns the number of events appended to history.
    async fn run_iteration(
        &mut self,
        iteration: u32,
        provider: &dyn QuotesProvider,
        reporter: &dyn Reporter,
    ) -> usize {
        let sports = self.config.sports.clone();
        let mut added = 0;

        for (index, sport) in sports.iter().enumerate() {
            self.set_state(LoopState::Fetching {
                iteration,
                sport: index,
            });

            let odds = match provider.fetch_odds(sport).await {
                Ok(odds) => odds,
                Err(e) => {
                    warn!(
                        sport = %sport,
                        iteration = iteration + 1,
                        error = %e,
                        "Fetch failed, sport skipped this cycle"
                    );
                    reporter.sport_failed(sport, &e);
                    continue;
                }
            };

            debug!(
                sport = %odds.sport_key,
                events = odds.events.len(),
                quota = %odds.quota,
                "Odds received"
            );

            self.set_state(LoopState::Processing);
            let enriched = self.processor.process_batch(odds.events);
            let trends: Vec<EventTrend> = enriched
                .iter()
                .filter_map(|current| {
                    let previous = self.history.latest_for(&current.event.id)?;
                    trend::compare(previous, current)
                })
                .collect();

            self.set_state(LoopState::Reporting);
            reporter.sport_processed(sport, &odds.quota, &enriched);
            if !trends.is_empty() {
                reporter.trend(sport, &trends);
            }

            added += enriched.len();
            self.history.append(enriched);
        }

        added
    }

    /// Export the full history. Failures are logged and the history is
    /// kept so a later checkpoint can retry.
    fn checkpoint(&mut self, exporter: &mut dyn Exporter, summary: &mut MonitorSummary) {
        self.set_state(LoopState::Checkpoint);
        summary.checkpoints += 1;

        if self.history.is_empty() {
            info!("No data to save");
            return;
        }

        let rows = self.history.flatten();
        match exporter.export(&rows) {
            Ok(path) => {
                summary.checkpoints_written += 1;
                info!(
                    path = %path.display(),
                    rows = rows.len(),
                    events = self.history.len(),
                    "Checkpoint written"
                );
            }
            Err(e) => {
                error!(error = %e, rows = rows.len(), "Checkpoint failed, history retained");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
