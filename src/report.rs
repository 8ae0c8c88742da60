//! Console reporting.
//!
//! The monitoring loop hands every processed sport to a `Reporter`.
//! `ConsoleReporter` prints a human-readable digest to stdout, separate
//! from the structured `tracing` log stream.

use chrono::{DateTime, Local, Utc};

use crate::engine::monitor::MonitorSummary;
use crate::engine::trend::EventTrend;
use crate::types::{EnrichedEvent, Outcome, QuotaUsage};

/// Receives progress and results from the monitoring loop.
pub trait Reporter: Send + Sync {
    fn iteration_started(&self, iteration: u32, total: u32);

    /// Called once per successfully fetched sport, after processing.
    fn sport_processed(&self, sport_key: &str, quota: &QuotaUsage, events: &[EnrichedEvent]);

    fn sport_failed(&self, sport_key: &str, error: &anyhow::Error);

    /// Price movement of fixtures already seen in an earlier iteration.
    /// Only called when at least one fixture has a previous snapshot.
    fn trend(&self, sport_key: &str, trends: &[EventTrend]);

    /// Called before sleeping with the time of the next iteration.
    fn next_check(&self, at: DateTime<Utc>);

    fn finished(&self, summary: &MonitorSummary);
}

/// Events shown per sport before the rest are summarised.
const DEFAULT_MAX_EVENTS: usize = 6;

/// Prints results to stdout.
pub struct ConsoleReporter {
    max_events: usize,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl ConsoleReporter {
    pub fn new(max_events: usize) -> Self {
        Self { max_events }
    }

    /// Render one enriched event as a multi-line block.
    pub fn format_event(event: &EnrichedEvent) -> String {
        let e = &event.event;
        let mut lines = vec![
            format!("  {} vs {}", e.home_team, e.away_team),
            format!(
                "     {} | {}",
                e.sport_title,
                e.commence_time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            ),
            format!("     Bookmakers analysed: {}", e.bookmakers.len()),
        ];

        if !event.best.is_empty() {
            lines.push("     Best odds:".to_string());
            for outcome in Outcome::ALL {
                if let Some(bp) = event.best.get(*outcome) {
                    lines.push(format!(
                        "       {:<5} {:>6.2} ({})",
                        outcome_label(*outcome),
                        bp.price,
                        bp.bookmaker
                    ));
                }
            }
        }

        if let Some(margin) = event.signal.margin_pct {
            lines.push(format!("     Market margin: {margin:.2}%"));
        }

        let value_bets: Vec<_> = event.signal.value_bets().collect();
        if value_bets.is_empty() {
            lines.push("     Waiting for better opportunities".to_string());
        } else {
            lines.push(format!("     {} VALUE BET(S) IDENTIFIED", value_bets.len()));
            for vb in value_bets {
                lines.push(format!(
                    "       {}: odd {:.2} at {} (fair prob {:.1}%)",
                    outcome_label(vb.outcome),
                    vb.price,
                    vb.bookmaker,
                    vb.fair_probability * 100.0
                ));
            }
        }

        lines.join("\n")
    }

    /// Render the movement of one fixture since its previous snapshot.
    pub fn format_trend(trend: &EventTrend) -> String {
        let mut lines = vec![format!("  {} vs {}", trend.home_team, trend.away_team)];
        if trend.moves.is_empty() {
            lines.push("     No comparable prices".to_string());
        }
        for m in &trend.moves {
            lines.push(format!(
                "     {:<5} {:>6.2} ({} {:.2})",
                outcome_label(m.outcome),
                m.current,
                m.direction(),
                m.change().abs()
            ));
        }
        lines.join("\n")
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Home => "Home",
        Outcome::Draw => "Draw",
        Outcome::Away => "Away",
    }
}

impl Reporter for ConsoleReporter {
    fn iteration_started(&self, iteration: u32, total: u32) {
        println!("\n{}", "#".repeat(80));
        println!("ITERATION {iteration}/{total}  {}", Local::now().format("%d/%m/%Y %H:%M:%S"));
        println!("{}", "#".repeat(80));
    }

    fn sport_processed(&self, sport_key: &str, quota: &QuotaUsage, events: &[EnrichedEvent]) {
        println!("\n{}", "=".repeat(80));
        println!("{sport_key}: {} events | API usage: {quota}", events.len());
        println!("{}", "=".repeat(80));

        for event in events.iter().take(self.max_events) {
            println!("\n{}", Self::format_event(event));
        }
        if events.len() > self.max_events {
            println!("\n  ... and {} more", events.len() - self.max_events);
        }
    }

    fn sport_failed(&self, sport_key: &str, error: &anyhow::Error) {
        println!("\n{sport_key}: no data this cycle ({error})");
    }

    fn trend(&self, sport_key: &str, trends: &[EventTrend]) {
        println!("\n--- Trend analysis: {sport_key} ---");
        for trend in trends.iter().take(self.max_events) {
            println!("{}", Self::format_trend(trend));
        }
    }

    fn next_check(&self, at: DateTime<Utc>) {
        println!("\nNext check: {}", at.with_timezone(&Local).format("%H:%M:%S"));
    }

    fn finished(&self, summary: &MonitorSummary) {
        if summary.cancelled {
            println!("\nMonitoring interrupted by operator.");
        } else {
            println!("\nMONITORING COMPLETE!");
        }
        println!(
            "{} iterations, {} snapshots, {} of {} checkpoints written",
            summary.iterations_completed,
            summary.history_events,
            summary.checkpoints_written,
            summary.checkpoints
        );
    }
}
