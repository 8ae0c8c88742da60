//! End-to-end monitoring runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use oddswatch::engine::monitor::{
    MonitorConfig, MonitorDeps, MonitorSummary, MonitoringLoop, Scheduler, TokioScheduler,
};
use oddswatch::engine::processor::EventProcessor;
use oddswatch::engine::signal::ValueDetector;
use oddswatch::engine::trend::{Direction, EventTrend};
use oddswatch::provider::verify_sports;
use oddswatch::report::{ConsoleReporter, Reporter};
use oddswatch::storage::csv::CsvExporter;
use oddswatch::types::{EnrichedEvent, ExportRow, Outcome, QuotaUsage};

use crate::mock_provider::MockProvider;

const SPORTS: [&str; 4] = [
    "soccer_brazil_campeonato",
    "soccer_england_pl",
    "soccer_uefa_champs_league",
    "basketball_nba",
];

/// Rows one iteration produces: three soccer sports with 3 + 2
/// bookmakers each, plus one NBA game with 2.
const ROWS_PER_ITERATION: usize = 3 * 5 + 2;

struct InstantScheduler;

#[async_trait]
impl Scheduler for InstantScheduler {
    async fn sleep(&self, _period: Duration) {}
}

/// Keeps what the loop hands to the reporter.
#[derive(Default)]
struct CapturingReporter {
    quotas: Mutex<Vec<(String, QuotaUsage)>>,
    trends: Mutex<Vec<EventTrend>>,
}

impl Reporter for CapturingReporter {
    fn iteration_started(&self, _iteration: u32, _total: u32) {}

    fn sport_processed(&self, sport_key: &str, quota: &QuotaUsage, _events: &[EnrichedEvent]) {
        self.quotas
            .lock()
            .unwrap()
            .push((sport_key.to_string(), *quota));
    }

    fn sport_failed(&self, _sport_key: &str, _error: &anyhow::Error) {}

    fn trend(&self, _sport_key: &str, trends: &[EventTrend]) {
        self.trends.lock().unwrap().extend_from_slice(trends);
    }

    fn next_check(&self, _at: DateTime<Utc>) {}

    fn finished(&self, _summary: &MonitorSummary) {}
}

fn temp_dir() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("oddswatch_it_{}", uuid::Uuid::new_v4()));
    p
}

fn config(iterations: u32) -> MonitorConfig {
    MonitorConfig {
        sports: SPORTS.iter().map(|s| s.to_string()).collect(),
        interval: Duration::from_secs(15 * 60),
        iterations,
        checkpoint_period: 3,
    }
}

fn csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    files.sort();
    files
}

fn data_rows(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count() - 1
}

#[tokio::test]
async fn test_full_run_writes_four_cumulative_checkpoints() {
    let dir = temp_dir();
    let provider = MockProvider::new(500);
    let mut exporter = CsvExporter::new(&dir, "odds_data");
    let mut monitor = MonitoringLoop::new(config(8), EventProcessor::default());

    let summary = monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &ConsoleReporter::default(),
                exporter: &mut exporter,
                scheduler: &InstantScheduler,
            },
            std::future::pending::<()>(),
        )
        .await;

    assert_eq!(summary.iterations_completed, 8);
    assert_eq!(summary.checkpoints_written, 4);
    assert_eq!(provider.requests().len(), 32);
    assert_eq!(&provider.requests()[..4], &SPORTS);

    let files = csv_files(&dir);
    assert_eq!(files.len(), 4);
    let counts: Vec<usize> = files.iter().map(|f| data_rows(f)).collect();
    assert_eq!(counts, [1, 4, 7, 8].map(|iterations| iterations * ROWS_PER_ITERATION));

    let last = std::fs::read_to_string(files.last().unwrap()).unwrap();
    assert_eq!(last.lines().next().unwrap(), ExportRow::HEADER);
    assert!(last.contains("\"Cuiabá, MT\""));
    assert!(last.contains("Boston Celtics,New York Knicks"));
    // NBA has no draw: the draw cell stays empty.
    assert!(last.contains("FanDuel,1.65,,2.3"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_value_bets_survive_into_history() {
    let dir = temp_dir();
    let provider = MockProvider::new(100);
    let mut exporter = CsvExporter::new(&dir, "odds_data");
    let mut cfg = config(1);
    cfg.sports = vec!["soccer_brazil_campeonato".into()];

    let mut monitor = MonitoringLoop::new(cfg, EventProcessor::new(ValueDetector::new(0.6)));
    monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &ConsoleReporter::new(1),
                exporter: &mut exporter,
                scheduler: &InstantScheduler,
            },
            std::future::pending::<()>(),
        )
        .await;

    let history = monitor.into_history();
    assert_eq!(history.len(), 2);

    let balanced = &history.events()[0];
    assert_eq!(balanced.best.get(Outcome::Home).unwrap().bookmaker, "Unibet");
    assert_eq!(balanced.best.get(Outcome::Away).unwrap().price, 3.60);
    assert!(!balanced.signal.has_value());

    let favourite = &history.events()[1];
    let flagged: Vec<_> = favourite.signal.value_bets().collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].outcome, Outcome::Home);
    assert_eq!(flagged[0].bookmaker, "Pinnacle");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_failing_sport_is_skipped_each_cycle() {
    let dir = temp_dir();
    let provider = MockProvider::new(100);
    provider.fail_sport("soccer_england_pl");
    let mut exporter = CsvExporter::new(&dir, "odds_data");
    let mut monitor = MonitoringLoop::new(config(2), EventProcessor::default());

    let summary = monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &ConsoleReporter::default(),
                exporter: &mut exporter,
                scheduler: &InstantScheduler,
            },
            std::future::pending::<()>(),
        )
        .await;

    assert_eq!(provider.requests().len(), 8);
    assert_eq!(summary.history_events, 2 * (2 + 2 + 1));
    assert!(monitor
        .history()
        .events()
        .iter()
        .all(|e| e.event.sport_key != "soccer_england_pl"));

    let files = csv_files(&dir);
    assert_eq!(files.len(), 2);
    assert_eq!(data_rows(files.last().unwrap()), 2 * (ROWS_PER_ITERATION - 5));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_cancel_before_first_fetch_writes_no_file() {
    let dir = temp_dir();
    let provider = MockProvider::new(100);
    let mut exporter = CsvExporter::new(&dir, "odds_data");
    let mut monitor = MonitoringLoop::new(config(8), EventProcessor::default());

    let summary = monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &ConsoleReporter::default(),
                exporter: &mut exporter,
                scheduler: &InstantScheduler,
            },
            std::future::ready(()),
        )
        .await;

    assert!(summary.cancelled);
    assert!(provider.requests().is_empty());
    assert_eq!(summary.checkpoints_written, 0);
    assert!(!dir.exists());
}

#[tokio::test(start_paused = true)]
async fn test_operator_interrupt_flushes_history() {
    let dir = temp_dir();
    let provider = MockProvider::new(100);
    let mut exporter = CsvExporter::new(&dir, "odds_data");
    let mut monitor = MonitoringLoop::new(config(8), EventProcessor::default());

    // Interrupt lands during the fourth wait (iterations at 0, 15, 30, 45 min).
    let interrupt = tokio::time::sleep(Duration::from_secs(50 * 60));

    let summary = monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &ConsoleReporter::default(),
                exporter: &mut exporter,
                scheduler: &TokioScheduler,
            },
            interrupt,
        )
        .await;

    assert!(summary.cancelled);
    assert_eq!(summary.iterations_completed, 4);
    // Checkpoints after iterations 0 and 3, then the final flush.
    assert_eq!(summary.checkpoints, 3);
    let files = csv_files(&dir);
    assert_eq!(files.len(), 3);
    assert_eq!(data_rows(files.last().unwrap()), 4 * ROWS_PER_ITERATION);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_catalogue_check_flags_unknown_sports() {
    let provider = MockProvider::new(10);
    let configured: Vec<String> = SPORTS.iter().map(|s| s.to_string()).collect();
    let missing = verify_sports(&provider, &configured).await.unwrap();
    assert_eq!(missing, ["soccer_england_pl", "soccer_uefa_champs_league"]);
}

#[tokio::test]
async fn test_quota_reaches_reporter_and_counts_down() {
    let dir = temp_dir();
    let provider = MockProvider::new(500);
    let reporter = CapturingReporter::default();
    let mut exporter = CsvExporter::new(&dir, "odds_data");
    let mut monitor = MonitoringLoop::new(config(1), EventProcessor::default());

    monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &reporter,
                exporter: &mut exporter,
                scheduler: &InstantScheduler,
            },
            std::future::pending::<()>(),
        )
        .await;

    let quotas = reporter.quotas.lock().unwrap();
    let sports: Vec<&str> = quotas.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(sports, SPORTS);
    let remaining: Vec<Option<u64>> = quotas.iter().map(|(_, q)| q.remaining).collect();
    assert_eq!(remaining, [Some(499), Some(498), Some(497), Some(496)]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_trend_follows_price_changes_between_iterations() {
    let dir = temp_dir();
    let provider = MockProvider::new(100);
    provider.set_drift(0.05);
    let reporter = CapturingReporter::default();
    let mut exporter = CsvExporter::new(&dir, "odds_data");
    let mut cfg = config(2);
    cfg.sports = vec!["soccer_brazil_campeonato".into()];
    let mut monitor = MonitoringLoop::new(cfg, EventProcessor::default());

    monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &reporter,
                exporter: &mut exporter,
                scheduler: &InstantScheduler,
            },
            std::future::pending::<()>(),
        )
        .await;

    // Only the second iteration has earlier snapshots to compare with.
    let trends = reporter.trends.lock().unwrap();
    let ids: Vec<&str> = trends.iter().map(|t| t.event_id.as_str()).collect();
    assert_eq!(ids, ["soc-1", "soc-2"]);

    let balanced = &trends[0];
    let home = balanced.get(Outcome::Home).unwrap();
    assert_eq!(home.direction(), Direction::Down);
    assert!((home.previous - 2.15).abs() < 1e-9);
    assert!((home.current - 2.10).abs() < 1e-9);
    assert_eq!(balanced.get(Outcome::Draw).unwrap().direction(), Direction::Steady);
    let away = balanced.get(Outcome::Away).unwrap();
    assert_eq!(away.direction(), Direction::Up);
    assert!((away.change() - 0.05).abs() < 1e-9);

    let favourite = &trends[1];
    assert_eq!(favourite.get(Outcome::Home).unwrap().direction(), Direction::Down);
    assert_eq!(favourite.get(Outcome::Away).unwrap().direction(), Direction::Up);

    std::fs::remove_dir_all(&dir).unwrap();
}
