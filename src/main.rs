//! oddswatch — bookmaker odds monitor
//!
//! Entry point. Loads configuration, initialises structured logging,
//! checks provider connectivity, and runs the monitoring loop until its
//! iteration count is exhausted or Ctrl+C is pressed.

use anyhow::Result;
use tracing::{error, info, warn};

use oddswatch::config::AppConfig;
use oddswatch::engine::monitor::{MonitorDeps, MonitoringLoop, TokioScheduler};
use oddswatch::engine::processor::EventProcessor;
use oddswatch::engine::signal::ValueDetector;
use oddswatch::provider::odds_api::OddsApiClient;
use oddswatch::provider::verify_sports;
use oddswatch::report::ConsoleReporter;
use oddswatch::storage::csv::CsvExporter;

const BANNER: &str = r#"
            _     _                     _       _
   ___   __| | __| |_____      ____ _| |_ ___| |__
  / _ \ / _` |/ _` / __\ \ /\ / / _` | __/ __| '_ \
 | (_) | (_| | (_| \__ \\ V  V / (_| | || (__| | | |
  \___/ \__,_|\__,_|___/ \_/\_/ \__,_|\__\___|_| |_|

  Best-price tracking and value-bet scanning
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        sports = ?cfg.monitor.sports,
        interval_secs = cfg.monitor.interval_secs,
        iterations = cfg.monitor.iterations,
        checkpoint_period = cfg.monitor.checkpoint_period,
        value_threshold = cfg.analysis.value_threshold,
        "oddswatch starting up"
    );

    // -- Initialise components -------------------------------------------

    let provider = OddsApiClient::new(cfg.api_key()?, &cfg.provider)?;

    match verify_sports(&provider, &cfg.monitor.sports).await {
        Ok(missing) if !missing.is_empty() => {
            warn!(?missing, "Some configured sports are unknown to the provider");
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Provider connectivity check failed, continuing anyway");
        }
    }

    let processor = EventProcessor::new(ValueDetector::new(cfg.analysis.value_threshold));
    let mut monitor = MonitoringLoop::new(cfg.monitor_config(), processor);
    let reporter = ConsoleReporter::default();
    let mut exporter = CsvExporter::new(&cfg.export.output_dir, cfg.export.file_prefix.clone());
    info!(dir = %exporter.output_dir().display(), "Checkpoints will be exported");

    // -- Main loop -------------------------------------------------------

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received."),
            Err(e) => {
                warn!(error = %e, "Cannot listen for Ctrl+C; running to completion");
                std::future::pending::<()>().await;
            }
        }
    };

    info!("Entering monitoring loop. Press Ctrl+C to stop.");

    let summary = monitor
        .run(
            MonitorDeps {
                provider: &provider,
                reporter: &reporter,
                exporter: &mut exporter,
                scheduler: &TokioScheduler,
            },
            shutdown,
        )
        .await;

    if summary.cancelled {
        warn!(
            iterations = summary.iterations_completed,
            files = exporter.files_written(),
            "Monitoring stopped early"
        );
    } else {
        info!(
            iterations = summary.iterations_completed,
            files = exporter.files_written(),
            "oddswatch finished cleanly."
        );
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("oddswatch=info"));

    let json_logging = std::env::var("ODDSWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
