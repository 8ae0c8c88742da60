//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The provider credential is referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`. Nothing here is mutable
//! once the monitor has started.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::engine::monitor::MonitorConfig;
use crate::engine::signal::DEFAULT_VALUE_THRESHOLD;
use crate::storage::csv::DEFAULT_FILE_PREFIX;
use crate::types::OddsError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    pub monitor: MonitorSection,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Comma-separated bookmaker regions, e.g. "eu" or "eu,us".
    #[serde(default = "default_regions")]
    pub regions: String,
    /// Deadline for the sports catalogue request.
    #[serde(default = "default_sports_timeout")]
    pub sports_timeout_secs: u64,
    /// Deadline for each per-sport odds request.
    #[serde(default = "default_odds_timeout")]
    pub odds_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            regions: default_regions(),
            sports_timeout_secs: default_sports_timeout(),
            odds_timeout_secs: default_odds_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorSection {
    /// Sport keys, fetched in this order every iteration.
    pub sports: Vec<String>,
    pub interval_secs: u64,
    pub iterations: u32,
    /// Export the full history every this many iterations.
    #[serde(default = "default_checkpoint_period")]
    pub checkpoint_period: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Fair probability above which an outcome is flagged.
    #[serde(default = "default_value_threshold")]
    pub value_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            value_threshold: default_value_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_api_key_env() -> String {
    "ODDS_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.the-odds-api.com/v4".into()
}
fn default_regions() -> String {
    "eu".into()
}
fn default_sports_timeout() -> u64 {
    10
}
fn default_odds_timeout() -> u64 {
    15
}
fn default_checkpoint_period() -> u32 {
    3
}
fn default_value_threshold() -> f64 {
    DEFAULT_VALUE_THRESHOLD
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.into()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<(), OddsError> {
        let m = &self.monitor;
        if m.sports.is_empty() || m.sports.iter().any(|s| s.trim().is_empty()) {
            return Err(OddsError::Config("monitor.sports must list at least one sport key".into()));
        }
        if m.iterations == 0 {
            return Err(OddsError::Config("monitor.iterations must be at least 1".into()));
        }
        if m.checkpoint_period == 0 {
            return Err(OddsError::Config("monitor.checkpoint_period must be at least 1".into()));
        }
        let t = self.analysis.value_threshold;
        if !(t > 0.0 && t < 1.0) {
            return Err(OddsError::Config(format!(
                "analysis.value_threshold must be in (0, 1), got {t}"
            )));
        }
        Ok(())
    }

    /// Loop parameters derived from the `[monitor]` section.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            sports: self.monitor.sports.clone(),
            interval: Duration::from_secs(self.monitor.interval_secs),
            iterations: self.monitor.iterations,
            checkpoint_period: self.monitor.checkpoint_period,
        }
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve the provider credential.
    pub fn api_key(&self) -> Result<SecretString> {
        let key = Self::resolve_env(&self.provider.api_key_env)?;
        if key.trim().is_empty() {
            return Err(OddsError::Config(format!(
                "{} is set but empty",
                self.provider.api_key_env
            ))
            .into());
        }
        Ok(SecretString::new(key))
    }
}
