//! CSV checkpoint writer.
//!
//! Every checkpoint produces a new file holding the entire history up to
//! that point; earlier files are never overwritten.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::Exporter;
use crate::types::{ExportRow, OddsError};

/// Default file name prefix.
pub const DEFAULT_FILE_PREFIX: &str = "odds_data";

/// Writes checkpoints as `{prefix}_{YYYYmmdd_HHMMSS}_{seq}.csv`.
pub struct CsvExporter {
    output_dir: PathBuf,
    prefix: String,
    sequence: u32,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            sequence: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of files written so far.
    pub fn files_written(&self) -> u32 {
        self.sequence
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        self.output_dir
            .join(format!("{}_{}_{:03}.csv", self.prefix, stamp, self.sequence + 1))
    }
}

/// Render rows as a CSV document with header.
pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut csv = String::with_capacity(64 * (rows.len() + 1));
    csv.push_str(ExportRow::HEADER);
    csv.push('\n');
    for row in rows {
        csv.push_str(&row.to_csv_record());
        csv.push('\n');
    }
    csv
}

impl Exporter for CsvExporter {
    fn export(&mut self, rows: &[ExportRow]) -> Result<PathBuf> {
        if rows.is_empty() {
            return Err(OddsError::Storage("refusing to write an empty export".into()).into());
        }

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create export directory {}", self.output_dir.display())
        })?;

        let path = self.next_path();
        let csv = render_csv(rows);
        std::fs::write(&path, csv)
            .with_context(|| format!("Failed to write export to {}", path.display()))?;

        self.sequence += 1;
        debug!(path = %path.display(), sequence = self.sequence, "Export file written");
        info!(path = %path.display(), rows = rows.len(), "Data saved");
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
