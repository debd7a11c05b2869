//! Export of collected records: JSON snapshot, timestamped history copy, CSV.

use crate::extract::models::{MaterialRecord, CSV_COLUMNS};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files written by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub json_versioned: PathBuf,
    /// Absent when there was nothing to write
    pub csv: Option<PathBuf>,
}

/// Writes exports under one directory.
pub struct OutputWriter {
    dir: PathBuf,
    basename: String,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        Self { dir: dir.into(), basename: basename.into() }
    }

    /// Path of the snapshot the read API serves.
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.basename))
    }

    /// Writes `{basename}.json`, `history/{basename}_{stamp}.json` and,
    /// for a non-empty run, `{basename}.csv`.
    pub fn write(&self, records: &[MaterialRecord], now: DateTime<Utc>) -> Result<OutputPaths> {
        let history = self.dir.join("history");
        std::fs::create_dir_all(&history)
            .with_context(|| format!("Failed to create output directory: {}", history.display()))?;

        let json = Formatter::to_json(records)?;

        let snapshot = self.snapshot_path();
        write_file(&snapshot, &json)?;

        let stamp = now.format("%Y%m%dT%H%M%SZ");
        let versioned = history.join(format!("{}_{}.json", self.basename, stamp));
        write_file(&versioned, &json)?;

        let csv = if records.is_empty() {
            debug!("No records, skipping CSV export");
            None
        } else {
            let path = self.dir.join(format!("{}.csv", self.basename));
            write_file(&path, &Formatter::to_csv(records))?;
            Some(path)
        };

        info!("Exported {} records to {}", records.len(), self.dir.display());
        Ok(OutputPaths { json: snapshot, json_versioned: versioned, csv })
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Serializes records to the export formats.
pub struct Formatter;

impl Formatter {
    /// Pretty-printed JSON array.
    pub fn to_json(records: &[MaterialRecord]) -> Result<String> {
        serde_json::to_string_pretty(records).context("Failed to serialize records")
    }

    /// CSV with a header row in [`CSV_COLUMNS`] order.
    pub fn to_csv(records: &[MaterialRecord]) -> String {
        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(CSV_COLUMNS.join(","));

        for record in records {
            let cells: Vec<String> = record.csv_cells().iter().map(|c| Self::csv_escape(c)).collect();
            lines.push(cells.join(","));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
