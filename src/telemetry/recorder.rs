//! # Telemetry Recorder
//!
//! Writes one JSON object per line:
//!
//! ```text
//! {"timestamp":"2026-10-17T09:12:44.118+00:00","cycle":1200,"raw_sample":[-0.75,0.0,0.0,0.0,0.0,0.0],"reference":[-0.72,0.0,0.0,0.0,0.0,0.0],"mode_code":0,"reset_requested":false,"stop_requested":false}
//! ```
//!
//! Files are named `vref_<YYYYmmdd_HHMMSS>_<seq>.jsonl` so lexical order is
//! chronological order.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::reference::filter::VelocityReferenceFilter;
use crate::reference::latch::ModeCode;
use crate::reference::vector::DOF;

const FILE_PREFIX: &str = "vref_";
const FILE_EXTENSION: &str = ".jsonl";

/// One telemetry line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    /// Control cycle index.
    pub cycle: u64,
    /// Dead-zoned, unsmoothed velocity sample.
    pub raw_sample: [f64; DOF],
    /// Filtered velocity reference.
    pub reference: [f64; DOF],
    /// Mode code emitted this cycle (0 = none).
    pub mode_code: u8,
    /// Sticky reset flag after the update.
    pub reset_requested: bool,
    /// Sticky stop flag after the update.
    pub stop_requested: bool,
}

impl TelemetryRecord {
    /// Snapshots the filter state after the update for `cycle`.
    #[must_use]
    pub fn capture(cycle: u64, filter: &VelocityReferenceFilter, mode: ModeCode) -> Self {
        let flags = filter.flags();
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            cycle,
            raw_sample: filter.raw_sample().into(),
            reference: filter.filtered_reference().into(),
            mode_code: mode.code(),
            reset_requested: flags.reset_requested,
            stop_requested: flags.stop_requested,
        }
    }
}

/// Rotating JSONL writer.
#[derive(Debug)]
pub struct TelemetryRecorder {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    interval: Duration,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_seq: u64,
    last_record: Option<Instant>,
}

impl TelemetryRecorder {
    /// Create a recorder, creating `log_dir` if needed.
    ///
    /// No file is opened until the first record.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&log_dir)?;
        info!("Telemetry enabled, writing to {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            interval: Duration::from_millis(config.log_interval_ms),
            writer: None,
            records_in_file: 0,
            file_seq: 0,
            last_record: None,
        })
    }

    /// True if at least one interval has passed since the last record.
    #[must_use]
    pub fn should_record(&self, now: Instant) -> bool {
        self.last_record
            .map(|last| now.saturating_duration_since(last) >= self.interval)
            .unwrap_or(true)
    }

    /// Append a record, rotating first if the current file is full.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Telemetry` if the record cannot be written.
    pub fn record(&mut self, record: &TelemetryRecord, now: Instant) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        self.records_in_file += 1;
        self.last_record = Some(now);
        Ok(())
    }

    /// Telemetry files currently in `log_dir`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be listed.
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        list_log_files(&self.log_dir)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut old) = self.writer.take() {
            old.flush()?;
        }

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.file_seq,
            FILE_EXTENSION
        );
        let path = self.log_dir.join(name);
        let file = File::create(&path)?;
        debug!("Telemetry file opened: {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.file_seq += 1;

        self.prune()
    }

    fn prune(&self) -> Result<()> {
        let files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        let excess = files.len() - self.max_files_to_keep;
        for old in &files[..excess] {
            fs::remove_file(old)?;
            debug!("Telemetry file removed: {}", old.display());
        }
        Ok(())
    }
}

fn list_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .map(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_EXTENSION))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
