//! # Telemetry Module
//!
//! Records the velocity reference to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting per-cycle reference snapshots as JSONL (JSON Lines)
//! - Rate-limiting records to a configured interval
//! - Rotating files after N records
//! - Retaining only the last M files

pub mod recorder;

pub use recorder::{TelemetryRecord, TelemetryRecorder};
