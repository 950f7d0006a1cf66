//! # Control Loop
//!
//! Drives [`VelocityReferenceFilter::update`] at a fixed rate and acts as the
//! first consumer of its outputs: logs mode changes, acknowledges reset
//! requests, records telemetry and leaves the loop on a stop request.
//!
//! The loop ticks on a `tokio::time::interval`. Ticks missed because the
//! process was descheduled are skipped rather than bursted, so the filter
//! never runs several cycles back-to-back on the same sample.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{ControlConfig, LOOP_RATE_RANGE_HZ};
use crate::controller::source::InputDeviceSource;
use crate::reference::filter::VelocityReferenceFilter;
use crate::reference::vector::{components, VelocityVector};
use crate::telemetry::{TelemetryRecord, TelemetryRecorder};

/// Loop timing and behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOptions {
    /// Control period.
    pub period: Duration,
    /// Cycles between raw/filtered debug lines.
    pub log_interval_cycles: u64,
    /// Leave the loop once the filter reports a stop request.
    pub stop_on_back: bool,
}

impl LoopOptions {
    /// Build options from `[control]`.
    ///
    /// `loop_rate_hz` is clamped to [`LOOP_RATE_RANGE_HZ`] and
    /// `log_interval_cycles` to at least 1, so unvalidated input still gives
    /// a non-zero period.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_vref::config::ControlConfig;
    /// use joystick_vref::runner::LoopOptions;
    /// use std::time::Duration;
    ///
    /// let options = LoopOptions::from_config(&ControlConfig::default());
    /// assert_eq!(options.period, Duration::from_millis(1));
    /// ```
    #[must_use]
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            period: Duration::from_secs(1)
                / config
                    .loop_rate_hz
                    .clamp(*LOOP_RATE_RANGE_HZ.start(), *LOOP_RATE_RANGE_HZ.end()),
            log_interval_cycles: config.log_interval_cycles.max(1),
            stop_on_back: config.stop_on_back,
        }
    }
}

/// What happened during a [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSummary {
    /// Number of completed cycles.
    pub cycles: u64,
    /// Number of non-zero mode codes emitted.
    pub mode_changes: u64,
    /// Number of reset requests acknowledged.
    pub resets: u64,
    /// True if the loop ended because of a stop request.
    pub stopped_by_request: bool,
    /// Reference produced by the last cycle.
    pub last_reference: VelocityVector,
}

/// Run the control loop until `shutdown` completes or a stop is requested.
///
/// The first cycle uses index 0, so the filter neutralises the source's axes
/// before reading them.
pub async fn run<S, F>(
    source: &S,
    filter: &mut VelocityReferenceFilter,
    options: &LoopOptions,
    mut recorder: Option<&mut TelemetryRecorder>,
    shutdown: F,
) -> LoopSummary
where
    S: InputDeviceSource + ?Sized,
    F: Future<Output = ()>,
{
    let mut ticker = interval(options.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut summary = LoopSummary {
        cycles: 0,
        mode_changes: 0,
        resets: 0,
        stopped_by_request: false,
        last_reference: VelocityVector::zero(),
    };

    info!(
        "Control loop running at {:.0}Hz",
        1.0 / options.period.as_secs_f64()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cycle = summary.cycles;
                let (reference, mode) = filter.update(source, cycle);
                summary.cycles += 1;
                summary.last_reference = reference;

                if mode.is_change() {
                    summary.mode_changes += 1;
                    info!("Gait switch requested: code {}", mode.code());
                }

                if cycle % options.log_interval_cycles == 0 {
                    debug!(
                        "Joystick raw: {:.4}  filtered: {:.4}",
                        filter.raw_sample()[components::LINEAR_X],
                        reference[components::LINEAR_X]
                    );
                }

                if let Some(rec) = recorder.as_deref_mut() {
                    let now = Instant::now();
                    if rec.should_record(now) {
                        let record = TelemetryRecord::capture(cycle, filter, mode);
                        if let Err(e) = rec.record(&record, now) {
                            warn!("Failed to write telemetry: {}", e);
                        }
                    }
                }

                if filter.flags().reset_requested {
                    info!("Reset requested from gamepad");
                    filter.clear_reset_request();
                    summary.resets += 1;
                }

                if options.stop_on_back && filter.flags().stop_requested {
                    warn!("Stop requested from gamepad, leaving control loop");
                    summary.stopped_by_request = true;
                    break;
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    info!(
        "Control loop finished after {} cycles ({} gait switches)",
        summary.cycles, summary.mode_changes
    );
    summary
}
