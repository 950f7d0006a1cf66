//! # Joystick Velocity Reference
//!
//! Reads a gamepad and prints the smoothed velocity reference it produces.
//!
//! The binary wires the library together: configuration, logging, the
//! gamepad acquisition thread, the reference filter and the control loop.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use joystick_vref::config::Config;
use joystick_vref::controller::gamepad::Gamepad;
use joystick_vref::controller::mapper::EventMapper;
use joystick_vref::controller::source::SharedGamepad;
use joystick_vref::reference::VelocityReferenceFilter;
use joystick_vref::runner::{self, LoopOptions};
use joystick_vref::telemetry::TelemetryRecorder;

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with a non-blocking stdout writer
///    - Load configuration (first argument, or `config/default.toml`)
///    - Open the gamepad and start the acquisition thread
///
/// 2. **Main Loop**
///    - Update the velocity reference at `loop_rate_hz`
///    - Log raw and filtered forward velocity every `log_interval_cycles`
///    - Leave on Ctrl+C, or on Back when `stop_on_back` is set
///
/// 3. **Shutdown**
///    - Log the loop summary
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be read or is invalid
/// - No gamepad can be opened
/// - The telemetry directory cannot be created
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO joystick_vref: Joystick velocity reference v0.1.0 starting...
/// INFO joystick_vref::controller::gamepad: Found gamepad at /dev/input/event5: "Wireless Controller"
/// INFO joystick_vref::runner: Control loop running at 1000Hz
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(writer)
        .init();

    info!(
        "Joystick velocity reference v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config_arg = std::env::args().nth(1);
    let config = load_config(config_arg.as_deref())?;

    let pad = SharedGamepad::new();
    let gamepad = Gamepad::open(config.device_path()).context("Failed to open gamepad")?;
    info!("Using gamepad at {}", gamepad.device_path());

    let mapper = EventMapper::new(pad.clone(), config.calibration_mode());
    let _acquisition = gamepad.spawn_acquisition(mapper)?;

    let mut recorder = if config.telemetry.enabled {
        Some(TelemetryRecorder::new(&config.telemetry)?)
    } else {
        None
    };

    let mut filter = VelocityReferenceFilter::new(config.filter_params());
    let options = LoopOptions::from_config(&config.control);

    info!("Press Ctrl+C to exit");

    let summary = runner::run(&pad, &mut filter, &options, recorder.as_mut(), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
    })
    .await;

    info!(
        "Stopped after {} cycles, {} gait switches, {} resets{}",
        summary.cycles,
        summary.mode_changes,
        summary.resets,
        if summary.stopped_by_request {
            " (stop requested from gamepad)"
        } else {
            ""
        }
    );

    Ok(())
}

/// Load the configuration named on the command line.
///
/// Without an argument the default path is used, and a missing default file
/// falls back to built-in defaults. An explicitly named file must exist.
fn load_config(arg: Option<&str>) -> Result<Config> {
    match arg {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_PATH)),
        None => {
            info!(
                "{} not found, using built-in defaults",
                DEFAULT_CONFIG_PATH
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_config_is_error() {
        assert!(load_config(Some("/definitely/not/here.toml")).is_err());
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vref.toml");
        std::fs::write(&path, "[control]\nloop_rate_hz = 500\n").unwrap();

        let config = load_config(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.control.loop_rate_hz, 500);
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }
}
