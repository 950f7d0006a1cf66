//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, and so does every section, so an empty file
//! (or no file at all, via [`Config::default`]) yields the stock tuning.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::controller::calibration::{
    CalibrationKind, CalibrationMode, DEFAULT_RAW_CENTER, DEFAULT_RAW_SPAN,
};
use crate::error::{Result, VrefError};
use crate::reference::filter::{AxisScale, FilterParams};

/// Control loop rates accepted by [`Config::validate`].
pub const LOOP_RATE_RANGE_HZ: RangeInclusive<u32> = 1..=10000;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Empty means auto-detect.
    #[serde(default)]
    pub device_path: String,

    #[serde(default)]
    pub calibration: CalibrationKind,

    #[serde(default = "default_raw_center")]
    pub raw_center: f64,

    #[serde(default = "default_raw_span")]
    pub raw_span: f64,
}

/// Velocity reference filter tuning
#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_vx_scale")]
    pub vx_scale: f64,

    #[serde(default = "default_vy_scale")]
    pub vy_scale: f64,

    #[serde(default = "default_vyaw_scale")]
    pub vyaw_scale: f64,

    #[serde(default = "default_vz_scale")]
    pub vz_scale: f64,

    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,

    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_loop_rate_hz")]
    pub loop_rate_hz: u32,

    #[serde(default = "default_log_interval_cycles")]
    pub log_interval_cycles: u64,

    #[serde(default = "default_stop_on_back")]
    pub stop_on_back: bool,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_raw_center() -> f64 { DEFAULT_RAW_CENTER }
fn default_raw_span() -> f64 { DEFAULT_RAW_SPAN }

fn default_vx_scale() -> f64 { 0.75 }
fn default_vy_scale() -> f64 { 1.0 }
fn default_vyaw_scale() -> f64 { 0.8 }
fn default_vz_scale() -> f64 { 0.3 }
fn default_smoothing_alpha() -> f64 { 0.003 }
fn default_dead_zone() -> f64 { 0.3 }

fn default_loop_rate_hz() -> u32 { 1000 }
fn default_log_interval_cycles() -> u64 { 50 }
fn default_stop_on_back() -> bool { true }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 100 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            calibration: CalibrationKind::default(),
            raw_center: default_raw_center(),
            raw_span: default_raw_span(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            vx_scale: default_vx_scale(),
            vy_scale: default_vy_scale(),
            vyaw_scale: default_vyaw_scale(),
            vz_scale: default_vz_scale(),
            smoothing_alpha: default_smoothing_alpha(),
            dead_zone: default_dead_zone(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            loop_rate_hz: default_loop_rate_hz(),
            log_interval_cycles: default_log_interval_cycles(),
            stop_on_back: default_stop_on_back(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
            format: default_log_format(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> VrefError {
    VrefError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joystick_vref::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Raw axis calibration selected by `[controller]`
    #[must_use]
    pub fn calibration_mode(&self) -> CalibrationMode {
        CalibrationMode::from_config(
            self.controller.calibration,
            self.controller.raw_center,
            self.controller.raw_span,
        )
    }

    /// Filter construction parameters from `[filter]` and `[controller]`
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_vref::config::Config;
    /// use joystick_vref::reference::filter::FilterParams;
    ///
    /// assert_eq!(Config::default().filter_params(), FilterParams::default());
    /// ```
    #[must_use]
    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            scale: AxisScale {
                vx: self.filter.vx_scale,
                vy: self.filter.vy_scale,
                vyaw: self.filter.vyaw_scale,
                vz: self.filter.vz_scale,
            },
            smoothing_alpha: self.filter.smoothing_alpha,
            dead_zone: self.filter.dead_zone,
            calibration: self.calibration_mode(),
        }
    }

    /// Explicit gamepad path, `None` for auto-detect
    #[must_use]
    pub fn device_path(&self) -> Option<&str> {
        let path = self.controller.device_path.trim();
        (!path.is_empty()).then_some(path)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate calibration constants (checked in every mode)
        if !(self.controller.raw_center.is_finite() && self.controller.raw_center > 0.0) {
            return Err(invalid("raw_center must be a positive number"));
        }

        if !(self.controller.raw_span.is_finite()
            && self.controller.raw_span >= self.controller.raw_center)
        {
            return Err(invalid("raw_span must be at least raw_center"));
        }

        // Validate velocity gains
        for (name, value) in [
            ("vx_scale", self.filter.vx_scale),
            ("vy_scale", self.filter.vy_scale),
            ("vyaw_scale", self.filter.vyaw_scale),
            ("vz_scale", self.filter.vz_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{} must be a positive number", name)));
            }
        }

        let alpha = self.filter.smoothing_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(invalid("smoothing_alpha must be in (0.0, 1.0]"));
        }

        if !(self.filter.dead_zone.is_finite() && self.filter.dead_zone >= 0.0) {
            return Err(invalid("dead_zone must be a non-negative number"));
        }

        // Validate control loop
        if !LOOP_RATE_RANGE_HZ.contains(&self.control.loop_rate_hz) {
            return Err(invalid(format!(
                "loop_rate_hz must be between {} and {}",
                LOOP_RATE_RANGE_HZ.start(),
                LOOP_RATE_RANGE_HZ.end()
            )));
        }

        if self.control.log_interval_cycles == 0 {
            return Err(invalid("log_interval_cycles must be greater than 0"));
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}
