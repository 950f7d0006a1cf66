//! # Calibration Module
//!
//! Converts raw gamepad axis readings to normalized bipolar values and applies
//! the velocity dead zone.
//!
//! ## Calibration Modes
//!
//! Gamepad drivers disagree on how they publish stick positions, so the raw
//! representation is selected once, at construction:
//!
//! - **Bipolar-from-unsigned** (default): the raw value is a small unsigned
//!   fraction centred on `raw_center` (0.00390625, i.e. 128/32768). The
//!   normalized value is `raw / raw_center - 1`, which spans roughly -1..1
//!   when raw spans `0..raw_span` (`raw_span = 2 * raw_center`).
//! - **Direct**: the raw value is already normalized to -1..1 and passes through.
//!
//! ## Dead Zone
//!
//! Unlike a stick-level dead zone, this one acts on the scaled *velocity*:
//! any component strictly inside `(-dead_zone, dead_zone)` becomes exactly
//! 0.0, while `±dead_zone` itself and everything beyond passes unchanged. The
//! remaining range is not rescaled.
//!
//! ## Usage
//!
//! ```
//! use joystick_vref::controller::calibration::{apply_dead_zone, CalibrationMode};
//!
//! let mode = CalibrationMode::default();
//! assert_eq!(mode.normalize(0.0078125), 1.0);
//! assert_eq!(mode.normalize(mode.neutral_raw()), 0.0);
//!
//! assert_eq!(apply_dead_zone(0.29, 0.3), 0.0);
//! assert_eq!(apply_dead_zone(-0.75, 0.3), -0.75);
//! ```

use serde::Deserialize;

use super::mapper::{AXIS_MAX, AXIS_MIN};

/// Raw value reported by a centred stick in bipolar-from-unsigned mode.
pub const DEFAULT_RAW_CENTER: f64 = 0.00390625;

/// Full raw range in bipolar-from-unsigned mode (`2 * DEFAULT_RAW_CENTER`).
pub const DEFAULT_RAW_SPAN: f64 = 0.0078125;

/// Calibration mode selector as written in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationKind {
    /// Raw values centred on a small positive constant.
    #[default]
    BipolarFromUnsigned,
    /// Raw values already in -1..1.
    Direct,
}

/// How raw axis values map to the normalized bipolar range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationMode {
    /// `normalized = raw / raw_center - 1`
    BipolarFromUnsigned {
        /// Raw value of a centred stick.
        raw_center: f64,
        /// Full raw range reported by the device (`0..raw_span`).
        raw_span: f64,
    },
    /// `normalized = raw`
    Direct,
}

impl Default for CalibrationMode {
    fn default() -> Self {
        Self::BipolarFromUnsigned {
            raw_center: DEFAULT_RAW_CENTER,
            raw_span: DEFAULT_RAW_SPAN,
        }
    }
}

impl CalibrationMode {
    /// Resolves the configured kind into a mode.
    ///
    /// `raw_center` and `raw_span` are ignored in direct mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_vref::controller::calibration::{CalibrationKind, CalibrationMode};
    ///
    /// let mode = CalibrationMode::from_config(CalibrationKind::Direct, 0.1, 0.2);
    /// assert_eq!(mode, CalibrationMode::Direct);
    /// ```
    #[must_use]
    pub fn from_config(kind: CalibrationKind, raw_center: f64, raw_span: f64) -> Self {
        match kind {
            CalibrationKind::BipolarFromUnsigned => Self::BipolarFromUnsigned {
                raw_center,
                raw_span,
            },
            CalibrationKind::Direct => Self::Direct,
        }
    }

    /// Converts a raw axis reading to the normalized bipolar range.
    ///
    /// Out-of-range readings are not clamped; they simply produce
    /// out-of-range normalized values.
    #[must_use]
    pub fn normalize(&self, raw: f64) -> f64 {
        match *self {
            Self::BipolarFromUnsigned { raw_center, .. } => raw / raw_center - 1.0,
            Self::Direct => raw,
        }
    }

    /// Raw value that normalizes to exactly 0.0.
    ///
    /// Written to the device source at cycle 0 so an uninitialised reading of
    /// 0.0 is not misread as full negative deflection.
    #[must_use]
    pub fn neutral_raw(&self) -> f64 {
        match *self {
            Self::BipolarFromUnsigned { raw_center, .. } => raw_center,
            Self::Direct => 0.0,
        }
    }

    /// Encodes a device axis value reported within `range` into this mode's
    /// raw representation.
    ///
    /// The centre of `range` always encodes to [`neutral_raw`](Self::neutral_raw).
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_vref::controller::calibration::{AxisRange, CalibrationMode};
    ///
    /// let mode = CalibrationMode::default();
    /// assert_eq!(mode.encode_device_axis(128, AxisRange::EIGHT_BIT), 0.00390625);
    /// assert_eq!(CalibrationMode::Direct.encode_device_axis(128, AxisRange::EIGHT_BIT), 0.0);
    ///
    /// let signed = AxisRange::new(-32768, 32767).unwrap();
    /// assert_eq!(mode.encode_device_axis(0, signed), 0.00390625);
    /// ```
    #[must_use]
    pub fn encode_device_axis(&self, value: i32, range: AxisRange) -> f64 {
        match *self {
            Self::BipolarFromUnsigned { raw_span, .. } => range.fraction(value) * raw_span,
            Self::Direct => range.normalize(value),
        }
    }
}

/// Reported value range of one device axis (evdev absinfo minimum/maximum).
///
/// The centre is `min + (max - min + 1) / 2`, which is 128 for `0..=255`
/// and 0 for `-32768..=32767`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    min: i32,
    max: i32,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::EIGHT_BIT
    }
}

impl AxisRange {
    /// Unsigned 8-bit stick (`0..=255`, centre 128).
    pub const EIGHT_BIT: AxisRange = AxisRange {
        min: AXIS_MIN,
        max: AXIS_MAX,
    };

    /// Range `min..=max`, or `None` if it is too narrow to have a centre
    /// strictly between its ends.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Option<Self> {
        (i64::from(max) - i64::from(min) >= 2).then_some(Self { min, max })
    }

    /// Lowest reported value.
    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    /// Highest reported value.
    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    fn steps(&self) -> i64 {
        i64::from(self.max) - i64::from(self.min) + 1
    }

    /// Value reported by a centred stick.
    #[must_use]
    pub fn center(&self) -> i64 {
        i64::from(self.min) + self.steps() / 2
    }

    /// Position as a fraction of the range, clamped; the centre maps to 0.5.
    #[must_use]
    pub fn fraction(&self, value: i32) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        (i64::from(clamped) - i64::from(self.min)) as f64 / self.steps() as f64
    }

    /// Position relative to the centre, clamped to -1..1.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_vref::controller::calibration::AxisRange;
    ///
    /// let range = AxisRange::EIGHT_BIT;
    /// assert!((range.normalize(0) - (-1.0)).abs() < 0.01);
    /// assert_eq!(range.normalize(128), 0.0);
    /// assert_eq!(range.normalize(255), 1.0);
    /// ```
    #[must_use]
    pub fn normalize(&self, value: i32) -> f64 {
        let center = self.center();
        let offset = (i64::from(value) - center) as f64;
        let half = (i64::from(self.max) - center) as f64;
        (offset / half).clamp(-1.0, 1.0)
    }
}

/// Zeroes a velocity component strictly inside `(-dead_zone, dead_zone)`.
///
/// The boundary values themselves pass through unchanged.
#[inline]
#[must_use]
pub fn apply_dead_zone(value: f64, dead_zone: f64) -> f64 {
    if value < dead_zone && value > -dead_zone {
        0.0
    } else {
        value
    }
}
