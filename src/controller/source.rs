//! # Input Device Source
//!
//! The contract between the gamepad acquisition side and the velocity
//! reference filter.
//!
//! The acquisition thread writes the latest axis and button values; the
//! control loop reads whatever is current. There is no queue: intermediate
//! device updates between two control cycles are simply overwritten.
//!
//! [`SharedGamepad`] implements the contract with one atomic per field, so
//! reads and writes never block. A cycle may observe a mix of old and new
//! fields if the device updates mid-read; the downstream low-pass filter damps
//! that.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Analog axes consumed by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left stick, horizontal. Feeds the body-frame lateral velocity after remapping.
    Forward,
    /// Left stick, vertical. Feeds the body-frame forward velocity after remapping.
    Lateral,
    /// Right stick, horizontal. Yaw rate.
    Yaw,
}

impl Axis {
    /// Every axis, in storage order.
    pub const ALL: [Axis; 3] = [Axis::Forward, Axis::Lateral, Axis::Yaw];

    pub(crate) fn index(self) -> usize {
        match self {
            Axis::Forward => 0,
            Axis::Lateral => 1,
            Axis::Yaw => 2,
        }
    }
}

/// Digital buttons consumed by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Top face button.
    North,
    /// Right face button.
    East,
    /// Bottom face button.
    South,
    /// Left face button.
    West,
    /// Start / Options. Requests a reset.
    Start,
    /// Back / Share. Requests a stop.
    Back,
}

impl Button {
    /// Every button, in storage order.
    pub const ALL: [Button; 6] = [
        Button::North,
        Button::East,
        Button::South,
        Button::West,
        Button::Start,
        Button::Back,
    ];

    fn index(self) -> usize {
        match self {
            Button::North => 0,
            Button::East => 1,
            Button::South => 2,
            Button::West => 3,
            Button::Start => 4,
            Button::Back => 5,
        }
    }
}

/// Snapshot access to the latest gamepad sample.
///
/// Axis values are in the device's raw representation; interpreting them is
/// the job of [`CalibrationMode`](super::calibration::CalibrationMode).
/// Implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait InputDeviceSource {
    /// Latest raw value of `axis`.
    fn read_axis(&self, axis: Axis) -> f64;

    /// Latest pressed state of `button`.
    fn read_button(&self, button: Button) -> bool;

    /// Overwrites the stored raw value of `axis`.
    fn reset_axis(&self, axis: Axis, value: f64);
}

#[derive(Debug, Default)]
struct Slots {
    /// `f64` bit patterns.
    axes: [AtomicU64; 3],
    buttons: [AtomicBool; 6],
}

/// Lock-free, last-value-wins gamepad snapshot shared between threads.
///
/// Cloning yields another handle to the same storage.
///
/// # Examples
///
/// ```
/// use joystick_vref::controller::source::{Axis, Button, InputDeviceSource, SharedGamepad};
///
/// let pad = SharedGamepad::new();
/// let writer = pad.clone();
///
/// writer.set_axis(Axis::Yaw, 0.004);
/// writer.set_button(Button::South, true);
///
/// assert_eq!(pad.read_axis(Axis::Yaw), 0.004);
/// assert!(pad.read_button(Button::South));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedGamepad {
    slots: Arc<Slots>,
}

impl SharedGamepad {
    /// Creates a snapshot with every axis at 0.0 and every button released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the latest raw value of `axis`.
    pub fn set_axis(&self, axis: Axis, value: f64) {
        self.slots.axes[axis.index()].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Stores the latest pressed state of `button`.
    pub fn set_button(&self, button: Button, pressed: bool) {
        self.slots.buttons[button.index()].store(pressed, Ordering::Relaxed);
    }
}

impl InputDeviceSource for SharedGamepad {
    fn read_axis(&self, axis: Axis) -> f64 {
        f64::from_bits(self.slots.axes[axis.index()].load(Ordering::Relaxed))
    }

    fn read_button(&self, button: Button) -> bool {
        self.slots.buttons[button.index()].load(Ordering::Relaxed)
    }

    fn reset_axis(&self, axis: Axis, value: f64) {
        self.set_axis(axis, value);
    }
}
