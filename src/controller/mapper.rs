//! # Gamepad Event Mapper Module
//!
//! Parses raw evdev events from the gamepad and publishes them into a
//! [`SharedGamepad`] snapshot for the control loop.
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Source axis |
//! |------|------------|-------------|
//! | Left Stick X | ABS_X | [`Axis::Forward`] |
//! | Left Stick Y | ABS_Y | [`Axis::Lateral`] |
//! | Right Stick X | ABS_Z | [`Axis::Yaw`] |
//!
//! Each axis has an [`AxisRange`], 0-255 until the device's own absinfo
//! range is applied with [`EventMapper::set_axis_range`]. Values are encoded
//! against that range into the raw representation expected by the active
//! [`CalibrationMode`] before being stored, so a centred stick is neutral
//! whether the driver reports 0-255 or -32768..32767.
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code | Source button |
//! |--------|------------|---------------|
//! | Triangle / Y | BTN_NORTH | [`Button::North`] |
//! | Circle / B | BTN_EAST | [`Button::East`] |
//! | Cross / A | BTN_SOUTH | [`Button::South`] |
//! | Square / X | BTN_WEST | [`Button::West`] |
//! | Options / Start | BTN_START | [`Button::Start`] |
//! | Share / Back | BTN_SELECT | [`Button::Back`] |
//!
//! Every other event is ignored.

use evdev::{AbsoluteAxisType, InputEvent, Key};

use super::calibration::{AxisRange, CalibrationMode};
use super::source::{Axis, Button, SharedGamepad};

/// Lowest value of an 8-bit gamepad axis.
pub const AXIS_MIN: i32 = 0;
/// Highest value of an 8-bit gamepad axis.
pub const AXIS_MAX: i32 = 255;
/// Centre value of an 8-bit gamepad axis.
pub const AXIS_CENTER: i32 = 128;

/// evdev axis code feeding `axis`.
#[must_use]
pub const fn abs_code(axis: Axis) -> AbsoluteAxisType {
    match axis {
        Axis::Forward => AbsoluteAxisType::ABS_X,
        Axis::Lateral => AbsoluteAxisType::ABS_Y,
        Axis::Yaw => AbsoluteAxisType::ABS_Z,
    }
}

/// Translates evdev events into [`SharedGamepad`] writes.
///
/// # Thread Safety
///
/// `EventMapper` is meant to live on the acquisition thread. The snapshot it
/// writes to can be read from any thread.
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, EventType, InputEvent};
/// use joystick_vref::controller::calibration::CalibrationMode;
/// use joystick_vref::controller::mapper::EventMapper;
/// use joystick_vref::controller::source::{Axis, InputDeviceSource, SharedGamepad};
///
/// let pad = SharedGamepad::new();
/// let mut mapper = EventMapper::new(pad.clone(), CalibrationMode::default());
///
/// mapper.process_event(&InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_X.0, 128));
/// assert_eq!(pad.read_axis(Axis::Forward), 0.00390625);
/// ```
#[derive(Debug)]
pub struct EventMapper {
    pad: SharedGamepad,
    calibration: CalibrationMode,
    ranges: [AxisRange; 3],
}

impl EventMapper {
    /// Creates a mapper writing into `pad`, assuming 8-bit axes.
    #[must_use]
    pub fn new(pad: SharedGamepad, calibration: CalibrationMode) -> Self {
        Self {
            pad,
            calibration,
            ranges: [AxisRange::EIGHT_BIT; 3],
        }
    }

    /// Sets the value range the device reports for `axis`.
    pub fn set_axis_range(&mut self, axis: Axis, range: AxisRange) {
        self.ranges[axis.index()] = range;
    }

    /// Value range currently assumed for `axis`.
    #[must_use]
    pub fn axis_range(&self, axis: Axis) -> AxisRange {
        self.ranges[axis.index()]
    }

    /// Returns the snapshot this mapper writes to.
    #[must_use]
    pub fn pad(&self) -> &SharedGamepad {
        &self.pad
    }

    /// Processes a single evdev input event.
    ///
    /// Handles absolute axis events (sticks) and key events (buttons).
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            evdev::InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
            }
            evdev::InputEventKind::Key(key) => {
                self.process_key_event(key, event.value() != 0);
            }
            _ => {
                // Ignore sync events and other event types
            }
        }
    }

    /// Processes an absolute axis event.
    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let target = match axis {
            AbsoluteAxisType::ABS_X => Axis::Forward,
            AbsoluteAxisType::ABS_Y => Axis::Lateral,
            AbsoluteAxisType::ABS_Z => Axis::Yaw,
            _ => return,
        };
        let range = self.ranges[target.index()];
        self.pad
            .set_axis(target, self.calibration.encode_device_axis(value, range));
    }

    /// Processes a key/button event.
    fn process_key_event(&mut self, key: Key, pressed: bool) {
        let target = match key {
            Key::BTN_NORTH => Button::North,
            Key::BTN_EAST => Button::East,
            Key::BTN_SOUTH => Button::South,
            Key::BTN_WEST => Button::West,
            Key::BTN_START => Button::Start,
            Key::BTN_SELECT => Button::Back,
            _ => return,
        };
        self.pad.set_button(target, pressed);
    }

    /// Publishes a centred, all-released state.
    ///
    /// Used when the device disappears so the control loop decays to zero
    /// instead of holding the last deflection.
    pub fn reset(&mut self) {
        let neutral = self.calibration.neutral_raw();
        for axis in Axis::ALL {
            self.pad.set_axis(axis, neutral);
        }
        for button in Button::ALL {
            self.pad.set_button(button, false);
        }
    }
}
