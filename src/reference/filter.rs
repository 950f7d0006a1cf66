//! # Velocity Reference Filter
//!
//! Turns one gamepad sample per control cycle into:
//!
//! - a smoothed 6-DoF velocity reference in the robot's local frame,
//! - a one-shot [`ModeCode`] from the face buttons,
//! - sticky reset/stop requests from start/back.
//!
//! ## Per-cycle Pipeline
//!
//! 1. On cycle 0, write the calibration-neutral raw value to the three axes.
//! 2. Normalize forward, lateral and yaw axes via the [`CalibrationMode`].
//! 3. Scale: `vX = forward * vx_scale`, `vY = lateral * vy_scale`, `vYaw = yaw * vyaw_scale`.
//! 4. Remap into the body frame: `[-vY, -vX, 0, 0, 0, -vYaw]`.
//! 5. Dead zone each component.
//! 6. Blend: `reference = alpha * sample + (1 - alpha) * reference`.
//! 7. Latch newly pressed face buttons, resolve the mode code, raise sticky flags.
//!
//! The update does no I/O, never allocates and never fails.
//!
//! ## Usage
//!
//! ```
//! use joystick_vref::controller::source::{Axis, SharedGamepad};
//! use joystick_vref::reference::filter::VelocityReferenceFilter;
//! use joystick_vref::reference::latch::ModeCode;
//!
//! let pad = SharedGamepad::new();
//! let mut filter = VelocityReferenceFilter::default();
//!
//! let (reference, mode) = filter.update(&pad, 0);
//! assert!(reference.is_zero());
//! assert_eq!(mode, ModeCode::None);
//!
//! // Full deflection on the forward axis
//! pad.set_axis(Axis::Forward, 0.0078125);
//! filter.update(&pad, 1);
//! assert_eq!(filter.raw_sample().as_array()[1], -0.75);
//! ```

use tracing::{debug, trace};

use super::latch::{ButtonLatch, ControlFlags, FaceButtons, ModeCode};
use super::vector::VelocityVector;
use crate::controller::calibration::{apply_dead_zone, CalibrationMode};
use crate::controller::source::{Axis, Button, InputDeviceSource};

/// Gains from normalized stick deflection to physical velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    /// Forward/back gain (m/s at full deflection).
    pub vx: f64,
    /// Left/right gain (m/s at full deflection).
    pub vy: f64,
    /// Yaw-rate gain (rad/s at full deflection).
    pub vyaw: f64,
    /// Vertical gain. Carried for consumers; the base remap keeps vertical at zero.
    pub vz: f64,
}

impl Default for AxisScale {
    fn default() -> Self {
        Self {
            vx: 0.75,
            vy: 1.0,
            vyaw: 0.8,
            vz: 0.3,
        }
    }
}

/// Construction parameters for [`VelocityReferenceFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Per-axis velocity gains.
    pub scale: AxisScale,
    /// Low-pass coefficient in (0, 1]. Smaller is slower.
    pub smoothing_alpha: f64,
    /// Velocity magnitude below which a component is forced to zero.
    pub dead_zone: f64,
    /// Raw axis interpretation.
    pub calibration: CalibrationMode,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            scale: AxisScale::default(),
            smoothing_alpha: 0.003,
            dead_zone: 0.3,
            calibration: CalibrationMode::default(),
        }
    }
}

/// Smoothed velocity reference plus button/mode state.
#[derive(Debug, Clone)]
pub struct VelocityReferenceFilter {
    params: FilterParams,
    raw_sample: VelocityVector,
    filtered_reference: VelocityVector,
    latch: ButtonLatch,
    flags: ControlFlags,
}

impl Default for VelocityReferenceFilter {
    fn default() -> Self {
        Self::new(FilterParams::default())
    }
}

impl VelocityReferenceFilter {
    /// Creates a filter with zero reference, empty latch and cleared flags.
    #[must_use]
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            raw_sample: VelocityVector::zero(),
            filtered_reference: VelocityVector::zero(),
            latch: ButtonLatch::default(),
            flags: ControlFlags::default(),
        }
    }

    /// Writes the calibration-neutral raw value to the three primary axes.
    ///
    /// Called automatically by [`update`](Self::update) on cycle 0.
    pub fn initialize<S: InputDeviceSource + ?Sized>(&self, source: &S) {
        let neutral = self.params.calibration.neutral_raw();
        for axis in Axis::ALL {
            source.reset_axis(axis, neutral);
        }
        debug!(neutral, "Gamepad axes reset to neutral");
    }

    /// Runs one control cycle.
    ///
    /// `cycle` only matters when it is 0, which triggers [`initialize`](Self::initialize).
    ///
    /// # Returns
    ///
    /// The updated filtered reference and the mode code for this cycle.
    pub fn update<S: InputDeviceSource + ?Sized>(
        &mut self,
        source: &S,
        cycle: u64,
    ) -> (VelocityVector, ModeCode) {
        if cycle == 0 {
            self.initialize(source);
        }

        let calibration = self.params.calibration;
        let scale = self.params.scale;
        let forward = calibration.normalize(source.read_axis(Axis::Forward));
        let lateral = calibration.normalize(source.read_axis(Axis::Lateral));
        let yaw = calibration.normalize(source.read_axis(Axis::Yaw));

        let vx = forward * scale.vx;
        let vy = lateral * scale.vy;
        let vyaw = yaw * scale.vyaw;

        let dead_zone = self.params.dead_zone;
        self.raw_sample = VelocityVector::new([-vy, -vx, 0.0, 0.0, 0.0, -vyaw])
            .map(|c| apply_dead_zone(c, dead_zone));

        self.filtered_reference = self
            .filtered_reference
            .blend(&self.raw_sample, self.params.smoothing_alpha);

        self.latch.latch(FaceButtons {
            north: source.read_button(Button::North),
            east: source.read_button(Button::East),
            south: source.read_button(Button::South),
            west: source.read_button(Button::West),
        });
        let mode = self.latch.resolve();
        if mode.is_change() {
            debug!(cycle, code = mode.code(), "Mode change requested");
        }

        if source.read_button(Button::Start) && !self.flags.reset_requested {
            self.flags.reset_requested = true;
            debug!(cycle, "Reset requested");
        }
        if source.read_button(Button::Back) && !self.flags.stop_requested {
            self.flags.stop_requested = true;
            debug!(cycle, "Stop requested");
        }

        trace!(cycle, reference = ?self.filtered_reference, "Cycle updated");
        (self.filtered_reference, mode)
    }

    /// Latest dead-zoned, unsmoothed velocity sample.
    #[must_use]
    pub fn raw_sample(&self) -> VelocityVector {
        self.raw_sample
    }

    /// Current smoothed velocity reference.
    #[must_use]
    pub fn filtered_reference(&self) -> VelocityVector {
        self.filtered_reference
    }

    /// Sticky reset/stop requests.
    #[must_use]
    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    /// Current button latch.
    #[must_use]
    pub fn latch(&self) -> ButtonLatch {
        self.latch
    }

    /// Construction parameters.
    #[must_use]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Acknowledges a reset request.
    pub fn clear_reset_request(&mut self) {
        self.flags.reset_requested = false;
    }

    /// Acknowledges a stop request.
    pub fn clear_stop_request(&mut self) {
        self.flags.stop_requested = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::calibration::{DEFAULT_RAW_CENTER, DEFAULT_RAW_SPAN};
    use crate::controller::source::{MockInputDeviceSource, SharedGamepad};
    use crate::reference::vector::{components, DOF};
    use mockall::predicate::eq;

    /// Pad already past cycle 0, every axis neutral.
    fn neutral_pad() -> SharedGamepad {
        let pad = SharedGamepad::new();
        for axis in Axis::ALL {
            pad.set_axis(axis, DEFAULT_RAW_CENTER);
        }
        pad
    }

    /// Raw bipolar value producing the given normalized deflection.
    fn raw_for(normalized: f64) -> f64 {
        (normalized + 1.0) * DEFAULT_RAW_CENTER
    }

    // ==================== Initialization Tests ====================

    #[test]
    fn test_new_filter_is_neutral() {
        let filter = VelocityReferenceFilter::default();
        assert!(filter.filtered_reference().is_zero());
        assert!(filter.raw_sample().is_zero());
        assert!(filter.latch().is_empty());
        assert_eq!(filter.flags(), ControlFlags::default());
        assert_eq!(filter.params(), &FilterParams::default());
    }

    #[test]
    fn test_default_params() {
        let params = FilterParams::default();
        assert_eq!(params.scale.vx, 0.75);
        assert_eq!(params.scale.vy, 1.0);
        assert_eq!(params.scale.vyaw, 0.8);
        assert_eq!(params.scale.vz, 0.3);
        assert_eq!(params.smoothing_alpha, 0.003);
        assert_eq!(params.dead_zone, 0.3);
        assert_eq!(params.calibration, CalibrationMode::default());
    }

    #[test]
    fn test_cycle_zero_resets_axes_to_neutral() {
        let mut source = MockInputDeviceSource::new();
        for axis in Axis::ALL {
            source
                .expect_reset_axis()
                .with(eq(axis), eq(DEFAULT_RAW_CENTER))
                .times(1)
                .return_const(());
        }
        source.expect_read_axis().return_const(DEFAULT_RAW_CENTER);
        source.expect_read_button().return_const(false);

        let mut filter = VelocityReferenceFilter::default();
        let (reference, mode) = filter.update(&source, 0);
        assert!(reference.is_zero());
        assert_eq!(mode, ModeCode::None);
    }

    #[test]
    fn test_later_cycles_do_not_reset_axes() {
        let mut source = MockInputDeviceSource::new();
        source.expect_reset_axis().times(0);
        source.expect_read_axis().return_const(DEFAULT_RAW_CENTER);
        source.expect_read_button().return_const(false);

        let mut filter = VelocityReferenceFilter::default();
        filter.update(&source, 1);
        filter.update(&source, 2);
    }

    #[test]
    fn test_cycle_zero_direct_mode_resets_to_zero() {
        let mut source = MockInputDeviceSource::new();
        source
            .expect_reset_axis()
            .with(mockall::predicate::always(), eq(0.0))
            .times(3)
            .return_const(());
        source.expect_read_axis().return_const(0.0);
        source.expect_read_button().return_const(false);

        let mut filter = VelocityReferenceFilter::new(FilterParams {
            calibration: CalibrationMode::Direct,
            ..FilterParams::default()
        });
        filter.update(&source, 0);
    }

    #[test]
    fn test_uninitialised_zero_reading_is_not_full_deflection() {
        // A fresh pad reads 0.0, which is full negative deflection in
        // bipolar-from-unsigned mode. Cycle 0 must neutralise it first.
        let pad = SharedGamepad::new();
        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 0);
        assert!(filter.raw_sample().is_zero());
        assert_eq!(pad.read_axis(Axis::Forward), DEFAULT_RAW_CENTER);
    }

    // ==================== Axis Mapping Tests ====================

    #[test]
    fn test_full_forward_deflection_scenario() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Forward, DEFAULT_RAW_SPAN);

        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 1);

        let sample = filter.raw_sample();
        assert_eq!(sample[components::LINEAR_Y], -0.75);
        assert_eq!(sample[components::LINEAR_X], 0.0);
        assert_eq!(sample[components::YAW], 0.0);
    }

    #[test]
    fn test_neutral_axis_scenario() {
        let pad = neutral_pad();
        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 1);
        assert!(filter.raw_sample().is_zero());
    }

    #[test]
    fn test_lateral_and_yaw_remap() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Lateral, raw_for(1.0));
        pad.set_axis(Axis::Yaw, raw_for(-1.0));

        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 1);

        let sample = filter.raw_sample();
        assert_eq!(sample[components::LINEAR_X], -1.0);
        assert_eq!(sample[components::YAW], 0.8);
    }

    #[test]
    fn test_vertical_roll_pitch_always_zero() {
        let pad = neutral_pad();
        for axis in Axis::ALL {
            pad.set_axis(axis, raw_for(1.0));
        }
        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 1);

        let sample = filter.raw_sample();
        assert_eq!(sample[components::LINEAR_Z], 0.0);
        assert_eq!(sample[components::ROLL], 0.0);
        assert_eq!(sample[components::PITCH], 0.0);
    }

    #[test]
    fn test_direct_mode_mapping() {
        let pad = SharedGamepad::new();
        let mut filter = VelocityReferenceFilter::new(FilterParams {
            calibration: CalibrationMode::Direct,
            ..FilterParams::default()
        });
        filter.update(&pad, 0);

        pad.set_axis(Axis::Forward, -1.0);
        filter.update(&pad, 1);
        assert_eq!(filter.raw_sample()[components::LINEAR_Y], 0.75);
    }

    #[test]
    fn test_custom_scale() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Yaw, raw_for(1.0));

        let mut filter = VelocityReferenceFilter::new(FilterParams {
            scale: AxisScale { vyaw: 2.0, ..AxisScale::default() },
            ..FilterParams::default()
        });
        filter.update(&pad, 1);
        assert_eq!(filter.raw_sample()[components::YAW], -2.0);
    }

    // ==================== Dead Zone Tests ====================

    #[test]
    fn test_dead_zone_zeroes_small_components() {
        let pad = neutral_pad();
        // 0.25 * 1.0 lateral gain = 0.25 < 0.3
        pad.set_axis(Axis::Lateral, raw_for(0.25));
        // 0.25 * 0.75 forward gain = 0.1875 < 0.3
        pad.set_axis(Axis::Forward, raw_for(-0.25));

        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 1);
        assert!(filter.raw_sample().is_zero());
        assert!(filter.filtered_reference().is_zero());
    }

    #[test]
    fn test_dead_zone_passes_large_components_unscaled() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Lateral, raw_for(0.5));

        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 1);
        assert_eq!(filter.raw_sample()[components::LINEAR_X], -0.5);
    }

    #[test]
    fn test_dead_zone_boundary_passes() {
        let pad = SharedGamepad::new();
        let mut filter = VelocityReferenceFilter::new(FilterParams {
            calibration: CalibrationMode::Direct,
            dead_zone: 0.5,
            ..FilterParams::default()
        });
        filter.update(&pad, 0);

        // lateral gain 1.0: -0.5 lands exactly on the boundary
        pad.set_axis(Axis::Lateral, 0.5);
        filter.update(&pad, 1);
        assert_eq!(filter.raw_sample()[components::LINEAR_X], -0.5);
    }

    // ==================== Smoothing Tests ====================

    #[test]
    fn test_reference_is_exact_convex_combination() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Forward, raw_for(1.0));
        pad.set_axis(Axis::Lateral, raw_for(-1.0));
        pad.set_axis(Axis::Yaw, raw_for(0.5));

        let mut filter = VelocityReferenceFilter::default();
        let alpha = filter.params().smoothing_alpha;

        for cycle in 1..20 {
            let previous = filter.filtered_reference();
            let (reference, _) = filter.update(&pad, cycle);
            let sample = filter.raw_sample();
            for i in 0..DOF {
                assert_eq!(reference[i], alpha * sample[i] + (1.0 - alpha) * previous[i]);
            }
        }
    }

    #[test]
    fn test_first_cycle_after_step_is_alpha_weighted() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Lateral, raw_for(1.0));

        let mut filter = VelocityReferenceFilter::default();
        let (reference, _) = filter.update(&pad, 1);
        assert_eq!(reference[components::LINEAR_X], 0.003 * -1.0 + (1.0 - 0.003) * 0.0);
    }

    #[test]
    fn test_alpha_one_tracks_sample() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Lateral, raw_for(1.0));

        let mut filter = VelocityReferenceFilter::new(FilterParams {
            smoothing_alpha: 1.0,
            ..FilterParams::default()
        });
        let (reference, _) = filter.update(&pad, 1);
        assert_eq!(reference, filter.raw_sample());
    }

    #[test]
    fn test_neutral_input_decays_monotonically() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Lateral, raw_for(1.0));
        pad.set_axis(Axis::Yaw, raw_for(-1.0));

        let mut filter = VelocityReferenceFilter::default();
        for cycle in 1..500 {
            filter.update(&pad, cycle);
        }

        pad.set_axis(Axis::Lateral, DEFAULT_RAW_CENTER);
        pad.set_axis(Axis::Yaw, DEFAULT_RAW_CENTER);

        let mut previous = filter.filtered_reference();
        for cycle in 500..3000 {
            let (reference, _) = filter.update(&pad, cycle);
            for i in 0..DOF {
                assert!(reference[i].abs() <= previous[i].abs());
                // never overshoots through zero
                assert!(reference[i] == 0.0 || reference[i].signum() == previous[i].signum());
            }
            previous = reference;
        }
        assert!(previous[components::LINEAR_X].abs() < 0.01);
    }

    // ==================== Mode Code Tests ====================

    #[test]
    fn test_held_south_is_one_shot() {
        let pad = neutral_pad();
        pad.set_button(Button::South, true);

        let mut filter = VelocityReferenceFilter::default();
        let (_, first) = filter.update(&pad, 1);
        assert_eq!(first, ModeCode::South);
        assert_eq!(first.code(), 1);

        // Still physically held
        let (_, second) = filter.update(&pad, 2);
        assert_eq!(second, ModeCode::None);

        pad.set_button(Button::South, false);
        let (_, third) = filter.update(&pad, 3);
        assert_eq!(third, ModeCode::None);

        pad.set_button(Button::South, true);
        let (_, fourth) = filter.update(&pad, 4);
        assert_eq!(fourth, ModeCode::South);
    }

    #[test]
    fn test_different_button_overrides_while_held() {
        let pad = neutral_pad();
        pad.set_button(Button::South, true);

        let mut filter = VelocityReferenceFilter::default();
        assert_eq!(filter.update(&pad, 1).1, ModeCode::South);

        pad.set_button(Button::East, true);
        assert_eq!(filter.update(&pad, 2).1, ModeCode::East);
        assert_eq!(filter.update(&pad, 3).1, ModeCode::None);
    }

    #[test]
    fn test_each_face_button_code() {
        for (button, code) in [
            (Button::South, 1),
            (Button::East, 2),
            (Button::West, 3),
            (Button::North, 4),
        ] {
            let pad = neutral_pad();
            pad.set_button(button, true);
            let mut filter = VelocityReferenceFilter::default();
            let (_, mode) = filter.update(&pad, 1);
            assert_eq!(mode.code(), code, "{:?} should map to {}", button, code);
        }
    }

    #[test]
    fn test_simultaneous_press_latches_north() {
        let pad = neutral_pad();
        pad.set_button(Button::South, true);
        pad.set_button(Button::North, true);

        let mut filter = VelocityReferenceFilter::default();
        let (_, mode) = filter.update(&pad, 1);
        assert_eq!(mode, ModeCode::North);
        assert!(filter.latch().is_empty());
    }

    #[test]
    fn test_release_yields_none() {
        let pad = neutral_pad();
        let mut filter = VelocityReferenceFilter::default();
        for cycle in 1..10 {
            let (_, mode) = filter.update(&pad, cycle);
            assert_eq!(mode, ModeCode::None);
        }
    }

    // ==================== Sticky Flag Tests ====================

    #[test]
    fn test_reset_flag_is_sticky() {
        let pad = neutral_pad();
        let mut filter = VelocityReferenceFilter::default();

        pad.set_button(Button::Start, true);
        filter.update(&pad, 1);
        assert!(filter.flags().reset_requested);
        assert!(!filter.flags().stop_requested);

        pad.set_button(Button::Start, false);
        for cycle in 2..10 {
            filter.update(&pad, cycle);
            assert!(filter.flags().reset_requested);
        }
    }

    #[test]
    fn test_stop_flag_is_sticky() {
        let pad = neutral_pad();
        let mut filter = VelocityReferenceFilter::default();

        pad.set_button(Button::Back, true);
        filter.update(&pad, 1);
        pad.set_button(Button::Back, false);
        filter.update(&pad, 2);
        assert!(filter.flags().stop_requested);
    }

    #[test]
    fn test_flags_cleared_by_consumer() {
        let pad = neutral_pad();
        pad.set_button(Button::Start, true);
        pad.set_button(Button::Back, true);

        let mut filter = VelocityReferenceFilter::default();
        filter.update(&pad, 1);
        filter.clear_reset_request();
        filter.clear_stop_request();
        assert_eq!(filter.flags(), ControlFlags::default());

        // Raised again while still held
        filter.update(&pad, 2);
        assert!(filter.flags().reset_requested);
        assert!(filter.flags().stop_requested);
    }

    #[test]
    fn test_flags_do_not_affect_mode_code() {
        let pad = neutral_pad();
        pad.set_button(Button::Start, true);
        pad.set_button(Button::Back, true);

        let mut filter = VelocityReferenceFilter::default();
        let (_, mode) = filter.update(&pad, 1);
        assert_eq!(mode, ModeCode::None);
    }

    // ==================== Robustness Tests ====================

    #[test]
    fn test_out_of_range_raw_is_tolerated() {
        let pad = neutral_pad();
        pad.set_axis(Axis::Lateral, 1.0e6);
        pad.set_axis(Axis::Yaw, f64::NAN);

        let mut filter = VelocityReferenceFilter::default();
        let (reference, _) = filter.update(&pad, 1);
        assert!(reference[components::LINEAR_X] < 0.0);
        assert!(reference[components::YAW].is_nan());
    }
}
