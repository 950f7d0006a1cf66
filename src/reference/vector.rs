//! # Velocity Vector
//!
//! Six-component velocity in the robot's local (body-fixed) frame:
//!
//! | Index | Component |
//! |-------|-----------|
//! | 0 | Linear X (forward) |
//! | 1 | Linear Y (lateral) |
//! | 2 | Linear Z (vertical) |
//! | 3 | Angular roll rate |
//! | 4 | Angular pitch rate |
//! | 5 | Angular yaw rate |

use std::ops::Index;

/// Number of components in a [`VelocityVector`].
pub const DOF: usize = 6;

/// Component indices for semantic access.
pub mod components {
    /// Linear X (forward)
    pub const LINEAR_X: usize = 0;
    /// Linear Y (lateral)
    pub const LINEAR_Y: usize = 1;
    /// Linear Z (vertical)
    pub const LINEAR_Z: usize = 2;
    /// Roll rate
    pub const ROLL: usize = 3;
    /// Pitch rate
    pub const PITCH: usize = 4;
    /// Yaw rate
    pub const YAW: usize = 5;
}

/// Ordered 6-tuple of velocities in the local frame.
///
/// # Examples
///
/// ```
/// use joystick_vref::reference::vector::{components, VelocityVector};
///
/// let v = VelocityVector::new([0.5, 0.0, 0.0, 0.0, 0.0, -0.2]);
/// assert_eq!(v[components::LINEAR_X], 0.5);
/// assert_eq!(v[components::YAW], -0.2);
/// assert!(VelocityVector::zero().is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityVector([f64; DOF]);

impl VelocityVector {
    /// Creates a vector from its six components.
    #[must_use]
    pub const fn new(components: [f64; DOF]) -> Self {
        Self(components)
    }

    /// The zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0.0; DOF])
    }

    /// Returns the components as an array.
    #[must_use]
    pub fn as_array(&self) -> &[f64; DOF] {
        &self.0
    }

    /// Returns true if every component is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }

    /// Applies `f` to every component.
    #[must_use]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }

    /// Exponential blend toward `sample`: `alpha * sample + (1 - alpha) * self`.
    ///
    /// The result is a convex combination of the two inputs for any
    /// `alpha` in (0, 1].
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_vref::reference::vector::VelocityVector;
    ///
    /// let previous = VelocityVector::zero();
    /// let sample = VelocityVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    /// let blended = previous.blend(&sample, 0.5);
    /// assert_eq!(blended.as_array()[0], 0.5);
    /// ```
    #[must_use]
    pub fn blend(&self, sample: &Self, alpha: f64) -> Self {
        let mut out = [0.0; DOF];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = alpha * sample.0[i] + (1.0 - alpha) * self.0[i];
        }
        Self(out)
    }
}

impl Index<usize> for VelocityVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl From<[f64; DOF]> for VelocityVector {
    fn from(components: [f64; DOF]) -> Self {
        Self(components)
    }
}

impl From<VelocityVector> for [f64; DOF] {
    fn from(v: VelocityVector) -> Self {
        v.0
    }
}
