//! # Reference Module
//!
//! Velocity reference generation for the higher-level locomotion controller.
//!
//! This module handles:
//! - Scaling and remapping stick deflection into a body-frame velocity
//! - Dead zone and exponential low-pass smoothing
//! - Face button latching into one-shot gait/mode codes
//! - Sticky reset and stop requests

pub mod filter;
pub mod latch;
pub mod vector;

pub use filter::{AxisScale, FilterParams, VelocityReferenceFilter};
pub use latch::{ButtonLatch, ControlFlags, FaceButtons, ModeCode};
pub use vector::VelocityVector;
