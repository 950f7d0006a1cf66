//! # Joystick Velocity Reference Library
//!
//! Turn gamepad stick and button state into a smoothed body-frame velocity
//! reference for a legged robot's locomotion controller.
//!
//! This library provides the per-cycle reference filter (dead zone, scaling,
//! exponential smoothing), the one-shot gait/mode selector driven by the face
//! buttons, and the device plumbing and control loop around them.

pub mod config;
pub mod controller;
pub mod error;
pub mod reference;
pub mod runner;
pub mod telemetry;
