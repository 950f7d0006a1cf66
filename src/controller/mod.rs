//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Publishing stick and button state into a lock-free snapshot
//! - Raw axis calibration and the velocity dead zone

pub mod calibration;
pub mod gamepad;
pub mod mapper;
pub mod source;
