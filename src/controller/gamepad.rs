//! # Gamepad Device Module
//!
//! Opens a gamepad through the Linux evdev interface and runs the acquisition
//! thread that keeps a [`SharedGamepad`] snapshot current.
//!
//! ## Device Detection
//!
//! Without an explicit path, every `/dev/input/event*` device is scanned in
//! sorted order and the first one exposing both `BTN_SOUTH` and `ABS_X` is
//! used.
//!
//! ## Axis Ranges
//!
//! Drivers report sticks in different ranges (hid-playstation uses 0-255,
//! xpad uses -32768..32767). The range of each stick axis is read from the
//! device's absinfo when acquisition starts and handed to the
//! [`EventMapper`], so a centred stick encodes to the neutral raw value on
//! every pad. An axis whose absinfo is missing or degenerate keeps the 0-255
//! assumption.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use super::calibration::AxisRange;
use super::mapper::{abs_code, EventMapper};
use super::source::Axis;
use crate::error::{Result, VrefError};

/// Directory scanned for input devices.
const INPUT_DIR: &str = "/dev/input";

/// Gamepad handle
///
/// Represents an open evdev gamepad. Consumed by
/// [`spawn_acquisition`](Gamepad::spawn_acquisition).
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.device.name())
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Open a gamepad
    ///
    /// # Arguments
    ///
    /// * `device_path` - Explicit `/dev/input/eventX` path, or `None` to auto-detect
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no device exposes gamepad buttons and sticks
    /// - `Controller`: the explicit path cannot be opened, or `/dev/input` is unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joystick_vref::controller::gamepad::Gamepad;
    ///
    /// let pad = Gamepad::open(None)?;
    /// println!("Connected to gamepad at: {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device_path: Option<&str>) -> Result<Self> {
        match device_path {
            Some(path) => Self::open_path(Path::new(path)),
            None => Self::detect(),
        }
    }

    fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            VrefError::Controller(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if !is_gamepad(&device) {
            warn!(
                "{} does not report BTN_SOUTH/ABS_X, using it anyway",
                path.display()
            );
        }

        let device_path = path.to_string_lossy().to_string();
        info!("Opened gamepad at: {}", device_path);
        Ok(Self {
            device,
            device_path,
        })
    }

    fn detect() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(VrefError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| VrefError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                VrefError::Controller(format!("Failed to read directory entry: {}", e))
            })?;

        // Deterministic selection when several pads are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found gamepad \"{}\" at: {}",
                            device.name().unwrap_or("unnamed"),
                            device_path
                        );
                        return Ok(Self {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(VrefError::ControllerNotFound)
    }

    /// Get the device path of this gamepad
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name reported by the driver
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Value ranges the device reports for each stick axis
    ///
    /// Falls back to [`AxisRange::EIGHT_BIT`] for an axis whose absinfo
    /// cannot be read or is too narrow to have a centre.
    pub fn axis_ranges(&self) -> [(Axis, AxisRange); 3] {
        let state = match self.device.get_abs_state() {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Could not read axis ranges from {}: {}", self.device_path, e);
                None
            }
        };

        Axis::ALL.map(|axis| {
            let range = state
                .as_ref()
                .and_then(|state| state.get(usize::from(abs_code(axis).0)))
                .and_then(|info| AxisRange::new(info.minimum, info.maximum))
                .unwrap_or_else(|| {
                    warn!("{:?} axis has no usable range, assuming 0-255", axis);
                    AxisRange::EIGHT_BIT
                });
            (axis, range)
        })
    }

    /// Start the acquisition thread
    ///
    /// Applies the device's [`axis_ranges`](Self::axis_ranges) to `mapper`,
    /// then moves the device onto a dedicated thread that blocks on evdev
    /// reads and feeds every event to `mapper`. When the device fails (unplugged,
    /// permission revoked) the thread publishes a neutral sample and exits.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn spawn_acquisition(self, mut mapper: EventMapper) -> Result<JoinHandle<()>> {
        for (axis, range) in self.axis_ranges() {
            debug!("{:?} axis range {}..={}", axis, range.min(), range.max());
            mapper.set_axis_range(axis, range);
        }

        let Gamepad {
            mut device,
            device_path,
        } = self;

        let handle = std::thread::Builder::new()
            .name("gamepad-acquisition".to_string())
            .spawn(move || {
                info!("Gamepad acquisition started on {}", device_path);
                loop {
                    match device.fetch_events() {
                        Ok(events) => {
                            for event in events {
                                mapper.process_event(&event);
                            }
                        }
                        Err(e) => {
                            warn!("Gamepad {} read failed: {}", device_path, e);
                            mapper.reset();
                            break;
                        }
                    }
                }
                info!("Gamepad acquisition stopped");
            })?;

        Ok(handle)
    }
}

/// True if the device exposes the face buttons and a left stick.
fn is_gamepad(device: &Device) -> bool {
    let has_buttons = device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_SOUTH))
        .unwrap_or(false);
    let has_stick = device
        .supported_absolute_axes()
        .map(|axes| axes.contains(AbsoluteAxisType::ABS_X))
        .unwrap_or(false);
    has_buttons && has_stick
}
