//! # Button Latch and Mode Codes
//!
//! Face buttons select a gait/mode on the higher-level controller. A button
//! latches on the cycle it goes from released to pressed, and each latched
//! press is consumed into exactly one non-zero [`ModeCode`]. Holding a button
//! therefore yields its code once, then [`ModeCode::None`] until it is
//! released and pressed again.
//!
//! Two different priority orders are involved:
//!
//! - **Latching** (which button wins when several are held): north > east > south > west
//! - **Resolution** (which latched bit becomes the code): south > east > west > north
//!
//! ## Usage
//!
//! ```
//! use joystick_vref::reference::latch::{ButtonLatch, FaceButtons, ModeCode};
//!
//! let mut latch = ButtonLatch::default();
//! let held = FaceButtons { south: true, ..FaceButtons::default() };
//!
//! latch.latch(held);
//! assert_eq!(latch.resolve(), ModeCode::South);
//!
//! // Still held on the next cycle: no new press
//! latch.latch(held);
//! assert_eq!(latch.resolve(), ModeCode::None);
//! ```

/// Pressed state of the four face buttons for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceButtons {
    /// Top button (Y / Triangle).
    pub north: bool,
    /// Right button (B / Circle).
    pub east: bool,
    /// Bottom button (A / Cross).
    pub south: bool,
    /// Left button (X / Square).
    pub west: bool,
}

/// One-shot mode selection emitted to the higher-level controller.
///
/// The discriminants are the wire codes the controller expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModeCode {
    /// No change requested.
    #[default]
    None = 0,
    /// South button: switch to gait 1.
    South = 1,
    /// East button: switch to gait 2.
    East = 2,
    /// West button: switch to gait 3.
    West = 3,
    /// North button: switch to gait 4.
    North = 4,
}

impl ModeCode {
    /// Numeric code in `0..=4`.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// True for every code except [`ModeCode::None`].
    #[must_use]
    pub fn is_change(self) -> bool {
        self != ModeCode::None
    }
}

impl From<ModeCode> for u8 {
    fn from(mode: ModeCode) -> Self {
        mode.code()
    }
}

/// Mutually exclusive latch over the four face buttons.
///
/// At most one flag is set at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLatch {
    north: bool,
    east: bool,
    south: bool,
    west: bool,
    /// Pressed state seen on the previous call to [`ButtonLatch::latch`].
    held: FaceButtons,
}

impl ButtonLatch {
    /// Latches the highest-priority newly pressed button
    /// (north > east > south > west), clearing the other three.
    ///
    /// Buttons already held on the previous call do not latch again. If no
    /// button was newly pressed the latch is left untouched.
    pub fn latch(&mut self, pressed: FaceButtons) {
        let held = self.held;
        self.held = pressed;

        let (north, east, south, west) = (
            pressed.north && !held.north,
            pressed.east && !held.east,
            pressed.south && !held.south,
            pressed.west && !held.west,
        );
        if !(north || east || south || west) {
            return;
        }

        self.north = north;
        self.east = !north && east;
        self.south = !north && !east && south;
        self.west = !north && !east && !south && west;
    }

    /// Resolves the latch into a mode code (south > east > west > north) and
    /// clears only the bit that produced it.
    pub fn resolve(&mut self) -> ModeCode {
        if self.south {
            self.south = false;
            ModeCode::South
        } else if self.east {
            self.east = false;
            ModeCode::East
        } else if self.west {
            self.west = false;
            ModeCode::West
        } else if self.north {
            self.north = false;
            ModeCode::North
        } else {
            ModeCode::None
        }
    }

    /// Currently latched buttons.
    #[must_use]
    pub fn latched(&self) -> FaceButtons {
        FaceButtons {
            north: self.north,
            east: self.east,
            south: self.south,
            west: self.west,
        }
    }

    /// True if no button is latched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.north || self.east || self.south || self.west)
    }

    /// Builds a latch with arbitrary bits set, bypassing the exclusivity of
    /// [`ButtonLatch::latch`]. Only used to exercise resolution priority.
    #[cfg(test)]
    pub(crate) fn from_bits(bits: FaceButtons) -> Self {
        Self {
            north: bits.north,
            east: bits.east,
            south: bits.south,
            west: bits.west,
            held: FaceButtons::default(),
        }
    }
}

/// Sticky requests raised by the start and back buttons.
///
/// Never cleared by the filter; the consumer acknowledges them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFlags {
    /// Set once start has been seen pressed.
    pub reset_requested: bool,
    /// Set once back has been seen pressed.
    pub stop_requested: bool,
}
