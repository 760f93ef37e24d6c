//! Volume arithmetic.
//!
//! Volume is a user convenience, so out-of-range requests are clamped rather
//! than rejected. Nothing here talks to the board; the session sends the
//! resulting value with a SET-VOLUME command.

use core::fmt;

use crate::codec::{MAX_VOL, MIN_VOL, VOLUME_STEP};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(u8);

impl Volume {
    pub const MIN: Volume = Volume(MIN_VOL);
    pub const MAX: Volume = Volume(MAX_VOL);

    /// Clamps any integer into `[MIN_VOL, MAX_VOL]`.
    pub fn clamped(value: i32) -> Self {
        let value = value.max(i32::from(MIN_VOL)).min(i32::from(MAX_VOL));
        Volume(value as u8)
    }

    /// Maps `percent` in `[0.0, 1.0]` linearly onto the volume range,
    /// rounding to the nearest step. Values outside `[0.0, 1.0]` are clamped.
    pub fn from_percent(percent: f32) -> Result<Self> {
        if percent.is_nan() {
            return Err(Error::InvalidArgument("volume percentage is NaN".into()));
        }
        let percent = percent.max(0.0).min(1.0);
        let span = f32::from(MAX_VOL - MIN_VOL);
        let value = f32::from(MIN_VOL) + percent * span;
        Ok(Volume::clamped(value.round() as i32))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn percent(self) -> f32 {
        f32::from(self.0 - MIN_VOL) / f32::from(MAX_VOL - MIN_VOL)
    }

    /// Raises the volume by `delta`, stopping at `MAX_VOL`.
    pub fn up(self, delta: u8) -> Self {
        Volume::clamped(i32::from(self.0) + i32::from(delta))
    }

    /// Lowers the volume in `VOLUME_STEP` decrements until it is strictly
    /// below `threshold`, stopping at `MIN_VOL`. Returns `self` unchanged if
    /// it is already below `threshold`.
    pub fn down_below(self, threshold: i32) -> Self {
        let current = i32::from(self.0);
        if current < threshold {
            return self;
        }
        if threshold <= i32::from(MIN_VOL) {
            return Volume::MIN;
        }
        let step = i32::from(VOLUME_STEP);
        let steps = (current - threshold) / step + 1;
        Volume::clamped(current - steps * step)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume::MIN
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, MAX_VOL)
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
