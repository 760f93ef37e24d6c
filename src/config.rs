//! Session configuration.
//!
//! All settings have defaults that work with stock boards, so the simplest
//! usage is `Config::default()`. The baud rate is not configurable; every
//! board model runs at [`SB_BAUD`](crate::codec::SB_BAUD).

use std::time::Duration;

use crate::catalog::ListingShape;

/// Default per-read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(300);

/// Default pause after each command is written.
pub const DEFAULT_COMMAND_DELAY: Duration = Duration::from_millis(10);

/// How long the reset line is held low.
pub const DEFAULT_RESET_PULSE: Duration = Duration::from_millis(10);

/// How long the board takes to boot and print its banner after a reset.
pub const DEFAULT_BOOT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub read_timeout: Duration,
    pub listing_shape: ListingShape,
    /// Volume to apply on connect. `None` asks the board instead.
    pub initial_volume: Option<i32>,
    pub debug: bool,
    pub command_delay: Duration,
    pub reset_pulse: Duration,
    pub boot_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            read_timeout: DEFAULT_READ_TIMEOUT,
            listing_shape: ListingShape::Primary,
            initial_volume: None,
            debug: false,
            command_delay: DEFAULT_COMMAND_DELAY,
            reset_pulse: DEFAULT_RESET_PULSE,
            boot_delay: DEFAULT_BOOT_DELAY,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the timeout applied to each individual read (default: 300ms).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Select the file listing format spoken by the firmware.
    pub fn listing_shape(mut self, shape: ListingShape) -> Self {
        self.listing_shape = shape;
        self
    }

    /// Volume sent to the board when connecting. Clamped into range.
    pub fn initial_volume(mut self, volume: i32) -> Self {
        self.initial_volume = Some(volume);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the pause after each command (default: 10ms). Zero disables it.
    pub fn command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    pub fn reset_pulse(mut self, pulse: Duration) -> Self {
        self.reset_pulse = pulse;
        self
    }

    pub fn boot_delay(mut self, delay: Duration) -> Self {
        self.boot_delay = delay;
        self
    }
}
