//! Driver for Adafruit style FX sound boards running in UART mode.
//!
//! The board takes single byte commands (optionally followed by a fixed
//! width argument) and answers each one with a short reply. It never sends
//! anything on its own, so the playback state kept by [`Soundboard`] is a
//! prediction based on the commands that were issued: a track that finishes
//! by itself still reads as `Playing`.
//!
//! ```no_run
//! use fx_soundboard::{Config, SerialTransport, Soundboard, TrackRef};
//!
//! # fn example() -> fx_soundboard::Result<()> {
//! let port = SerialTransport::open("/dev/ttyUSB0")?;
//! let mut board = Soundboard::connect(port, Config::default().initial_volume(150))?;
//! for entry in board.list_files(false)? {
//!     println!("{} {} {}", entry.index(), entry.filename(), entry.size());
//! }
//! board.play_now(&TrackRef::filename("T00     OGG")?)?;
//! # Ok(())
//! # }
//! ```

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use pretty_hex::*;

#[macro_use]
pub mod macros;

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod serial;
pub mod track;
pub mod traits;
pub mod volume;

#[cfg(test)]
mod testutils;

pub use catalog::{FileCatalog, ListingShape, TrackEntry};
pub use codec::{BootBanner, TrackSize, TrackTime, MAX_VOL, MIN_VOL, SB_BAUD};
pub use config::Config;
pub use error::{Error, Result};
pub use serial::{ResetLine, SerialTransport};
pub use track::{Filename, TrackRef};
pub use traits::Transport;
pub use volume::Volume;

use codec::{Command, FrameReader, PlayStatus};

/// What the driver believes the board is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Stopped
    }
}

/// A session with one sound board.
///
/// Every operation sends one command and waits for its complete reply before
/// returning, so a session handles one command at a time. Share it between
/// threads by wrapping it in a `Mutex`.
///
/// Each operation either succeeds and updates the tracked state, or fails
/// and leaves it as it was. `play_now` and `reset` are the exceptions, see
/// their docs.
pub struct Soundboard<T: Transport> {
    transport: T,
    config: Config,
    volume: Volume,
    volume_synced: bool,
    state: PlaybackState,
    catalog: Option<FileCatalog>,
    debug: bool,
    closed: bool,
}

impl<T: Transport> Soundboard<T> {
    /// Wraps an open transport without talking to the board. The tracked
    /// volume starts at `MIN_VOL`, unsynced, until it is set.
    pub fn new(transport: T, config: Config) -> Self {
        let debug = config.debug;
        Soundboard {
            transport,
            config,
            volume: Volume::MIN,
            volume_synced: false,
            state: PlaybackState::Stopped,
            catalog: None,
            debug,
            closed: false,
        }
    }

    /// Wraps an open transport and synchronizes the volume: the configured
    /// initial volume is sent to the board, or if there is none, the board
    /// is stepped down once and the level it reports is adopted.
    pub fn connect(transport: T, config: Config) -> Result<Self> {
        let mut board = Soundboard::new(transport, config);
        match board.config.initial_volume {
            Some(volume) => {
                board.set_volume(volume)?;
            }
            None => {
                board.volume_step_down()?;
            }
        }
        info!("Connected, volume {}", board.volume);
        Ok(board)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The tracked volume. While `is_volume_synced` is false this is the
    /// level the session wants, not one the board has confirmed.
    pub fn get_volume(&self) -> u8 {
        self.volume.value()
    }

    /// True once the board has confirmed the tracked volume. Goes false when
    /// a reset leaves the board at its boot default.
    pub fn is_volume_synced(&self) -> bool {
        self.volume_synced
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The cached listing, if one has been fetched since the last reset.
    pub fn catalog(&self) -> Option<&FileCatalog> {
        self.catalog.as_ref()
    }

    pub fn invalidate_catalog(&mut self) {
        self.catalog = None;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Sets the debug trace flag, or flips it when `on` is `None`. Returns
    /// the new setting.
    pub fn toggle_debug(&mut self, on: Option<bool>) -> bool {
        self.debug = on.unwrap_or(!self.debug);
        self.debug
    }

    /// Stops all further I/O. Every later call fails with `TransportClosed`.
    pub fn close(&mut self) {
        self.closed = true;
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// Starts a track. A track that is already playing is not stopped first;
    /// what the board does with the overlap is up to its firmware.
    pub fn play(&mut self, track: &TrackRef) -> Result<()> {
        let arg = track.resolve()?;
        self.ensure_open()?;
        let result = self.send_play(track, Command::Play(arg));
        self.latch(result)?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Stops whatever is playing, then starts `track`.
    ///
    /// If the stop goes through but the play fails, the board is left
    /// stopped and the tracked state says so.
    pub fn play_now(&mut self, track: &TrackRef) -> Result<()> {
        let arg = track.resolve()?;
        self.ensure_open()?;
        let [stop, play] = codec::play_now(arg);
        let result = self.send_ack(&stop);
        self.latch(result)?;
        self.state = PlaybackState::Stopped;
        let result = self.send_play(track, play);
        self.latch(result)?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.ensure_open()?;
        let result = self.send_ack(&Command::Stop);
        self.latch(result)?;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.require_state("pause", PlaybackState::Playing)?;
        self.ensure_open()?;
        let result = self.send_ack(&Command::Pause);
        self.latch(result)?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<()> {
        self.require_state("unpause", PlaybackState::Paused)?;
        self.ensure_open()?;
        let result = self.send_ack(&Command::Unpause);
        self.latch(result)?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Elapsed and total time of the current track.
    pub fn track_time(&mut self) -> Result<TrackTime> {
        self.ensure_open()?;
        let result = self
            .exchange(&Command::TrackTime, codec::TRACK_TIME_LEN)
            .and_then(|reply| codec::decode_track_time(&reply));
        self.latch(result)
    }

    /// Remaining and total size of the current track.
    pub fn track_size(&mut self) -> Result<TrackSize> {
        self.ensure_open()?;
        let result = self
            .exchange(&Command::TrackSize, codec::TRACK_SIZE_LEN)
            .and_then(|reply| codec::decode_track_size(&reply));
        self.latch(result)
    }

    // -----------------------------------------------------------------------
    // Volume
    // -----------------------------------------------------------------------

    /// Sets the volume, clamping `value` into `[MIN_VOL, MAX_VOL]`.
    pub fn set_volume(&mut self, value: i32) -> Result<u8> {
        self.apply_volume(Volume::clamped(value))
    }

    /// Sets the volume as a fraction of the full range, `0.0..=1.0`.
    pub fn set_volume_percent(&mut self, percent: f32) -> Result<u8> {
        let target = Volume::from_percent(percent)?;
        self.apply_volume(target)
    }

    /// Raises the volume by `delta`, stopping at `MAX_VOL`.
    pub fn volume_up(&mut self, delta: u8) -> Result<u8> {
        let target = self.volume.up(delta);
        self.apply_volume(target)
    }

    /// Has the board raise its volume by one step and adopts the level it
    /// reports.
    pub fn volume_step_up(&mut self) -> Result<u8> {
        self.step_volume(Command::VolumeUp)
    }

    /// Has the board lower its volume by one step and adopts the level it
    /// reports.
    pub fn volume_step_down(&mut self) -> Result<u8> {
        self.step_volume(Command::VolumeDown)
    }

    /// Lowers the volume until it is below `threshold` (or at `MIN_VOL`).
    /// Nothing is sent if it already is.
    pub fn volume_down(&mut self, threshold: i32) -> Result<u8> {
        let target = self.volume.down_below(threshold);
        if target == self.volume {
            return Ok(self.volume.value());
        }
        self.apply_volume(target)
    }

    fn apply_volume(&mut self, target: Volume) -> Result<u8> {
        self.ensure_open()?;
        let requested = target.value();
        let result = self
            .exchange(&Command::SetVolume(requested), 1)
            .and_then(|reply| codec::decode_volume_echo(requested, &reply));
        let echoed = self.latch(result)?;
        self.volume = target;
        self.volume_synced = true;
        Ok(echoed)
    }

    fn step_volume(&mut self, command: Command) -> Result<u8> {
        self.ensure_open()?;
        let result = self
            .exchange(&command, 1)
            .and_then(|reply| codec::decode_volume(&reply));
        let volume = self.latch(result)?;
        self.volume = Volume::clamped(i32::from(volume));
        self.volume_synced = true;
        Ok(volume)
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// Returns the files on the board, fetching the listing if there is no
    /// cached copy or `force_refresh` is set. The cache is only replaced
    /// once a complete listing has been read.
    pub fn list_files(&mut self, force_refresh: bool) -> Result<&FileCatalog> {
        if force_refresh || self.catalog.is_none() {
            self.ensure_open()?;
            let result = self.fetch_catalog();
            let catalog = self.latch(result)?;
            info!("Board has {} files", catalog.len());
            self.catalog = Some(catalog);
        }
        Ok(self.catalog.get_or_insert_with(FileCatalog::default))
    }

    /// Looks up a listed file by index.
    pub fn track(&mut self, index: u32) -> Result<TrackEntry> {
        self.list_files(false)?.get(index).map(|entry| *entry)
    }

    /// Looks up the index of a listed file by name.
    pub fn track_index(&mut self, filename: &Filename) -> Result<u32> {
        self.list_files(false)?.find(filename).map(|entry| entry.index())
    }

    /// Measures every listed track by playing it muted and asking for its
    /// total time. Returns `(index, seconds)` pairs in catalog order.
    ///
    /// Whatever happens, playback is stopped and the volume put back
    /// afterwards. Some firmware reports 0 seconds for every track.
    pub fn track_lengths(&mut self) -> Result<Vec<(u32, u32)>> {
        let indices: Vec<u32> = self.list_files(false)?.iter().map(|e| e.index()).collect();
        let saved = self.volume;
        self.apply_volume(Volume::MIN)?;
        let measured = self.measure_tracks(&indices);
        let stopped = self.stop();
        let restored = self.apply_volume(saved);
        let lengths = measured?;
        stopped?;
        restored?;
        Ok(lengths)
    }

    fn measure_tracks(&mut self, indices: &[u32]) -> Result<Vec<(u32, u32)>> {
        let mut lengths = Vec::with_capacity(indices.len());
        for &index in indices {
            self.play_now(&TrackRef::Index(index))?;
            let time = self.track_time()?;
            debug!("track {} is {}s long", index, time.total);
            lengths.push((index, time.total));
        }
        Ok(lengths)
    }

    fn fetch_catalog(&mut self) -> Result<FileCatalog> {
        let shape = self.config.listing_shape;
        self.write_command(&Command::ListFiles(shape))?;
        let mut rx = self.reader();
        let entries = shape.parser().read_entries(&mut rx)?;
        Ok(FileCatalog::new(entries))
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Resets the board, by pulsing its RST pin when the transport has a
    /// reset line, otherwise with the reset command. Waits for the boot
    /// banner, then restores the volume the session was tracking.
    ///
    /// The file catalog is dropped and the state goes back to `Stopped` as
    /// soon as the board has rebooted. If restoring the volume then fails,
    /// the error is returned and the volume is left unsynced: the board is
    /// at its boot default and `get_volume` still reports the level to
    /// restore. Any later successful volume command resyncs it.
    pub fn reset(&mut self) -> Result<BootBanner> {
        self.ensure_open()?;
        let result = self.reboot();
        let banner = self.latch(result)?;
        info!("Board reset: {}", banner.product);
        self.catalog = None;
        self.state = PlaybackState::Stopped;
        self.volume_synced = false;
        let volume = self.volume;
        if let Err(err) = self.apply_volume(volume) {
            warn!("Board rebooted but volume {} was not restored: {}", volume, err);
            return Err(err);
        }
        Ok(banner)
    }

    fn reboot(&mut self) -> Result<BootBanner> {
        if self.transport.has_reset_line() {
            self.transport.discard_input()?;
            if self.debug {
                debug!("tx reset pulse {:?}", self.config.reset_pulse);
            }
            self.transport.assert_reset()?;
            pause_for(self.config.reset_pulse);
            self.transport.release_reset()?;
        } else {
            self.write_command(&Command::Reset)?;
        }
        pause_for(self.config.boot_delay);
        let mut rx = self.reader();
        let mut lines = Vec::with_capacity(codec::BANNER_LINES);
        for _ in 0..codec::BANNER_LINES {
            lines.push(rx.read_line()?);
        }
        codec::decode_banner(&lines)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn require_state(&self, op: &'static str, wanted: PlaybackState) -> Result<()> {
        if self.state != wanted {
            return Err(Error::InvalidState {
                op,
                state: self.state,
            });
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::TransportClosed);
        }
        Ok(())
    }

    /// Marks the session closed if `result` says the transport is gone.
    fn latch<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(ref err) = result {
            if err.is_fatal() {
                warn!("Transport lost, closing session");
                self.closed = true;
            }
        }
        result
    }

    fn reader(&mut self) -> FrameReader<'_> {
        FrameReader::new(&mut self.transport, self.config.read_timeout, self.debug)
    }

    fn write_command(&mut self, command: &Command) -> Result<()> {
        let frame = command.encode()?;
        self.transport.discard_input()?;
        if self.debug {
            debug!("tx {:?} {:?}", command.opcode(), frame.hex_dump());
        }
        self.transport.write_all(&frame)?;
        pause_for(self.config.command_delay);
        Ok(())
    }

    fn exchange(&mut self, command: &Command, reply_len: usize) -> Result<Vec<u8>> {
        self.write_command(command)?;
        self.reader().read_exact(reply_len)
    }

    fn send_ack(&mut self, command: &Command) -> Result<()> {
        let reply = self.exchange(command, 1)?;
        codec::decode_ack(command.opcode(), &reply)
    }

    fn send_play(&mut self, track: &TrackRef, command: Command) -> Result<()> {
        let reply = self.exchange(&command, 1)?;
        match codec::decode_play_status(&reply)? {
            PlayStatus::Started => Ok(()),
            PlayStatus::NoFile => Err(Error::NotFound(track.to_string())),
        }
    }
}

fn pause_for(delay: Duration) {
    if delay > Duration::from_secs(0) {
        thread::sleep(delay);
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
