//! Byte level encoding of commands and decoding of replies.
//!
//! Every command is a single opcode byte, optionally followed by a fixed
//! width argument. Nothing terminates a command frame.
//!
//! ```text
//!   PLAY (index)     '#' IDX-MSB IDX-LSB      -> status byte ('p' or 'n')
//!   PLAY (filename)  'P' NAME[11]             -> status byte ('p' or 'n')
//!   STOP             'q'                      -> 'q'
//!   PAUSE            '='                      -> '='
//!   UNPAUSE          '>'                      -> '>'
//!   SET-VOLUME       'v' VOL                  -> VOL (echo)
//!   VOLUME STEP      '+' or '-'               -> VOL (new level)
//!   RESET            'R'                      -> boot banner (4 text lines)
//!   LIST (primary)   'L'                      -> COUNT[2] { NAME[11] SIZE[4] } * COUNT
//!   LIST (alternate) 'l'                      -> "index name size\n" ... "\n"
//!   TRACK TIME       't'                      -> "CCCCC:TTTTT"
//!   TRACK SIZE       's'                      -> "RRRRRRRRRR/TTTTTTTTTT"
//! ```
//!
//! All multi-byte integers are big-endian. Arguments that don't fit their
//! field are rejected with `InvalidArgument` rather than truncated.

use std::time::Duration;

use log::{debug, warn};
use pretty_hex::*;

use crate::catalog::{ListingShape, TrackEntry};
use crate::error::{Error, Result};
use crate::track::{Filename, TrackArg};
use crate::traits::Transport;

/// All sound board models talk at 9600 baud, 8N1.
pub const SB_BAUD: u32 = 9600;

pub const MIN_VOL: u8 = 0;
pub const MAX_VOL: u8 = 204;

/// Amount the board moves per VOLUME STEP command.
pub const VOLUME_STEP: u8 = 2;

pub const FILENAME_LEN: usize = 11;

pub const INDEX_LEN: usize = 2;
pub const MAX_TRACK_INDEX: u32 = 0xffff;

pub const COUNT_LEN: usize = 2;
pub const SIZE_LEN: usize = 4;
pub const RECORD_LEN: usize = FILENAME_LEN + SIZE_LEN;

/// Upper bound on the number of listed files (FAT16 root directory size).
pub const MAX_FILES: usize = 512;

pub const TRACK_TIME_LEN: usize = 11;
pub const TRACK_SIZE_LEN: usize = 21;

pub const MAX_LINE_LEN: usize = 80;

/// Product line printed by the board after it boots.
pub const BANNER_PREFIX: &[u8] = b"Adafruit FX Sound Board";
pub const BANNER_LINES: usize = 4;

c_like_enum! {
    Opcode {
        PlayIndex = b'#',
        PlayName = b'P',
        Stop = b'q',
        Pause = b'=',
        Unpause = b'>',
        SetVolume = b'v',
        VolumeUp = b'+',
        VolumeDown = b'-',
        Reset = b'R',
        ListFiles = b'L',
        ListFilesText = b'l',
        TrackTime = b't',
        TrackSize = b's',
    }
}

c_like_enum! {
    /// First byte of the reply to a PLAY command.
    PlayStatus {
        Started = b'p',
        NoFile = b'n',
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(TrackArg),
    Stop,
    Pause,
    Unpause,
    SetVolume(u8),
    VolumeUp,
    VolumeDown,
    Reset,
    ListFiles(ListingShape),
    TrackTime,
    TrackSize,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Play(TrackArg::Index(_)) => Opcode::PlayIndex,
            Command::Play(TrackArg::Filename(_)) => Opcode::PlayName,
            Command::Stop => Opcode::Stop,
            Command::Pause => Opcode::Pause,
            Command::Unpause => Opcode::Unpause,
            Command::SetVolume(_) => Opcode::SetVolume,
            Command::VolumeUp => Opcode::VolumeUp,
            Command::VolumeDown => Opcode::VolumeDown,
            Command::Reset => Opcode::Reset,
            Command::ListFiles(shape) => shape.opcode(),
            Command::TrackTime => Opcode::TrackTime,
            Command::TrackSize => Opcode::TrackSize,
        }
    }

    /// Returns the exact bytes to put on the wire.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut frame = vec![self.opcode().as_u8()];
        match self {
            Command::Play(track) => frame.extend_from_slice(track.as_bytes()),
            Command::SetVolume(volume) => frame.push(encode_volume(*volume)?),
            _ => {}
        }
        Ok(frame)
    }
}

/// The frames sent for an immediate play: a STOP followed by a PLAY. The
/// board's own interrupt behaviour differs between index and filename
/// addressing, so the stop is always explicit.
pub fn play_now(track: TrackArg) -> [Command; 2] {
    [Command::Stop, Command::Play(track)]
}

pub fn encode_index(index: u32) -> Result<[u8; INDEX_LEN]> {
    if index > MAX_TRACK_INDEX {
        return Err(Error::InvalidArgument(format!(
            "track index {} exceeds {}",
            index, MAX_TRACK_INDEX
        )));
    }
    Ok([(index >> 8) as u8, index as u8])
}

pub fn encode_volume(volume: u8) -> Result<u8> {
    if volume > MAX_VOL {
        return Err(Error::InvalidArgument(format!(
            "volume {} exceeds {}",
            volume, MAX_VOL
        )));
    }
    Ok(volume)
}

fn expect_len(what: &str, reply: &[u8], len: usize) -> Result<()> {
    if reply.len() != len {
        return Err(Error::Protocol(format!(
            "{} reply is {} bytes, expected {}",
            what,
            reply.len(),
            len
        )));
    }
    Ok(())
}

/// Checks that a command was acknowledged by echoing its opcode.
pub fn decode_ack(opcode: Opcode, reply: &[u8]) -> Result<()> {
    expect_len("ack", reply, 1)?;
    if reply[0] != opcode.as_u8() {
        return Err(Error::Protocol(format!(
            "expected ack 0x{:02x} for {:?}, got 0x{:02x}",
            opcode.as_u8(),
            opcode,
            reply[0]
        )));
    }
    Ok(())
}

pub fn decode_play_status(reply: &[u8]) -> Result<PlayStatus> {
    expect_len("play status", reply, 1)?;
    PlayStatus::from_u8(reply[0]).ok_or_else(|| {
        Error::Protocol(format!("unknown play status 0x{:02x}", reply[0]))
    })
}

pub fn decode_volume(reply: &[u8]) -> Result<u8> {
    expect_len("volume", reply, 1)?;
    let volume = reply[0];
    if volume > MAX_VOL {
        return Err(Error::Protocol(format!(
            "board reported volume {} above {}",
            volume, MAX_VOL
        )));
    }
    Ok(volume)
}

/// Checks the value echoed after SET-VOLUME against what was requested.
pub fn decode_volume_echo(requested: u8, reply: &[u8]) -> Result<u8> {
    let echoed = decode_volume(reply)?;
    if echoed != requested {
        warn!("Volume echo mismatch: sent {} got {}", requested, echoed);
        return Err(Error::Protocol(format!(
            "volume echo {} does not match requested {}",
            echoed, requested
        )));
    }
    Ok(echoed)
}

pub fn decode_count(reply: &[u8]) -> Result<usize> {
    expect_len("file count", reply, COUNT_LEN)?;
    let count = ((reply[0] as usize) << 8) | (reply[1] as usize);
    if count > MAX_FILES {
        return Err(Error::Protocol(format!(
            "file count {} exceeds {}",
            count, MAX_FILES
        )));
    }
    Ok(count)
}

/// Decodes one fixed width record of a primary listing. Records carry no
/// index of their own; it's their position in the listing.
pub fn decode_record(index: u32, record: &[u8]) -> Result<TrackEntry> {
    expect_len("listing record", record, RECORD_LEN)?;
    let (name, size) = record.split_at(FILENAME_LEN);
    let filename = Filename::from_bytes(name)
        .map_err(|_| Error::Protocol(format!("bad filename in record {}", index)))?;
    let size = (u32::from(size[0]) << 24)
        | (u32::from(size[1]) << 16)
        | (u32::from(size[2]) << 8)
        | u32::from(size[3]);
    Ok(TrackEntry::new(index, filename, size))
}

fn is_separator(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Parses one line of an alternate listing: `<index> <filename> <size>`.
///
/// The filename may contain spaces itself, so the index runs up to the first
/// separator, the size starts after the last one, and everything between
/// must be exactly one filename.
pub fn parse_listing_line(line: &[u8]) -> Result<TrackEntry> {
    let bad_line = || Error::Protocol(format!("bad listing line {:?}", String::from_utf8_lossy(line)));
    let first = line.iter().position(|b| is_separator(*b)).ok_or_else(bad_line)?;
    let last = line.iter().rposition(|b| is_separator(*b)).ok_or_else(bad_line)?;
    if last <= first {
        return Err(bad_line());
    }
    let index = parse_decimal(&line[..first])?;
    let filename = Filename::from_bytes(&line[first + 1..last]).map_err(|_| bad_line())?;
    let size = parse_decimal(&line[last + 1..])?;
    Ok(TrackEntry::new(index, filename, size))
}

/// Parses an unsigned decimal field, ignoring space padding.
pub fn parse_decimal(field: &[u8]) -> Result<u32> {
    let digits = trim_spaces(field);
    if digits.is_empty() {
        return Err(Error::Protocol("empty numeric field".into()));
    }
    let mut value: u32 = 0;
    for byte in digits {
        if !byte.is_ascii_digit() {
            return Err(Error::Protocol(format!(
                "bad numeric field {:?}",
                String::from_utf8_lossy(field)
            )));
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u32::from(byte - b'0')))
            .ok_or_else(|| Error::Protocol("numeric field overflows".into()))?;
    }
    Ok(value)
}

fn trim_spaces(field: &[u8]) -> &[u8] {
    let start = field.iter().position(|b| *b != b' ').unwrap_or(field.len());
    let end = field.iter().rposition(|b| *b != b' ').map_or(start, |i| i + 1);
    &field[start..end]
}

fn split_pair(what: &str, reply: &[u8], len: usize, separator: u8) -> Result<(u32, u32)> {
    expect_len(what, reply, len)?;
    let pos = reply.iter().position(|b| *b == separator).ok_or_else(|| {
        Error::Protocol(format!(
            "{} reply {:?} has no '{}'",
            what,
            String::from_utf8_lossy(reply),
            separator as char
        ))
    })?;
    Ok((parse_decimal(&reply[..pos])?, parse_decimal(&reply[pos + 1..])?))
}

/// Playback position of the current track, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackTime {
    pub elapsed: u32,
    pub total: u32,
}

/// Remaining and total size of the current track, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSize {
    pub remaining: u32,
    pub total: u32,
}

pub fn decode_track_time(reply: &[u8]) -> Result<TrackTime> {
    let (elapsed, total) = split_pair("track time", reply, TRACK_TIME_LEN, b':')?;
    Ok(TrackTime { elapsed, total })
}

pub fn decode_track_size(reply: &[u8]) -> Result<TrackSize> {
    let (remaining, total) = split_pair("track size", reply, TRACK_SIZE_LEN, b'/')?;
    Ok(TrackSize { remaining, total })
}

/// What the board prints after it boots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootBanner {
    pub product: String,
    pub fat: String,
    pub files: String,
}

/// Decodes the boot banner: a blank line, the product line, the FAT type and
/// the number of files.
pub fn decode_banner(lines: &[Vec<u8>]) -> Result<BootBanner> {
    if lines.len() != BANNER_LINES {
        return Err(Error::Protocol(format!(
            "boot banner has {} lines, expected {}",
            lines.len(),
            BANNER_LINES
        )));
    }
    let text = |line: &[u8]| String::from_utf8_lossy(line).trim().to_string();
    let product = text(&lines[1][..]);
    if !product.as_bytes().starts_with(BANNER_PREFIX) {
        warn!("Unexpected boot banner {:?}", product);
        return Err(Error::Protocol(format!(
            "unexpected boot banner {:?}",
            product
        )));
    }
    Ok(BootBanner {
        product,
        fat: text(&lines[2][..]),
        files: text(&lines[3][..]),
    })
}

/// Pulls reply bytes off a transport, one bounded read at a time.
///
/// A read that comes back empty means the timeout elapsed, and the whole
/// reply is abandoned with `Error::Timeout`. Callers never see a partial
/// reply.
pub struct FrameReader<'a> {
    transport: &'a mut dyn Transport,
    timeout: Duration,
    trace: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(transport: &'a mut dyn Transport, timeout: Duration, trace: bool) -> Self {
        FrameReader {
            transport,
            timeout,
            trace,
        }
    }

    fn fill(&mut self, buf: &mut [u8], wanted: usize, have: usize) -> Result<usize> {
        let n = self.transport.read(buf, self.timeout)?;
        if n == 0 {
            if self.trace {
                debug!("rx timeout after {} of {} bytes", have, wanted);
            }
            return Err(Error::Timeout);
        }
        Ok(n)
    }

    pub fn read_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let (_, rest) = buf.split_at_mut(filled);
            filled += self.fill(rest, len, filled)?;
        }
        if self.trace {
            debug!("rx {:?}", buf.hex_dump());
        }
        Ok(buf)
    }

    /// Reads a `\n` terminated line. The terminator and any trailing `\r`
    /// are dropped.
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        self.read_line_or_end()?.ok_or(Error::Timeout)
    }

    /// Like `read_line`, but silence before the first byte of a line is the
    /// end of the reply and gives `None`. Silence once a line has started is
    /// still a `Timeout`.
    pub fn read_line_or_end(&mut self) -> Result<Option<Vec<u8>>> {
        let mut byte = [0u8; 1];
        if self.transport.read(&mut byte, self.timeout)? == 0 {
            if self.trace {
                debug!("rx quiet at line boundary");
            }
            return Ok(None);
        }
        let mut line = Vec::new();
        while byte[0] != b'\n' {
            if line.len() >= MAX_LINE_LEN {
                return Err(Error::Protocol(format!(
                    "line longer than {} bytes",
                    MAX_LINE_LEN
                )));
            }
            line.push(byte[0]);
            self.fill(&mut byte, MAX_LINE_LEN, line.len())?;
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if self.trace {
            debug!("rx line {:?}", String::from_utf8_lossy(&line));
        }
        Ok(Some(line))
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
