//! Track references and their wire form.
//!
//! A track is addressed either by its index or by its 11 byte filename
//! (8.3 name without the dot, space padded, e.g. `"T00     OGG"`). The two
//! forms are never mixed within one command, and no translation between them
//! is attempted here; use the file catalog for that.

use core::fmt;
use core::str::FromStr;

use crate::codec::{self, FILENAME_LEN, INDEX_LEN};
use crate::error::{Error, Result};

/// An exact 11 byte ASCII filename.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filename([u8; FILENAME_LEN]);

impl Filename {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FILENAME_LEN {
            return Err(Error::InvalidArgument(format!(
                "filename must be exactly {} bytes, got {}",
                FILENAME_LEN,
                bytes.len()
            )));
        }
        if !bytes.is_ascii() {
            return Err(Error::InvalidArgument("filename must be ASCII".into()));
        }
        let mut name = [0u8; FILENAME_LEN];
        name.copy_from_slice(bytes);
        Ok(Filename(name))
    }

    pub fn as_bytes(&self) -> &[u8; FILENAME_LEN] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Always ASCII, see from_bytes.
        core::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for Filename {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Filename::from_bytes(s.as_bytes())
    }
}

impl fmt::Debug for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller supplied reference to a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackRef {
    Index(u32),
    Filename(Filename),
}

impl TrackRef {
    /// Builds a filename reference, failing unless `name` is exactly 11
    /// ASCII bytes.
    pub fn filename(name: &str) -> Result<Self> {
        Ok(TrackRef::Filename(name.parse()?))
    }

    /// Converts the reference into the bytes the PLAY commands carry.
    pub fn resolve(&self) -> Result<TrackArg> {
        match self {
            TrackRef::Index(index) => Ok(TrackArg::Index(codec::encode_index(*index)?)),
            TrackRef::Filename(name) => Ok(TrackArg::Filename(*name)),
        }
    }
}

impl From<u32> for TrackRef {
    fn from(index: u32) -> Self {
        TrackRef::Index(index)
    }
}

impl From<Filename> for TrackRef {
    fn from(name: Filename) -> Self {
        TrackRef::Filename(name)
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackRef::Index(index) => write!(f, "track {}", index),
            TrackRef::Filename(name) => write!(f, "file {:?}", name.as_str()),
        }
    }
}

/// A track argument that has been checked against the wire format limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackArg {
    /// Big-endian index.
    Index([u8; INDEX_LEN]),
    Filename(Filename),
}

impl TrackArg {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TrackArg::Index(bytes) => &bytes[..],
            TrackArg::Filename(name) => &name.as_bytes()[..],
        }
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
