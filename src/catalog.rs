//! The list of files stored on the board.
//!
//! Firmware variants disagree on how they answer a file listing, so the
//! shape is picked by configuration and each shape has its own
//! [`ListingParser`]. Both produce the same [`TrackEntry`] sequence. The
//! board doesn't identify its firmware reliably, so there is no
//! auto-detection.

use crate::codec::{self, FrameReader, Opcode, COUNT_LEN, MAX_FILES, RECORD_LEN};
use crate::error::{Error, Result};
use crate::track::Filename;

/// The wire format of a file listing reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingShape {
    /// Binary: a big-endian count followed by fixed width name/size records.
    Primary,
    /// Text: one `index name size` line per file, ended by a blank line or
    /// by the board going quiet between lines.
    Alternate,
}

impl Default for ListingShape {
    fn default() -> Self {
        ListingShape::Primary
    }
}

impl ListingShape {
    pub fn opcode(self) -> Opcode {
        match self {
            ListingShape::Primary => Opcode::ListFiles,
            ListingShape::Alternate => Opcode::ListFilesText,
        }
    }

    pub fn parser(self) -> &'static dyn ListingParser {
        match self {
            ListingShape::Primary => &PrimaryListing,
            ListingShape::Alternate => &AlternateListing,
        }
    }
}

/// One file reported by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEntry {
    index: u32,
    filename: Filename,
    size: u32,
}

impl TrackEntry {
    pub fn new(index: u32, filename: Filename, size: u32) -> Self {
        TrackEntry {
            index,
            filename,
            size,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn filename(&self) -> &Filename {
        &self.filename
    }

    /// File size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }
}

pub trait ListingParser {
    /// Reads a complete listing reply. Either every entry is returned, or
    /// an error is; a listing that stops early is a `Timeout`.
    fn read_entries(&self, rx: &mut FrameReader<'_>) -> Result<Vec<TrackEntry>>;
}

pub struct PrimaryListing;

impl ListingParser for PrimaryListing {
    fn read_entries(&self, rx: &mut FrameReader<'_>) -> Result<Vec<TrackEntry>> {
        let count = codec::decode_count(&rx.read_exact(COUNT_LEN)?)?;
        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let record = rx.read_exact(RECORD_LEN)?;
            entries.push(codec::decode_record(index as u32, &record)?);
        }
        Ok(entries)
    }
}

pub struct AlternateListing;

impl ListingParser for AlternateListing {
    fn read_entries(&self, rx: &mut FrameReader<'_>) -> Result<Vec<TrackEntry>> {
        let mut entries = Vec::new();
        loop {
            let line = match rx.read_line_or_end()? {
                Some(line) if !line.is_empty() => line,
                _ => return Ok(entries),
            };
            if entries.len() == MAX_FILES {
                return Err(Error::Protocol(format!(
                    "listing has more than {} files",
                    MAX_FILES
                )));
            }
            entries.push(codec::parse_listing_line(&line)?);
        }
    }
}

/// The files on the board, in the order the board reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCatalog {
    entries: Vec<TrackEntry>,
}

impl FileCatalog {
    pub fn new(entries: Vec<TrackEntry>) -> Self {
        FileCatalog { entries }
    }

    /// Looks up a file by the index the board reported for it. Indices
    /// aren't guaranteed to be contiguous or to start at zero.
    pub fn get(&self, index: u32) -> Result<&TrackEntry> {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .ok_or_else(|| Error::NotFound(format!("track {}", index)))
    }

    pub fn find(&self, filename: &Filename) -> Result<&TrackEntry> {
        self.entries
            .iter()
            .find(|entry| &entry.filename == filename)
            .ok_or_else(|| Error::NotFound(format!("file {:?}", filename.as_str())))
    }

    pub fn entries(&self) -> &[TrackEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FileCatalog {
    type Item = &'a TrackEntry;
    type IntoIter = std::slice::Iter<'a, TrackEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
