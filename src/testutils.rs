use log::info;
use pretty_hex::*;
use simple_logger;
use std::collections::VecDeque;
use std::io;
use std::sync::Once;
use std::time::Duration;
use std::vec::Vec;

use super::codec::MAX_LINE_LEN;
use super::traits::Transport;

static INIT: Once = Once::new();

pub fn setup_log() {
    INIT.call_once(|| {
        simple_logger::init().unwrap();
    });
}

/// A scripted stand-in for the sound board.
///
/// Replies queued with `queue_reply` are released one per write (or one per
/// release of the reset line), the way the board answers each command.
/// Bytes queued with `push_rx` are readable right away. A read with nothing
/// buffered returns 0, which is what a real port does when its timeout
/// elapses.
pub struct MockTransport {
    rx: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    chunk: usize,
    reset_line: bool,
    reset_asserted: bool,
    reset_pulses: usize,
    discards: usize,
    closed: bool,
}

impl Default for MockTransport {
    fn default() -> Self {
        MockTransport {
            rx: VecDeque::new(),
            replies: VecDeque::new(),
            sent: Vec::new(),
            chunk: MAX_LINE_LEN,
            reset_line: false,
            reset_asserted: false,
            reset_pulses: 0,
            discards: 0,
            closed: false,
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Default::default()
    }

    /// Limits how many bytes a single read hands back.
    pub fn chunk_size(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    pub fn with_reset_line(mut self) -> Self {
        self.reset_line = true;
        self
    }

    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter());
    }

    pub fn queue_reply(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// The opcode (first byte) of every frame written so far.
    pub fn sent_opcodes(&self) -> Vec<u8> {
        self.sent.iter().filter_map(|frame| frame.first().copied()).collect()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    pub fn reset_pulses(&self) -> usize {
        self.reset_pulses
    }

    pub fn discards(&self) -> usize {
        self.discards
    }

    fn release_reply(&mut self) {
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend(reply.iter());
        }
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock closed"));
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.check_open()?;
        info!("mock rx {:?}", bytes.hex_dump());
        self.sent.push(bytes.to_vec());
        self.release_reply();
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        self.check_open()?;
        let n = buf.len().min(self.chunk).min(self.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.rx.pop_front().unwrap();
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.discards += 1;
        self.rx.clear();
        Ok(())
    }

    fn has_reset_line(&self) -> bool {
        self.reset_line
    }

    fn assert_reset(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.reset_asserted = true;
        Ok(())
    }

    fn release_reset(&mut self) -> io::Result<()> {
        self.check_open()?;
        if self.reset_asserted {
            self.reset_asserted = false;
            self.reset_pulses += 1;
            self.release_reply();
        }
        Ok(())
    }
}

/// Builds a primary (binary) listing reply.
pub fn primary_listing(files: &[(&str, u32)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.push((files.len() >> 8) as u8);
    bytes.push(files.len() as u8);
    for (name, size) in files.iter() {
        assert_eq!(name.len(), 11);
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&size.to_be_bytes());
    }
    bytes
}

/// Builds the banner a board prints after it boots.
pub fn boot_banner() -> Vec<u8> {
    b"\r\nAdafruit FX Sound Board 9/26/14\r\nFAT16\r\nFiles: 2\r\n".to_vec()
}
