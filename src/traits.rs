use std::io;
use std::time::Duration;

/// A byte oriented duplex link to the sound board.
///
/// The link is assumed to already be open and configured for `SB_BAUD`, 8N1.
/// Implementations only move bytes; all framing is done by the codec.
pub trait Transport {
    /// Writes every byte in `bytes` to the link. Returns an error if the link
    /// has been disconnected.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads up to `buf.len()` bytes, waiting at most `timeout` for the first
    /// one to arrive. Returns the number of bytes stored in `buf`, which is 0
    /// when the timeout elapsed with nothing received. Must never block past
    /// `timeout`.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Throws away anything already sitting in the receive buffer. Called
    /// before each command so stale bytes can't be mistaken for a reply.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Returns true if the transport controls the board's RST pin.
    fn has_reset_line(&self) -> bool {
        false
    }

    /// Drives the reset line active (RST low).
    fn assert_reset(&mut self) -> io::Result<()> {
        Err(no_reset_line())
    }

    /// Returns the reset line to its idle (released) level.
    fn release_reset(&mut self) -> io::Result<()> {
        Err(no_reset_line())
    }
}

fn no_reset_line() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "transport has no reset line")
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read(buf, timeout)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }

    fn has_reset_line(&self) -> bool {
        (**self).has_reset_line()
    }

    fn assert_reset(&mut self) -> io::Result<()> {
        (**self).assert_reset()
    }

    fn release_reset(&mut self) -> io::Result<()> {
        (**self).release_reset()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read(buf, timeout)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }

    fn has_reset_line(&self) -> bool {
        (**self).has_reset_line()
    }

    fn assert_reset(&mut self) -> io::Result<()> {
        (**self).assert_reset()
    }

    fn release_reset(&mut self) -> io::Result<()> {
        (**self).release_reset()
    }
}
