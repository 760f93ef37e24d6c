//! `Transport` over a host serial port, via the `serialport` crate.

use std::io;
use std::time::Duration;

use log::{info, warn};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::codec::SB_BAUD;
use crate::config::DEFAULT_READ_TIMEOUT;
use crate::error::Result;
use crate::traits::Transport;

/// The modem control line wired to the board's RST pin, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetLine {
    Dtr,
    Rts,
}

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    reset_line: Option<ResetLine>,
}

impl SerialTransport {
    /// Opens `path` at `SB_BAUD`, 8N1, no flow control.
    pub fn open(path: &str) -> Result<Self> {
        let port = serialport::new(path, SB_BAUD)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(DEFAULT_READ_TIMEOUT)
            .open()
            .map_err(io::Error::from)?;
        info!("Opened {} at {} baud", path, SB_BAUD);
        Ok(SerialTransport::from_port(port))
    }

    /// Wraps a port that was opened and configured by the caller.
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        SerialTransport {
            port,
            reset_line: None,
        }
    }

    /// Uses `line` to drive the board's RST pin. The line is released right
    /// away so the board isn't held in reset.
    pub fn with_reset_line(mut self, line: ResetLine) -> Result<Self> {
        self.reset_line = Some(line);
        self.drive_reset(false)?;
        Ok(self)
    }

    pub fn port(&self) -> &dyn SerialPort {
        self.port.as_ref()
    }

    fn drive_reset(&mut self, active: bool) -> io::Result<()> {
        // USB serial adapters invert the modem lines, so "asserted" pulls
        // RST low.
        let result = match self.reset_line {
            Some(ResetLine::Dtr) => self.port.write_data_terminal_ready(active),
            Some(ResetLine::Rts) => self.port.write_request_to_send(active),
            None => return Err(io::Error::new(io::ErrorKind::Unsupported, "no reset line")),
        };
        result.map_err(io::Error::from)
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut self.port, bytes)?;
        io::Write::flush(&mut self.port)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.port.set_timeout(timeout).map_err(io::Error::from)?;
        match io::Read::read(&mut self.port, buf) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(err) => Err(err),
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn has_reset_line(&self) -> bool {
        self.reset_line.is_some()
    }

    fn assert_reset(&mut self) -> io::Result<()> {
        self.drive_reset(true)
    }

    fn release_reset(&mut self) -> io::Result<()> {
        self.drive_reset(false).map_err(|err| {
            warn!("Failed to release reset line: {}", err);
            err
        })
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
