//! Error types for sound board operations.
//!
//! Every fallible call in the crate returns [`Result<T>`]. Errors raised
//! before any byte is written (`InvalidArgument`, `InvalidState`) have no
//! effect on the hardware. Errors raised while waiting for a reply leave the
//! session's tracked state exactly as it was before the call.

use std::io;

use crate::PlaybackState;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The expected reply did not arrive within the read timeout.
    #[error("timeout waiting for response")]
    Timeout,

    /// A reply arrived but could not be understood (wrong length, bad echo,
    /// unparseable listing record). Usually means the listing shape in the
    /// configuration does not match the firmware.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A caller supplied value violates a hard limit of the wire format.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not allowed from the locally tracked playback state.
    #[error("cannot {op} while {state:?}")]
    InvalidState {
        op: &'static str,
        state: PlaybackState,
    },

    /// No track matches the given index or filename.
    #[error("not found: {0}")]
    NotFound(String),

    /// The transport is gone. The session will not attempt any more I/O.
    #[error("transport closed")]
    TransportClosed,

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout,
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::UnexpectedEof => Error::TransportClosed,
            _ => Error::Io(err),
        }
    }
}

impl Error {
    /// Returns true if the session can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::TransportClosed)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ===========================================================================
//
// Tests
//
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let tests = &vec![
            (Error::Timeout, "timeout waiting for response"),
            (
                Error::Protocol("bad echo".into()),
                "protocol error: bad echo",
            ),
            (
                Error::InvalidArgument("filename length 3".into()),
                "invalid argument: filename length 3",
            ),
            (
                Error::InvalidState {
                    op: "pause",
                    state: PlaybackState::Stopped,
                },
                "cannot pause while Stopped",
            ),
            (Error::NotFound("track 2".into()), "not found: track 2"),
            (Error::TransportClosed, "transport closed"),
        ];
        for (err, text) in tests.iter() {
            assert_eq!(&err.to_string(), text);
        }
    }

    #[test]
    fn test_from_io() {
        let tests = &vec![
            (io::ErrorKind::TimedOut, "Timeout"),
            (io::ErrorKind::WouldBlock, "Timeout"),
            (io::ErrorKind::BrokenPipe, "TransportClosed"),
            (io::ErrorKind::NotConnected, "TransportClosed"),
            (io::ErrorKind::UnexpectedEof, "TransportClosed"),
            (io::ErrorKind::PermissionDenied, "Io"),
        ];
        for (kind, variant) in tests.iter() {
            let err: Error = io::Error::new(*kind, "boom").into();
            let name = match err {
                Error::Timeout => "Timeout",
                Error::TransportClosed => "TransportClosed",
                Error::Io(_) => "Io",
                _ => "other",
            };
            assert_eq!(&name, variant);
        }
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::TransportClosed.is_fatal());
        assert!(!Error::Timeout.is_fatal());
        assert!(!Error::Protocol("x".into()).is_fatal());
    }

    #[test]
    fn test_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
        assert_send_sync::<Error>();
    }
}
