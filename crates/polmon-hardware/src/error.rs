//! Error types for waveform decoding and instrument transport.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which binary buffer of a sweep a decode error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Interleaved (s1, s2, s3) triplets.
    Sop,
    /// One optical power reading per sample.
    Power,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sop => f.write_str("SOP"),
            Self::Power => f.write_str("power"),
        }
    }
}

/// Errors that can occur when decoding a sweep's binary buffers.
///
/// A decoder never truncates or pads: every inconsistency between the
/// buffers and the configured sample count is reported here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer length is not a whole number of 32-bit floats.
    #[error("{buffer} buffer of {len} bytes is not a multiple of 4")]
    Misaligned {
        buffer: BufferKind,
        len: usize,
    },

    /// The SOP buffer does not hold a whole number of (s1, s2, s3) triplets.
    #[error("SOP buffer holds {floats} floats, not a multiple of 3")]
    IncompleteTriplet {
        floats: usize,
    },

    /// The decoded element count disagrees with the configured sample count.
    #[error("{buffer} buffer decoded to {got} samples, expected {expected}")]
    CountMismatch {
        buffer: BufferKind,
        expected: usize,
        got: usize,
    },
}

/// Errors raised by an instrument transport.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// The connection to the instrument could not be opened.
    #[error("cannot connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The resource string could not be turned into a network address.
    #[error("invalid resource '{resource}': {reason}")]
    InvalidResource {
        resource: String,
        reason: String,
    },

    /// A read or write failed while executing a command.
    #[error("I/O error during '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The instrument did not answer within the per-command timeout.
    #[error("'{command}' timed out after {timeout_ms}ms")]
    Timeout {
        command: String,
        timeout_ms: u64,
    },

    /// The reply could not be interpreted.
    #[error("malformed response to '{command}': {reason}")]
    MalformedResponse {
        command: String,
        reason: String,
    },

    /// The session was already closed.
    #[error("instrument session is closed")]
    Closed,
}

impl InstrumentError {
    /// Creates a malformed-response error.
    pub fn malformed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Classifies an I/O error, turning socket timeouts into [`Self::Timeout`].
    pub fn from_io(command: impl Into<String>, source: io::Error, timeout_ms: u64) -> Self {
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout {
                command: command.into(),
                timeout_ms,
            },
            _ => Self::Io {
                command: command.into(),
                source,
            },
        }
    }
}
