//! Error types for the acquisition session, its configuration and log files.
//!
//! ```text
//! SessionError (fatal, ends the session)
//! ├── ConfigError      (validation / file loading)
//! ├── InstrumentError  (transport, tagged with the session state)
//! ├── DecodeError      (malformed sweep buffers)
//! └── LogWriteError    (coarse / transient file output)
//!
//! LogReadError         (offline log parsing)
//! ```

use std::io;
use std::path::PathBuf;

use polmon_hardware::{DecodeError, InstrumentError};
use thiserror::Error;

use crate::state::SessionState;

/// Fatal session errors. Every variant identifies the stage it came from.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configuration was rejected before the session started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An instrument command failed.
    #[error("{stage}: {action} failed: {source}")]
    Instrument {
        /// State the session was in.
        stage: SessionState,
        /// What was being attempted.
        action: String,
        #[source]
        source: InstrumentError,
    },

    /// A fetched sweep could not be decoded.
    #[error("sweep {sweep}: decode failed: {source}")]
    Decode {
        /// Zero-based sweep index.
        sweep: usize,
        #[source]
        source: DecodeError,
    },

    /// The sweep decoded to zero samples, so there is no reference state.
    #[error("sweep {sweep}: no samples, nothing to use as reference")]
    EmptySweep {
        /// Zero-based sweep index.
        sweep: usize,
    },

    /// The instrument never reported data available within the poll ceiling.
    #[error("sweep {sweep}: no data after {waited_ms}ms of polling (last status '{last_status}')")]
    PollTimeout {
        /// Zero-based sweep index.
        sweep: usize,
        /// Time spent polling.
        waited_ms: u64,
        /// Last status text reported.
        last_status: String,
    },

    /// A log file could not be written.
    #[error("{stage}: {source}")]
    Log {
        /// State the session was in.
        stage: SessionState,
        #[source]
        source: LogWriteError,
    },
}

impl SessionError {
    /// Session state in which the error occurred.
    #[must_use]
    pub fn stage(&self) -> SessionState {
        match self {
            Self::Config(_) => SessionState::Configuring,
            Self::Instrument { stage, .. } | Self::Log { stage, .. } => *stage,
            Self::Decode { .. } => SessionState::Fetching,
            Self::EmptySweep { .. } => SessionState::Analyzing,
            Self::PollTimeout { .. } => SessionState::Polling,
        }
    }

    /// Wrap an instrument error with the stage and action that raised it.
    pub fn instrument(stage: SessionState, action: impl Into<String>, source: InstrumentError) -> Self {
        Self::Instrument {
            stage,
            action: action.into(),
            source,
        }
    }
}

/// Errors produced when loading or validating an acquisition configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field value is out of range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The configuration file could not be read or written.
    #[error("cannot access config file {path:?}: {source}")]
    FileRead {
        /// Path that was being accessed.
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// A log file could not be created or appended to.
#[derive(Debug, Error)]
#[error("cannot write {path:?}: {source}")]
pub struct LogWriteError {
    /// File being written.
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Errors produced when parsing coarse or transient log files.
#[derive(Debug, Error)]
pub enum LogReadError {
    /// The file could not be read.
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file ended before its column header.
    #[error("{path:?} has no column header")]
    MissingHeader { path: PathBuf },

    /// A required column is absent from the header.
    #[error("{path:?} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// A data row could not be parsed.
    #[error("{path:?} line {line}: {reason}")]
    MalformedRow {
        path: PathBuf,
        /// One-based line number.
        line: usize,
        reason: String,
    },
}
