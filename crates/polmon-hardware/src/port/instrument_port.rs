//! The driving port for a command/response instrument.

use crate::error::InstrumentError;

/// Port that abstracts a blocking command/response instrument session.
///
/// Every call blocks until the instrument answers or the implementation's
/// per-command timeout expires.
///
/// Implementations include:
/// - [`crate::adapter::ScpiSocket`] -- raw SCPI over TCP.
/// - Scripted in-memory doubles used by the session tests.
pub trait InstrumentPort: Send {
    /// Send a command that produces no reply.
    fn write(&mut self, command: &str) -> Result<(), InstrumentError>;

    /// Send a command and read a single text reply.
    fn query(&mut self, command: &str) -> Result<String, InstrumentError>;

    /// Send a command and read a binary block reply.
    fn query_binary(&mut self, command: &str) -> Result<Vec<u8>, InstrumentError>;

    /// Release the session. Further calls fail with [`InstrumentError::Closed`].
    fn close(&mut self) -> Result<(), InstrumentError>;

    /// Set `param` to `value`.
    fn configure(&mut self, param: &str, value: &str) -> Result<(), InstrumentError> {
        self.write(&format!("{param} {value}"))
    }
}
