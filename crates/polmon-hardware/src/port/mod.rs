//! Port definitions for instrument access.
//!
//! The acquisition session only talks to the polarimeter through
//! [`InstrumentPort`], so the socket adapter and test doubles can be swapped
//! transparently.

mod instrument_port;

pub use instrument_port::InstrumentPort;
