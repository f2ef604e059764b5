//! Adapter implementations for the [`InstrumentPort`](crate::InstrumentPort) port.
//!
//! - [`ScpiSocket`]: raw SCPI over TCP with IEEE 488.2 binary blocks.

pub mod scpi_socket;

pub use scpi_socket::{parse_resource, ScpiSocket, DEFAULT_SCPI_PORT, MAX_BLOCK_BYTES};
