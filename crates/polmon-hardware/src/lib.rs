//! Polarimeter hardware interface for polarization monitoring.
//!
//! This crate turns the instrument's raw sweep buffers into Stokes samples
//! and abstracts the instrument session behind a port:
//!
//! - **Domain types**: [`StokesSample`], [`SweepResult`]
//! - **Decoder**: [`WaveformDecoder`] -- little-endian `f32` SOP and power buffers
//! - **Port**: [`InstrumentPort`] -- blocking command/response capability
//! - **Adapter**: [`ScpiSocket`] -- raw SCPI over TCP
//! - **Driver**: [`Polarimeter`] -- N778xC command set on top of any port
//!
//! # Example
//!
//! ```rust
//! use polmon_hardware::{DecodeError, WaveformDecoder};
//!
//! let sop: Vec<u8> = [1.0f32, 0.0, 0.0].iter().flat_map(|v| v.to_le_bytes()).collect();
//! let power = 1.0e-3f32.to_le_bytes();
//!
//! let sweep = WaveformDecoder::decode(&sop, &power, 1)?;
//! assert_eq!(sweep.len(), 1);
//! # Ok::<(), DecodeError>(())
//! ```

pub mod adapter;
mod decoder;
mod error;
pub mod polarimeter;
pub mod port;
mod settings;
mod stokes;

pub use adapter::{ScpiSocket, DEFAULT_SCPI_PORT, MAX_BLOCK_BYTES};
pub use decoder::WaveformDecoder;
pub use error::{BufferKind, DecodeError, InstrumentError};
pub use polarimeter::{
    settings_match, Polarimeter, Readback, SweepStatus, MAX_SAMPLES_PER_SWEEP,
};
pub use port::InstrumentPort;
pub use settings::{AveragingTime, SampleRate};
pub use stokes::{StokesSample, SweepResult};
