//! Polarimeter waveform decoder.
//!
//! A sweep is transferred as two binary blocks:
//!
//! ```text
//! SOP buffer    3n little-endian f32   s1[0] s2[0] s3[0] s1[1] s2[1] s3[1] ...
//! power buffer   n little-endian f32   p[0] p[1] ...
//! ```
//!
//! The SOP buffer is de-interleaved into `(s1, s2, s3)` triplets and zipped
//! positionally with the power readings. Values are widened to `f64` before
//! any arithmetic.
//!
//! The decoder either reproduces exactly `n` samples or returns a
//! [`DecodeError`]; it never truncates or pads.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{BufferKind, DecodeError};
use crate::stokes::{StokesSample, SweepResult};

/// Size of one encoded float.
const FLOAT_BYTES: usize = 4;

/// Floats per Stokes triplet.
const STOKES_COMPONENTS: usize = 3;

/// Decoder for polarimeter sweep buffers.
pub struct WaveformDecoder;

impl WaveformDecoder {
    /// Decode one sweep.
    ///
    /// `sop` must hold `3 * expected_count` floats and `power` must hold
    /// `expected_count` floats.
    pub fn decode(
        sop: &[u8],
        power: &[u8],
        expected_count: usize,
    ) -> Result<SweepResult, DecodeError> {
        let sop_values = Self::decode_floats(sop, BufferKind::Sop)?;
        let power_values = Self::decode_floats(power, BufferKind::Power)?;

        if sop_values.len() % STOKES_COMPONENTS != 0 {
            return Err(DecodeError::IncompleteTriplet {
                floats: sop_values.len(),
            });
        }

        let triplets = sop_values.len() / STOKES_COMPONENTS;
        if triplets != expected_count {
            return Err(DecodeError::CountMismatch {
                buffer: BufferKind::Sop,
                expected: expected_count,
                got: triplets,
            });
        }
        if power_values.len() != expected_count {
            return Err(DecodeError::CountMismatch {
                buffer: BufferKind::Power,
                expected: expected_count,
                got: power_values.len(),
            });
        }

        let samples = sop_values
            .chunks_exact(STOKES_COMPONENTS)
            .map(|c| StokesSample::new(c[0], c[1], c[2]))
            .collect();

        SweepResult::new(samples, power_values)
    }

    /// Decode a buffer of little-endian `f32` values, widened to `f64`.
    pub fn decode_floats(data: &[u8], buffer: BufferKind) -> Result<Vec<f64>, DecodeError> {
        if data.len() % FLOAT_BYTES != 0 {
            return Err(DecodeError::Misaligned {
                buffer,
                len: data.len(),
            });
        }

        let count = data.len() / FLOAT_BYTES;
        let mut cursor = Cursor::new(data);
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            // Length was checked above, so a short read means a misaligned tail.
            let value = cursor
                .read_f32::<LittleEndian>()
                .map_err(|_| DecodeError::Misaligned {
                    buffer,
                    len: data.len(),
                })?;
            values.push(f64::from(value));
        }
        Ok(values)
    }
}
