//! Transient logs: the full sweep, written once per capture.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use polmon_hardware::SweepResult;

use super::format::{format_float, join_row, transient_log_path};
use crate::error::LogWriteError;

/// Column header line, trailing space included.
pub const TRANSIENT_COLUMNS: &str = "Power (W), Angle (deg), S1, S2, S3 ";

/// A captured sweep and its per-sample deviation angles.
#[derive(Debug)]
pub struct TransientRecord<'a> {
    pub timestamp: NaiveDateTime,
    pub sweep: &'a SweepResult,
    pub angles: &'a [f64],
}

impl<'a> TransientRecord<'a> {
    /// `power,angle,s1,s2,s3` for each sample, in acquisition order.
    pub fn rows(&self) -> impl Iterator<Item = String> + 'a {
        let sweep: &'a SweepResult = self.sweep;
        sweep
            .iter()
            .zip(self.angles)
            .map(|((power, s), angle)| {
                join_row(&[
                    format_float(power),
                    format_float(*angle),
                    format_float(s.s1),
                    format_float(s.s2),
                    format_float(s.s3),
                ])
            })
    }
}

/// Writer for transient files.
pub struct TransientLog;

impl TransientLog {
    /// Write `record` to a new `N778xC_SOP_transient_<ts>.txt` in `dir` and
    /// close it. Returns the path written.
    ///
    /// Fails if a file for the same timestamp already exists.
    pub fn write(dir: &Path, record: &TransientRecord<'_>) -> Result<PathBuf, LogWriteError> {
        let path = transient_log_path(dir, &record.timestamp);
        let write = || -> std::io::Result<()> {
            let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
            let mut out = BufWriter::new(file);
            writeln!(out, "{TRANSIENT_COLUMNS}")?;
            for row in record.rows() {
                writeln!(out, "{row}")?;
            }
            out.flush()
        };
        write().map_err(|source| LogWriteError {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
