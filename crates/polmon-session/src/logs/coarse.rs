//! Coarse log: one row per sweep for the whole session.
//!
//! The file is created with a two-line header when the session starts and is
//! reopened, appended to and closed for every sweep, so rows already written
//! survive a crash.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use polmon_hardware::{AveragingTime, SampleRate, StokesSample, SweepResult};

use super::format::{coarse_log_path, format_float, format_timestamp, join_row};
use crate::error::LogWriteError;

/// Column header line, trailing space included.
pub const COARSE_COLUMNS: &str = "time, Power (W), S1, S2, S3 ";

/// Summary row for one sweep: its timestamp and first sample only.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseLogEntry {
    pub timestamp: NaiveDateTime,
    pub power: f64,
    pub sample: StokesSample,
}

impl CoarseLogEntry {
    /// Entry for `sweep`, or `None` if the sweep is empty.
    #[must_use]
    pub fn from_sweep(timestamp: NaiveDateTime, sweep: &SweepResult) -> Option<Self> {
        sweep.first().map(|(power, sample)| Self {
            timestamp,
            power,
            sample,
        })
    }

    /// `timestamp,power,s1,s2,s3`
    #[must_use]
    pub fn to_row(&self) -> String {
        join_row(&[
            format_timestamp(&self.timestamp),
            format_float(self.power),
            format_float(self.sample.s1),
            format_float(self.sample.s2),
            format_float(self.sample.s3),
        ])
    }
}

/// Handle to a coarse log file. Holds the path, not an open file.
#[derive(Debug, Clone)]
pub struct CoarseLog {
    path: PathBuf,
}

impl CoarseLog {
    /// Create `N778xC_SOP_coarse_<ts>.txt` in `dir` and write its header.
    ///
    /// Fails if the file already exists.
    pub fn create(
        dir: &Path,
        started: &NaiveDateTime,
        averaging: AveragingTime,
        rate: SampleRate,
    ) -> Result<Self, LogWriteError> {
        let path = coarse_log_path(dir, started);
        let write = || -> std::io::Result<()> {
            let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
            let mut out = BufWriter::new(file);
            writeln!(out, "{}", settings_line(averaging, rate))?;
            writeln!(out, "{COARSE_COLUMNS}")?;
            out.flush()
        };
        write().map_err(|source| LogWriteError {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "coarse log created");
        Ok(Self { path })
    }

    /// Append one row, then close the file.
    pub fn append(&self, entry: &CoarseLogEntry) -> Result<(), LogWriteError> {
        let write = || -> std::io::Result<()> {
            let mut file: File = OpenOptions::new().append(true).open(&self.path)?;
            writeln!(file, "{}", entry.to_row())?;
            file.flush()
        };
        write().map_err(|source| LogWriteError {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `Avg: <avg> Rate: <rate> `
#[must_use]
pub fn settings_line(averaging: AveragingTime, rate: SampleRate) -> String {
    format!("Avg: {averaging} Rate: {rate} ")
}
