//! Parsing of coarse and transient logs for offline analysis.

use std::path::Path;

use chrono::NaiveDateTime;
use polmon_hardware::StokesSample;
use serde::{Deserialize, Serialize};

use super::format::parse_timestamp;
use crate::error::LogReadError;

/// Which kind of log a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Coarse,
    Transient,
}

/// Contents of a coarse log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarseSeries {
    /// The `Avg: .. Rate: ..` line, trimmed, if present.
    pub settings: Option<String>,
    pub times: Vec<NaiveDateTime>,
    pub powers: Vec<f64>,
    pub vectors: Vec<StokesSample>,
}

/// Contents of a transient log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransientSeries {
    pub powers: Vec<f64>,
    pub angles: Vec<f64>,
    pub vectors: Vec<StokesSample>,
}

/// Read a coarse log.
pub fn read_coarse_log(path: &Path) -> Result<CoarseSeries, LogReadError> {
    let text = read(path)?;
    let mut series = CoarseSeries::default();

    // The settings line precedes the CSV header and is not part of the table.
    let mut body = text.as_str();
    let mut skipped = 0;
    if let Some((first, rest)) = split_first_line(body) {
        if first.trim_start().starts_with("Avg:") {
            series.settings = Some(first.trim().to_owned());
            body = rest;
            skipped = 1;
        }
    }

    let mut table = Table::new(path, body, skipped);
    let cols = table.columns(&["time", "Power (W)", "S1", "S2", "S3"])?;
    for row in table.rows() {
        let (line, record) = row?;
        let field = |i: usize| record.get(cols[i]).unwrap_or_default();
        let time = parse_timestamp(field(0)).map_err(|e| LogReadError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason: format!("bad timestamp '{}': {e}", field(0)),
        })?;
        series.times.push(time);
        series.powers.push(number(path, line, field(1))?);
        series.vectors.push(StokesSample::new(
            number(path, line, field(2))?,
            number(path, line, field(3))?,
            number(path, line, field(4))?,
        ));
    }
    Ok(series)
}

/// Read a transient log.
pub fn read_transient_log(path: &Path) -> Result<TransientSeries, LogReadError> {
    let text = read(path)?;
    let mut series = TransientSeries::default();

    let mut table = Table::new(path, &text, 0);
    let cols = table.columns(&["Power (W)", "Angle (deg)", "S1", "S2", "S3"])?;
    for row in table.rows() {
        let (line, record) = row?;
        let field = |i: usize| record.get(cols[i]).unwrap_or_default();
        series.powers.push(number(path, line, field(0))?);
        series.angles.push(number(path, line, field(1))?);
        series.vectors.push(StokesSample::new(
            number(path, line, field(2))?,
            number(path, line, field(3))?,
            number(path, line, field(4))?,
        ));
    }
    Ok(series)
}

/// Stokes vectors of a log of either kind, in file order.
pub fn read_vectors(path: &Path, kind: LogKind) -> Result<Vec<StokesSample>, LogReadError> {
    match kind {
        LogKind::Coarse => read_coarse_log(path).map(|s| s.vectors),
        LogKind::Transient => read_transient_log(path).map(|s| s.vectors),
    }
}

/// File contents without a leading UTF-8 byte order mark.
fn read(path: &Path) -> Result<String, LogReadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LogReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_owned(),
        None => text,
    })
}

fn split_first_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    Some(text.split_once('\n').unwrap_or((text, "")))
}

/// Header-addressed CSV rows of one log file.
struct Table<'a> {
    path: &'a Path,
    reader: csv::Reader<&'a [u8]>,
    /// Lines consumed before the CSV header.
    skipped: u64,
}

impl<'a> Table<'a> {
    fn new(path: &'a Path, body: &'a str, skipped: u64) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());
        Self {
            path,
            reader,
            skipped,
        }
    }

    /// Record positions of the wanted columns, matched case-insensitively.
    fn columns(&mut self, wanted: &[&'static str]) -> Result<Vec<usize>, LogReadError> {
        let path = self.path;
        let skipped = self.skipped;
        let headers = self
            .reader
            .headers()
            .map_err(|e| row_error(path, skipped, &e))?;
        if headers.iter().all(str::is_empty) {
            return Err(LogReadError::MissingHeader {
                path: path.to_path_buf(),
            });
        }
        wanted
            .iter()
            .map(|&column| {
                headers
                    .iter()
                    .position(|h| h.trim_matches('"').trim().eq_ignore_ascii_case(column))
                    .ok_or_else(|| LogReadError::MissingColumn {
                        path: path.to_path_buf(),
                        column,
                    })
            })
            .collect()
    }

    /// Data rows with their one-based line number in the file.
    fn rows(&mut self) -> impl Iterator<Item = Result<(usize, csv::StringRecord), LogReadError>> + '_ + use<'_, 'a> {
        let path = self.path;
        let skipped = self.skipped;
        self.reader.records().map(move |row| {
            let record = row.map_err(|e| row_error(path, skipped, &e))?;
            let line = record.position().map_or(0, csv::Position::line) + skipped;
            Ok((line as usize, record))
        })
    }
}

fn row_error(path: &Path, skipped: u64, err: &csv::Error) -> LogReadError {
    LogReadError::MalformedRow {
        path: path.to_path_buf(),
        line: err.position().map_or(0, |p| p.line() + skipped) as usize,
        reason: err.to_string(),
    }
}

fn number(path: &Path, line: usize, field: &str) -> Result<f64, LogReadError> {
    field.parse::<f64>().map_err(|e| LogReadError::MalformedRow {
        path: path.to_path_buf(),
        line,
        reason: format!("bad number '{field}': {e}"),
    })
}
