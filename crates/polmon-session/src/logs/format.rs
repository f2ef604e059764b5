//! Text conventions shared by the log writers and readers.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Timestamp format used in coarse rows and transient file names,
/// e.g. `20240131-235959.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S%.6f";

/// Accepts any number of fractional digits when reading.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y%m%d-%H%M%S%.f";

const COARSE_PREFIX: &str = "N778xC_SOP_coarse_";
const TRANSIENT_PREFIX: &str = "N778xC_SOP_transient_";
const EXTENSION: &str = "txt";

/// Render a sweep timestamp.
#[must_use]
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_PARSE_FORMAT)
}

/// Path of the coarse log started at `ts`.
#[must_use]
pub fn coarse_log_path(dir: &Path, ts: &NaiveDateTime) -> PathBuf {
    dir.join(format!("{COARSE_PREFIX}{}.{EXTENSION}", format_timestamp(ts)))
}

/// Path of the transient log for the sweep stamped `ts`.
#[must_use]
pub fn transient_log_path(dir: &Path, ts: &NaiveDateTime) -> PathBuf {
    dir.join(format!("{TRANSIENT_PREFIX}{}.{EXTENSION}", format_timestamp(ts)))
}

/// Format a float the way existing log files do.
///
/// Shortest digits that round-trip. Fixed notation for decimal exponents in
/// `-4..16`, with `.0` appended to integral values; scientific notation
/// outside that range with a signed, at least two-digit exponent.
///
/// ```rust
/// use polmon_session::logs::format_float;
///
/// assert_eq!(format_float(1.0), "1.0");
/// assert_eq!(format_float(0.0001), "0.0001");
/// assert_eq!(format_float(1.5e-5), "1.5e-05");
/// assert_eq!(format_float(1e16), "1e+16");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e2`.
    let sci = format!("{:e}", value.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = digits.len() as i32;

    let body = if (-4..16).contains(&exp) {
        if exp >= k - 1 {
            format!("{digits}{}.0", "0".repeat((exp - (k - 1)) as usize))
        } else if exp >= 0 {
            let (int, frac) = digits.split_at(exp as usize + 1);
            format!("{int}.{frac}")
        } else {
            format!("0.{}{digits}", "0".repeat((-exp - 1) as usize))
        }
    } else {
        let (lead, rest) = digits.split_at(1);
        let exp_sign = if exp < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{lead}e{exp_sign}{:02}", exp.abs())
        } else {
            format!("{lead}.{rest}e{exp_sign}{:02}", exp.abs())
        }
    };
    format!("{sign}{body}")
}

/// Join already-formatted fields into one log row.
pub(crate) fn join_row(fields: &[String]) -> String {
    fields.join(",")
}
