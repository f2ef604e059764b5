//! Plain-text SOP logs.
//!
//! Two files are produced by a session:
//!
//! - the **coarse** log, one `time, Power (W), S1, S2, S3` row per sweep,
//! - one **transient** log per captured sweep, one
//!   `Power (W), Angle (deg), S1, S2, S3` row per sample.
//!
//! Both are comma-separated and readable back with [`read_coarse_log`] and
//! [`read_transient_log`].

mod coarse;
mod format;
mod reader;
mod transient;

pub use coarse::{settings_line, CoarseLog, CoarseLogEntry, COARSE_COLUMNS};
pub use format::{
    coarse_log_path, format_float, format_timestamp, parse_timestamp, transient_log_path,
    TIMESTAMP_FORMAT,
};
pub use reader::{
    read_coarse_log, read_transient_log, read_vectors, CoarseSeries, LogKind, TransientSeries,
};
pub use transient::{TransientLog, TransientRecord, TRANSIENT_COLUMNS};
