//! Diagnostic sink for session progress.
//!
//! The session reports everything it used to print (status, transfer time,
//! maximum angle, file time) through [`SessionObserver`]. All methods have
//! no-op defaults; [`TracingObserver`] forwards them to `tracing`.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;
use polmon_hardware::{Readback, SweepStatus};

use crate::error::SessionError;
use crate::logs::format_timestamp;
use crate::session::SessionSummary;
use crate::state::SessionState;

/// Outcome of one completed sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    /// Zero-based sweep index.
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub samples: usize,
    pub max_angle_deg: f64,
    pub captured: bool,
    /// Transfer time of both buffers.
    pub transfer: Duration,
    /// Time spent writing log files.
    pub file_write: Duration,
}

/// Receives session events.
pub trait SessionObserver {
    fn state_changed(&mut self, _from: SessionState, _to: SessionState) {}

    fn identified(&mut self, _identity: &str) {}

    fn readback(&mut self, _readback: &Readback) {}

    /// One status query while waiting for a sweep. `logged` is the sample
    /// count the instrument reports so far.
    fn status_polled(&mut self, _sweep: usize, _status: &SweepStatus, _logged: &str) {}

    fn transferred(&mut self, _sweep: usize, _elapsed: Duration, _bytes: usize) {}

    fn transient_written(&mut self, _sweep: usize, _path: &Path) {}

    fn sweep_completed(&mut self, _report: &SweepReport) {}

    fn failed(&mut self, _error: &SessionError) {}

    /// The instrument could not be closed cleanly.
    fn close_failed(&mut self, _error: &polmon_hardware::InstrumentError) {}

    fn finished(&mut self, _summary: &SessionSummary) {}
}

impl<O: SessionObserver + ?Sized> SessionObserver for &mut O {
    fn state_changed(&mut self, from: SessionState, to: SessionState) {
        (**self).state_changed(from, to);
    }
    fn identified(&mut self, identity: &str) {
        (**self).identified(identity);
    }
    fn readback(&mut self, readback: &Readback) {
        (**self).readback(readback);
    }
    fn status_polled(&mut self, sweep: usize, status: &SweepStatus, logged: &str) {
        (**self).status_polled(sweep, status, logged);
    }
    fn transferred(&mut self, sweep: usize, elapsed: Duration, bytes: usize) {
        (**self).transferred(sweep, elapsed, bytes);
    }
    fn transient_written(&mut self, sweep: usize, path: &Path) {
        (**self).transient_written(sweep, path);
    }
    fn sweep_completed(&mut self, report: &SweepReport) {
        (**self).sweep_completed(report);
    }
    fn failed(&mut self, error: &SessionError) {
        (**self).failed(error);
    }
    fn close_failed(&mut self, error: &polmon_hardware::InstrumentError) {
        (**self).close_failed(error);
    }
    fn finished(&mut self, summary: &SessionSummary) {
        (**self).finished(summary);
    }
}

/// Observer that logs through `tracing`.
///
/// State changes, poll progress and timing go to `debug`; identity,
/// readbacks, sweep results and captures to `info`; readback mismatches to
/// `warn`; failures to `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn state_changed(&mut self, from: SessionState, to: SessionState) {
        tracing::debug!(%from, %to, "state");
    }

    fn identified(&mut self, identity: &str) {
        tracing::info!(identity, "instrument identified");
    }

    fn readback(&mut self, rb: &Readback) {
        if rb.matches {
            tracing::info!(setting = rb.setting, value = %rb.reported, "setting confirmed");
        } else {
            tracing::warn!(
                setting = rb.setting,
                requested = %rb.requested,
                reported = %rb.reported,
                "instrument reports a different value"
            );
        }
    }

    fn status_polled(&mut self, sweep: usize, status: &SweepStatus, logged: &str) {
        tracing::debug!(sweep, ?status, logged, "poll");
    }

    fn transferred(&mut self, sweep: usize, elapsed: Duration, bytes: usize) {
        tracing::debug!(sweep, xfer_ms = elapsed.as_secs_f64() * 1e3, bytes, "transfer");
    }

    fn transient_written(&mut self, sweep: usize, path: &Path) {
        tracing::info!(sweep, path = %path.display(), "transient captured");
    }

    fn sweep_completed(&mut self, r: &SweepReport) {
        tracing::debug!(sweep = r.index, file_ms = r.file_write.as_secs_f64() * 1e3, "files written");
        tracing::info!(
            sweep = r.index,
            time = %format_timestamp(&r.timestamp),
            samples = r.samples,
            angle_max = r.max_angle_deg,
            captured = r.captured,
            "sweep"
        );
    }

    fn failed(&mut self, error: &SessionError) {
        tracing::error!(stage = %error.stage(), "session aborted: {error}");
    }

    fn close_failed(&mut self, error: &polmon_hardware::InstrumentError) {
        tracing::warn!("closing instrument failed: {error}");
    }

    fn finished(&mut self, s: &SessionSummary) {
        tracing::info!(
            sweeps = s.sweeps,
            transients = s.transients(),
            elapsed_s = s.elapsed.as_secs_f64(),
            coarse_log = %s.coarse_log.display(),
            "session finished"
        );
    }
}
