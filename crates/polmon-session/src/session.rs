//! The acquisition session controller.
//!
//! Owns the instrument for its whole lifetime and drives it through
//! configure, then repeated sweep cycles until the runtime budget is spent.
//! The budget starts once configuration has finished and is checked between
//! sweeps only; a sweep in flight always runs to completion or to a fatal
//! error.

use std::path::PathBuf;
use std::time::Duration;

use polmon_hardware::{
    InstrumentError, InstrumentPort, Polarimeter, SweepResult, SweepStatus, WaveformDecoder,
};
use polmon_signal::{max_angle, should_capture, sweep_deviation};

use crate::clock::{Clock, SystemClock};
use crate::config::AcquisitionConfig;
use crate::error::SessionError;
use crate::logs::{CoarseLog, CoarseLogEntry, TransientLog, TransientRecord};
use crate::observer::{SessionObserver, SweepReport, TracingObserver};
use crate::state::SessionState;

/// What a completed session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Completed sweeps.
    pub sweeps: usize,
    pub coarse_log: PathBuf,
    /// One path per captured sweep, in capture order.
    pub transient_logs: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl SessionSummary {
    /// Number of captured sweeps.
    #[must_use]
    pub fn transients(&self) -> usize {
        self.transient_logs.len()
    }
}

/// A single acquisition session.
///
/// # Example
///
/// ```rust,no_run
/// use polmon_hardware::ScpiSocket;
/// use polmon_session::{AcquisitionConfig, AcquisitionSession};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AcquisitionConfig::default();
/// let port = ScpiSocket::connect(&config.resource, config.port, config.io_timeout())?;
/// let summary = AcquisitionSession::with_port(config, port)?.run()?;
/// println!("{} sweeps, {} transients", summary.sweeps, summary.transients());
/// # Ok(())
/// # }
/// ```
pub struct AcquisitionSession<P, C = SystemClock, O = TracingObserver>
where
    P: InstrumentPort,
    C: Clock,
    O: SessionObserver,
{
    config: AcquisitionConfig,
    instrument: Polarimeter<P>,
    clock: C,
    observer: O,
    state: SessionState,
}

impl<P: InstrumentPort> AcquisitionSession<P> {
    /// Session on the system clock, reporting through `tracing`.
    pub fn with_port(config: AcquisitionConfig, port: P) -> Result<Self, SessionError> {
        Self::new(config, port, SystemClock::new(), TracingObserver)
    }
}

impl<P, C, O> AcquisitionSession<P, C, O>
where
    P: InstrumentPort,
    C: Clock,
    O: SessionObserver,
{
    /// Validate `config` and take ownership of the open instrument port.
    pub fn new(config: AcquisitionConfig, port: P, clock: C, observer: O) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config,
            instrument: Polarimeter::new(port),
            clock,
            observer,
            state: SessionState::Configuring,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion.
    ///
    /// The instrument is closed whether or not the session succeeds. A
    /// failure to close is reported to the observer and does not replace
    /// the session's own result.
    pub fn run(mut self) -> Result<SessionSummary, SessionError> {
        let outcome = self.acquire();

        if let Err(err) = &outcome {
            self.observer.failed(err);
        }
        self.transition(SessionState::Closed);
        if let Err(err) = self.instrument.close() {
            self.observer.close_failed(&err);
        }
        if let Ok(summary) = &outcome {
            self.observer.finished(summary);
        }
        outcome
    }

    fn acquire(&mut self) -> Result<SessionSummary, SessionError> {
        let coarse = CoarseLog::create(
            &self.config.output_dir,
            &self.clock.wall_time(),
            self.config.averaging,
            self.config.sample_rate,
        )
        .map_err(|source| SessionError::Log {
            stage: SessionState::Configuring,
            source,
        })?;

        self.configure()?;
        let started = self.clock.now();

        let runtime = self.config.runtime();
        let mut transient_logs = Vec::new();
        let mut sweeps = 0;
        while self.clock.now().saturating_sub(started) < runtime
            && self.config.max_sweeps.map_or(true, |max| sweeps < max)
        {
            if let Some(path) = self.sweep(sweeps, &coarse)? {
                transient_logs.push(path);
            }
            sweeps += 1;
        }

        Ok(SessionSummary {
            sweeps,
            coarse_log: coarse.path().to_path_buf(),
            transient_logs,
            elapsed: self.clock.now().saturating_sub(started),
        })
    }

    fn configure(&mut self) -> Result<(), SessionError> {
        self.instrument.reset().map_err(configuring("reset"))?;
        self.instrument.enable_controller().map_err(configuring("enable polarization controller"))?;
        let identity = self.instrument.identify().map_err(configuring("identify"))?;
        self.observer.identified(&identity);
        self.instrument
            .set_manual_gain(self.config.gain)
            .map_err(configuring("set gain"))?;

        let readbacks = [
            self.instrument
                .set_wavelength(&self.config.wavelength)
                .map_err(configuring("set wavelength"))?,
            self.instrument
                .set_samples(self.config.samples_per_sweep)
                .map_err(configuring("set samples"))?,
            self.instrument
                .set_sample_rate(self.config.sample_rate, self.config.averaging)
                .map_err(configuring("set sample rate"))?,
            self.instrument.set_single_shot().map_err(configuring("set loop count"))?,
        ];
        for rb in &readbacks {
            self.observer.readback(rb);
        }
        Ok(())
    }

    /// One full sweep cycle. Returns the transient log path if the sweep was
    /// captured.
    fn sweep(&mut self, index: usize, coarse: &CoarseLog) -> Result<Option<PathBuf>, SessionError> {
        self.transition(SessionState::SweepStart);
        self.instrument
            .start_sweep()
            .map_err(|e| SessionError::instrument(SessionState::SweepStart, "start sweep", e))?;

        self.transition(SessionState::Polling);
        self.wait_for_data(index)?;

        self.transition(SessionState::Fetching);
        let (sweep, transfer) = self.fetch(index)?;
        let timestamp = self.clock.wall_time();

        self.transition(SessionState::Analyzing);
        if sweep.is_empty() {
            return Err(SessionError::EmptySweep { sweep: index });
        }
        let angles = sweep_deviation(sweep.samples());
        let max_angle_deg = max_angle(&angles);
        let captured = should_capture(&angles, self.config.angle_threshold_deg);

        self.transition(SessionState::Logging);
        let log_err = |source| SessionError::Log {
            stage: SessionState::Logging,
            source,
        };
        let write_started = self.clock.now();
        if let Some(entry) = CoarseLogEntry::from_sweep(timestamp, &sweep) {
            coarse.append(&entry).map_err(log_err)?;
        }
        let transient = if captured {
            let record = TransientRecord {
                timestamp,
                sweep: &sweep,
                angles: &angles,
            };
            let path = TransientLog::write(&self.config.output_dir, &record).map_err(log_err)?;
            self.observer.transient_written(index, &path);
            Some(path)
        } else {
            None
        };
        let file_write = self.clock.now().saturating_sub(write_started);

        self.observer.sweep_completed(&SweepReport {
            index,
            timestamp,
            samples: sweep.len(),
            max_angle_deg,
            captured,
            transfer,
            file_write,
        });
        Ok(transient)
    }

    /// Poll until the instrument reports data available or the poll ceiling
    /// is reached.
    fn wait_for_data(&mut self, index: usize) -> Result<(), SessionError> {
        let stage = SessionState::Polling;
        let ceiling = self.config.poll_ceiling();
        let interval = self.config.poll_interval();
        let begin = self.clock.now();

        loop {
            let status = self
                .instrument
                .poll_status()
                .map_err(|e| SessionError::instrument(stage, "query sweep state", e))?;
            let logged = self
                .instrument
                .current_samples()
                .map_err(|e| SessionError::instrument(stage, "query logged samples", e))?;
            self.observer.status_polled(index, &status, &logged);

            let status_text = match status {
                SweepStatus::DataAvailable => return Ok(()),
                SweepStatus::Pending(text) => text,
            };

            let waited = self.clock.now().saturating_sub(begin);
            if waited >= ceiling {
                return Err(SessionError::PollTimeout {
                    sweep: index,
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    last_status: status_text,
                });
            }
            self.clock.sleep(interval);
        }
    }

    fn fetch(&mut self, index: usize) -> Result<(SweepResult, Duration), SessionError> {
        let stage = SessionState::Fetching;
        let started = self.clock.now();
        let sop = self
            .instrument
            .fetch_sop()
            .map_err(|e| SessionError::instrument(stage, "fetch SOP buffer", e))?;
        let power = self
            .instrument
            .fetch_power()
            .map_err(|e| SessionError::instrument(stage, "fetch power buffer", e))?;
        let transfer = self.clock.now().saturating_sub(started);
        self.observer.transferred(index, transfer, sop.len() + power.len());

        let sweep = WaveformDecoder::decode(&sop, &power, self.config.samples_per_sweep)
            .map_err(|source| SessionError::Decode { sweep: index, source })?;
        Ok((sweep, transfer))
    }

    fn transition(&mut self, to: SessionState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal transition {} -> {to}",
            self.state
        );
        self.observer.state_changed(self.state, to);
        self.state = to;
    }
}

/// Error mapper for a failed configuration step.
fn configuring(action: &'static str) -> impl FnOnce(InstrumentError) -> SessionError {
    move |e| SessionError::instrument(SessionState::Configuring, action, e)
}
