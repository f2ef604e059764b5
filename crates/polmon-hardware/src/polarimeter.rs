//! Command driver for N778xC-family polarimeters.
//!
//! Wraps an [`InstrumentPort`] and exposes the handful of operations an
//! acquisition session needs. The driver holds no acquisition state of its
//! own; every method maps to one or two SCPI exchanges.

use crate::error::InstrumentError;
use crate::port::InstrumentPort;
use crate::settings::{AveragingTime, SampleRate};

/// Largest sweep the instrument accepts.
pub const MAX_SAMPLES_PER_SWEEP: usize = 1_000_000;

/// SCPI commands used by the driver.
pub mod commands {
    pub const RESET: &str = "*RST";
    pub const OPERATION_COMPLETE: &str = "*OPC?";
    pub const IDENTIFY: &str = "*IDN?";
    pub const CONTROLLER_SWITCH: &str = "PCON:SWIT";
    pub const AUTOGAIN_FLAG: &str = ":POLarimeter:AGFlag";
    pub const GAIN: &str = ":POLarimeter:GAIN";
    pub const WAVELENGTH: &str = ":POLarimeter:WAVelength";
    pub const SAMPLES: &str = ":POLarimeter:SWEep:SAMPles";
    pub const SAMPLE_RATE: &str = ":POLarimeter:SWEep:SRATe";
    pub const LOOP: &str = ":POLarimeter:SWEep:LOOP";
    pub const START_SOP: &str = "POLarimeter:SWEep:STARt SOP";
    pub const STATE: &str = "POLarimeter:SWEep:STATe?";
    pub const CURRENT_SAMPLES: &str = ":POLarimeter:SWEep:SAMPles:CURRent?";
    pub const FETCH_SOP: &str = ":POLarimeter:SWEep:GET? NORM";
    pub const FETCH_POWER: &str = ":POLarimeter:FUNCtion:RESult?";
}

/// Loop count for single-shot sweeps.
const SINGLE_SHOT: u32 = 1;

/// Relative tolerance when comparing numeric readbacks.
const READBACK_RTOL: f64 = 1e-9;

/// Sweep status reported by the instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepStatus {
    /// The sweep finished and its buffers can be fetched.
    DataAvailable,
    /// Still acquiring; carries the raw status text.
    Pending(String),
}

impl SweepStatus {
    /// Interpret a `STATe?` reply such as `READY,DATA_AVAILABLE`.
    #[must_use]
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim();
        if reply.to_ascii_uppercase().contains("DATA_AVAILABLE") {
            Self::DataAvailable
        } else {
            Self::Pending(reply.to_owned())
        }
    }

    /// Whether the buffers are ready.
    #[must_use]
    pub fn is_data_available(&self) -> bool {
        matches!(self, Self::DataAvailable)
    }
}

/// A setting pushed to the instrument and the value it reported back.
#[derive(Debug, Clone, PartialEq)]
pub struct Readback {
    /// Short setting name (`wavelength`, `samples`, ...).
    pub setting: &'static str,
    /// Value that was sent.
    pub requested: String,
    /// Value the instrument reported.
    pub reported: String,
    /// Whether the two agree.
    pub matches: bool,
}

impl Readback {
    fn new(setting: &'static str, requested: impl Into<String>, reported: String) -> Self {
        let requested = requested.into();
        let matches = settings_match(&requested, &reported);
        Self {
            setting,
            requested,
            reported,
            matches,
        }
    }
}

/// Compare a requested setting with its readback.
///
/// Numbers compare with a relative tolerance (`1550e-6` matches
/// `+1.55000000E-003`); comma-separated lists compare element-wise; anything
/// else compares case-insensitively without quotes.
#[must_use]
pub fn settings_match(requested: &str, reported: &str) -> bool {
    let requested: Vec<&str> = requested.split(',').map(clean).collect();
    let reported: Vec<&str> = reported.split(',').map(clean).collect();
    requested.len() == reported.len()
        && requested
            .iter()
            .zip(&reported)
            .all(|(a, b)| field_matches(a, b))
}

fn clean(s: &str) -> &str {
    s.trim().trim_matches('"')
}

fn field_matches(a: &str, b: &str) -> bool {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => {
            let scale = x.abs().max(y.abs());
            (x - y).abs() <= READBACK_RTOL * scale
        }
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// Polarimeter driver over any [`InstrumentPort`].
pub struct Polarimeter<P: InstrumentPort> {
    port: P,
}

impl<P: InstrumentPort> Polarimeter<P> {
    /// Wrap an open instrument port.
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Reset to power-on defaults and wait for completion.
    pub fn reset(&mut self) -> Result<(), InstrumentError> {
        self.port.write(commands::RESET)?;
        self.port.query(commands::OPERATION_COMPLETE)?;
        Ok(())
    }

    /// Switch the polarization controller on and wait for completion.
    pub fn enable_controller(&mut self) -> Result<(), InstrumentError> {
        self.port.configure(commands::CONTROLLER_SWITCH, "1")?;
        self.port.query(commands::OPERATION_COMPLETE)?;
        Ok(())
    }

    /// Identity string.
    pub fn identify(&mut self) -> Result<String, InstrumentError> {
        Ok(self.port.query(commands::IDENTIFY)?.trim().to_owned())
    }

    /// Disable autogain and fix the polarimeter gain.
    pub fn set_manual_gain(&mut self, gain: u32) -> Result<(), InstrumentError> {
        self.port.write(commands::AUTOGAIN_FLAG)?;
        self.port.configure(commands::GAIN, &gain.to_string())
    }

    /// Set the wavelength; the value is sent verbatim.
    pub fn set_wavelength(&mut self, wavelength: &str) -> Result<Readback, InstrumentError> {
        self.set_and_read("wavelength", commands::WAVELENGTH, wavelength)
    }

    /// Set the number of samples per sweep.
    pub fn set_samples(&mut self, samples: usize) -> Result<Readback, InstrumentError> {
        self.set_and_read("samples", commands::SAMPLES, &samples.to_string())
    }

    /// Set sample rate and averaging time.
    pub fn set_sample_rate(
        &mut self,
        rate: SampleRate,
        averaging: AveragingTime,
    ) -> Result<Readback, InstrumentError> {
        let value = format!("{},{}", rate.as_scpi(), averaging.as_scpi());
        self.set_and_read("rate", commands::SAMPLE_RATE, &value)
    }

    /// Configure one sweep per start command.
    pub fn set_single_shot(&mut self) -> Result<Readback, InstrumentError> {
        self.set_and_read("loop", commands::LOOP, &SINGLE_SHOT.to_string())
    }

    /// Start a single SOP sweep.
    pub fn start_sweep(&mut self) -> Result<(), InstrumentError> {
        self.port.write(commands::START_SOP)
    }

    /// Query the sweep status.
    pub fn poll_status(&mut self) -> Result<SweepStatus, InstrumentError> {
        Ok(SweepStatus::parse(&self.port.query(commands::STATE)?))
    }

    /// Number of samples logged so far in the running sweep, as reported.
    pub fn current_samples(&mut self) -> Result<String, InstrumentError> {
        Ok(self.port.query(commands::CURRENT_SAMPLES)?.trim().to_owned())
    }

    /// Raw interleaved SOP buffer of the last sweep.
    pub fn fetch_sop(&mut self) -> Result<Vec<u8>, InstrumentError> {
        self.port.query_binary(commands::FETCH_SOP)
    }

    /// Raw power buffer of the last sweep.
    pub fn fetch_power(&mut self) -> Result<Vec<u8>, InstrumentError> {
        self.port.query_binary(commands::FETCH_POWER)
    }

    /// Release the instrument session.
    pub fn close(&mut self) -> Result<(), InstrumentError> {
        self.port.close()
    }

    /// Give back the underlying port.
    pub fn into_inner(self) -> P {
        self.port
    }

    fn set_and_read(
        &mut self,
        setting: &'static str,
        param: &str,
        value: &str,
    ) -> Result<Readback, InstrumentError> {
        self.port.configure(param, value)?;
        let reported = self.port.query(&format!("{param}?"))?.trim().to_owned();
        Ok(Readback::new(setting, value, reported))
    }
}
