//! Acquisition configuration.
//!
//! [`AcquisitionConfig`] is set once when a session starts and is never
//! mutated afterwards. It is serializable via [`serde`] so a run can be
//! reproduced from a JSON file.
//!
//! # Example
//!
//! ```rust
//! use polmon_session::AcquisitionConfig;
//!
//! let cfg = AcquisitionConfig::default();
//! cfg.validate().expect("default config is valid");
//! assert_eq!(cfg.samples_per_sweep, 100_000);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use polmon_hardware::MAX_SAMPLES_PER_SWEEP;
use polmon_hardware::{AveragingTime, SampleRate, DEFAULT_SCPI_PORT};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Slack added to the derived poll ceiling.
const POLL_CEILING_SLACK: Duration = Duration::from_secs(60);

/// Complete configuration of one acquisition session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    // -----------------------------------------------------------------------
    // Instrument
    // -----------------------------------------------------------------------
    /// Instrument resource, VISA-style (`TCPIP0::<host>::inst0::INSTR`) or
    /// `host[:port]`.
    pub resource: String,

    /// TCP port used when the resource does not name one. Default: **5025**.
    pub port: u16,

    /// Per-command timeout in milliseconds. Default: **10000**.
    pub io_timeout_ms: u64,

    /// Wavelength, sent to the instrument verbatim. Default: **`1550e-6`**.
    pub wavelength: String,

    /// Manual polarimeter gain (autogain is disabled). Default: **8**.
    pub gain: u32,

    // -----------------------------------------------------------------------
    // Sweep
    // -----------------------------------------------------------------------
    /// Samples per sweep, `0..=1_000_000`. Default: **100000**.
    pub samples_per_sweep: usize,

    /// Per-sample averaging time. Default: **1us**.
    pub averaging: AveragingTime,

    /// Sample rate. Default: **0.1MHz**.
    pub sample_rate: SampleRate,

    /// Maximum intra-sweep deviation (degrees) tolerated before a sweep is
    /// stored in full. Default: **5.0**.
    pub angle_threshold_deg: f64,

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------
    /// Wall-clock budget in seconds, checked between sweeps. Default: **3600**.
    pub runtime_secs: f64,

    /// Stop after this many sweeps even if runtime remains.
    pub max_sweeps: Option<usize>,

    /// Directory receiving the coarse and transient logs.
    pub output_dir: PathBuf,

    /// Delay between sweep status queries in milliseconds. Default: **100**.
    pub poll_interval_ms: u64,

    /// Longest time to wait for one sweep's data, in seconds. When unset the
    /// ceiling is twice the nominal sweep duration plus one minute.
    pub poll_timeout_secs: Option<f64>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig {
            resource: "TCPIP0::100.65.27.149::inst0::INSTR".to_owned(),
            port: DEFAULT_SCPI_PORT,
            io_timeout_ms: 10_000,
            wavelength: "1550e-6".to_owned(),
            gain: 8,
            samples_per_sweep: 100_000,
            averaging: AveragingTime::Us1,
            sample_rate: SampleRate::Khz100,
            angle_threshold_deg: 5.0,
            runtime_secs: 3600.0,
            max_sweeps: None,
            output_dir: PathBuf::from("."),
            poll_interval_ms: 100,
            poll_timeout_secs: None,
        }
    }
}

impl AcquisitionConfig {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileRead`] if the file cannot be opened,
    /// [`ConfigError::InvalidValue`] if the JSON is malformed or a value is
    /// out of range.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: AcquisitionConfig = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::invalid_value("(file)", e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this configuration as pretty-printed JSON, creating parent
    /// directories if necessary.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate all fields, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resource.trim().is_empty() {
            return Err(ConfigError::invalid_value("resource", "must not be empty"));
        }
        if self.io_timeout_ms == 0 {
            return Err(ConfigError::invalid_value("io_timeout_ms", "must be > 0"));
        }
        if self.wavelength.trim().is_empty() {
            return Err(ConfigError::invalid_value("wavelength", "must not be empty"));
        }
        if self.samples_per_sweep > MAX_SAMPLES_PER_SWEEP {
            return Err(ConfigError::invalid_value(
                "samples_per_sweep",
                format!("must be <= {MAX_SAMPLES_PER_SWEEP}"),
            ));
        }
        if !self.angle_threshold_deg.is_finite() || self.angle_threshold_deg < 0.0 {
            return Err(ConfigError::invalid_value(
                "angle_threshold_deg",
                "must be a finite value >= 0.0",
            ));
        }
        if Duration::try_from_secs_f64(self.runtime_secs).is_err() {
            return Err(ConfigError::invalid_value(
                "runtime_secs",
                "must be a finite, representable value >= 0.0",
            ));
        }
        if self.max_sweeps == Some(0) {
            return Err(ConfigError::invalid_value("max_sweeps", "must be > 0 when set"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_value("poll_interval_ms", "must be > 0"));
        }
        if let Some(secs) = self.poll_timeout_secs {
            if secs <= 0.0 || Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::invalid_value(
                    "poll_timeout_secs",
                    "must be a finite value > 0.0 when set",
                ));
            }
        }
        Ok(())
    }

    /// Session runtime budget.
    #[must_use]
    pub fn runtime(&self) -> Duration {
        Duration::try_from_secs_f64(self.runtime_secs).unwrap_or(Duration::MAX)
    }

    /// Per-command instrument timeout.
    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Delay between status queries.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Nominal acquisition time of one sweep: samples / rate.
    #[must_use]
    pub fn nominal_sweep_duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples_per_sweep as f64 / self.sample_rate.hz())
    }

    /// Longest time to poll for one sweep's data.
    #[must_use]
    pub fn poll_ceiling(&self) -> Duration {
        match self.poll_timeout_secs {
            Some(secs) => Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX),
            None => self.nominal_sweep_duration() * 2 + POLL_CEILING_SLACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        AcquisitionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let cases: Vec<(&str, AcquisitionConfig)> = vec![
            ("samples_per_sweep", AcquisitionConfig { samples_per_sweep: 1_000_001, ..Default::default() }),
            ("angle_threshold_deg", AcquisitionConfig { angle_threshold_deg: -1.0, ..Default::default() }),
            ("angle_threshold_deg", AcquisitionConfig { angle_threshold_deg: f64::NAN, ..Default::default() }),
            ("runtime_secs", AcquisitionConfig { runtime_secs: -5.0, ..Default::default() }),
            ("poll_timeout_secs", AcquisitionConfig { poll_timeout_secs: Some(0.0), ..Default::default() }),
            ("max_sweeps", AcquisitionConfig { max_sweeps: Some(0), ..Default::default() }),
        ];
        for (field, cfg) in cases {
            match cfg.validate() {
                Err(ConfigError::InvalidValue { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected {field} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_boundary_sample_counts_are_accepted() {
        for n in [0, MAX_SAMPLES_PER_SWEEP] {
            let cfg = AcquisitionConfig { samples_per_sweep: n, ..Default::default() };
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn test_derived_poll_ceiling() {
        let cfg = AcquisitionConfig {
            samples_per_sweep: 1_000,
            sample_rate: SampleRate::Hz10,
            ..Default::default()
        };
        // 1000 samples at 10 Hz = 100 s nominal.
        assert_eq!(cfg.poll_ceiling(), Duration::from_secs(260));

        let cfg = AcquisitionConfig { poll_timeout_secs: Some(2.5), ..cfg };
        assert_eq!(cfg.poll_ceiling(), Duration::from_millis(2500));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("acq.json");
        let cfg = AcquisitionConfig {
            sample_rate: SampleRate::Hz10,
            averaging: AveragingTime::Us100,
            max_sweeps: Some(3),
            ..Default::default()
        };
        cfg.to_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"10Hz\""));
        assert!(text.contains("\"100us\""));
        assert_eq!(AcquisitionConfig::from_json(&path).unwrap(), cfg);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acq.json");
        std::fs::write(&path, r#"{ "angle_threshold_deg": 2.5, "sample_rate": "0.5MHz" }"#).unwrap();

        let cfg = AcquisitionConfig::from_json(&path).unwrap();
        assert_eq!(cfg.angle_threshold_deg, 2.5);
        assert_eq!(cfg.sample_rate, SampleRate::Khz500);
        assert_eq!(cfg.samples_per_sweep, 100_000);
    }

    #[test]
    fn test_unknown_rate_in_json_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acq.json");
        std::fs::write(&path, r#"{ "sample_rate": "1MHz" }"#).unwrap();
        assert!(matches!(
            AcquisitionConfig::from_json(&path),
            Err(ConfigError::InvalidValue { field: "(file)", .. })
        ));
    }
}
