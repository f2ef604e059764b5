//! Acquisition settings understood by the polarimeter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Averaging time applied to each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AveragingTime {
    /// 1 µs.
    #[default]
    #[serde(rename = "1us")]
    Us1,
    /// 100 µs.
    #[serde(rename = "100us")]
    Us100,
}

impl AveragingTime {
    /// Value sent in the `SRATe` command and written to the coarse log header.
    #[must_use]
    pub fn as_scpi(&self) -> &'static str {
        match self {
            Self::Us1 => "1us",
            Self::Us100 => "100us",
        }
    }
}

/// Sweep sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleRate {
    /// 0.1 MHz.
    #[default]
    #[serde(rename = "0.1MHz")]
    Khz100,
    /// 0.5 MHz.
    #[serde(rename = "0.5MHz")]
    Khz500,
    /// 10 Hz.
    #[serde(rename = "10Hz")]
    Hz10,
}

impl SampleRate {
    /// Value sent in the `SRATe` command and written to the coarse log header.
    #[must_use]
    pub fn as_scpi(&self) -> &'static str {
        match self {
            Self::Khz100 => "0.1MHz",
            Self::Khz500 => "0.5MHz",
            Self::Hz10 => "10Hz",
        }
    }

    /// Samples per second.
    #[must_use]
    pub fn hz(&self) -> f64 {
        match self {
            Self::Khz100 => 100_000.0,
            Self::Khz500 => 500_000.0,
            Self::Hz10 => 10.0,
        }
    }
}

impl fmt::Display for AveragingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_scpi())
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_scpi())
    }
}

impl FromStr for AveragingTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1us" => Ok(Self::Us1),
            "100us" => Ok(Self::Us100),
            other => Err(format!("unknown averaging time '{other}' (expected 1us or 100us)")),
        }
    }
}

impl FromStr for SampleRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0.1MHz" => Ok(Self::Khz100),
            "0.5MHz" => Ok(Self::Khz500),
            "10Hz" => Ok(Self::Hz10),
            other => Err(format!(
                "unknown sample rate '{other}' (expected 0.1MHz, 0.5MHz or 10Hz)"
            )),
        }
    }
}
