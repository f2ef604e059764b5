//! polmon CLI
//!
//! Long-term state-of-polarization logging with an N778xC polarimeter, and
//! offline autocorrelation of the resulting logs.
//!
//! # Usage
//!
//! ```bash
//! # Log for 12 hours, storing sweeps that drift by more than 2 degrees
//! polmon log -t 12 -T 2 -o /data/pol
//!
//! # Autocorrelation of a coarse log
//! polmon autocorr --kind coarse /data/pol/N778xC_SOP_coarse_*.txt
//! ```

use clap::{Parser, Subcommand, ValueEnum};

pub mod acquire;
pub mod autocorr;

/// Polarization monitoring command line interface
#[derive(Parser, Debug)]
#[command(name = "polmon")]
#[command(author, version, about = "Long-term polarization monitoring")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Console log level (overridden by RUST_LOG)
    #[arg(short = 'l', long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an acquisition session against the polarimeter
    Log(acquire::LogArgs),

    /// Compute SOP autocorrelation curves from log files
    Autocorr(autocorr::AutocorrArgs),

    /// Display version information
    Version,
}

/// Console verbosity. Also accepts `d`, `i`, `w`, `e` and `c` (critical,
/// treated as error).
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    #[value(alias = "d")]
    Debug,
    #[value(alias = "i")]
    Info,
    #[value(alias = "w")]
    Warn,
    #[value(aliases = ["e", "c", "critical"])]
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    #[must_use]
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
