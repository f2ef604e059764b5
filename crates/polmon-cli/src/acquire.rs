//! `polmon log`: run an acquisition session.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use polmon_hardware::{AveragingTime, SampleRate, ScpiSocket};
use polmon_session::{AcquisitionConfig, AcquisitionSession, SessionSummary};

/// Arguments for the log command
#[derive(Args, Debug, Default)]
pub struct LogArgs {
    /// Time to run the measurement, in hours [default: 1]
    #[arg(short = 't', long = "time", value_name = "HOURS")]
    pub hours: Option<f64>,

    /// Directory in which to store the log files [default: .]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Samples per sweep, 0..=1000000 [default: 100000]
    #[arg(short, long)]
    pub points: Option<usize>,

    /// Averaging time per sample [default: 1us]
    #[arg(short, long, value_enum)]
    pub average: Option<AveragingArg>,

    /// Sample rate [default: 0.1MHz]
    #[arg(short, long, value_enum)]
    pub rate: Option<RateArg>,

    /// Deviation in degrees above which a sweep is stored in full [default: 5]
    #[arg(short = 'T', long)]
    pub threshold: Option<f64>,

    /// Instrument resource (VISA TCPIP string or host[:port])
    #[arg(long, env = "POLMON_RESOURCE")]
    pub resource: Option<String>,

    /// Stop after this many sweeps
    #[arg(long)]
    pub max_sweeps: Option<usize>,

    /// Start from a JSON configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    pub dump_config: bool,
}

/// Averaging time argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AveragingArg {
    #[value(name = "1us")]
    Us1,
    #[value(name = "100us")]
    Us100,
}

impl From<AveragingArg> for AveragingTime {
    fn from(val: AveragingArg) -> Self {
        match val {
            AveragingArg::Us1 => AveragingTime::Us1,
            AveragingArg::Us100 => AveragingTime::Us100,
        }
    }
}

/// Sample rate argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateArg {
    #[value(name = "0.1MHz")]
    Khz100,
    #[value(name = "0.5MHz")]
    Khz500,
    #[value(name = "10Hz")]
    Hz10,
}

impl From<RateArg> for SampleRate {
    fn from(val: RateArg) -> Self {
        match val {
            RateArg::Khz100 => SampleRate::Khz100,
            RateArg::Khz500 => SampleRate::Khz500,
            RateArg::Hz10 => SampleRate::Hz10,
        }
    }
}

impl LogArgs {
    /// Resolve the session configuration: defaults, then `--config`, then flags.
    pub fn resolve(&self) -> Result<AcquisitionConfig> {
        let mut cfg = match &self.config {
            Some(path) => AcquisitionConfig::from_json(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AcquisitionConfig::default(),
        };

        if let Some(hours) = self.hours {
            cfg.runtime_secs = hours * 3600.0;
        }
        if let Some(dir) = &self.output {
            cfg.output_dir = dir.clone();
        }
        if let Some(points) = self.points {
            cfg.samples_per_sweep = points;
        }
        if let Some(avg) = self.average {
            cfg.averaging = avg.into();
        }
        if let Some(rate) = self.rate {
            cfg.sample_rate = rate.into();
        }
        if let Some(threshold) = self.threshold {
            cfg.angle_threshold_deg = threshold;
        }
        if let Some(resource) = &self.resource {
            cfg.resource = resource.clone();
        }
        if self.max_sweeps.is_some() {
            cfg.max_sweeps = self.max_sweeps;
        }

        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}

/// Execute the log command
pub fn execute(args: LogArgs) -> Result<()> {
    let cfg = args.resolve()?;

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;

    print_banner(&cfg);

    let port = ScpiSocket::connect(&cfg.resource, cfg.port, cfg.io_timeout())
        .with_context(|| format!("connecting to {}", cfg.resource))?;
    let summary = AcquisitionSession::with_port(cfg, port)?.run()?;

    print_summary(&summary);
    Ok(())
}

fn print_banner(cfg: &AcquisitionConfig) {
    println!("{} {}", "[POLMON]".bright_cyan().bold(), "Starting acquisition".bold());
    println!("  Resource:   {}", cfg.resource);
    println!(
        "  Sweep:      {} samples @ {}, averaging {}",
        cfg.samples_per_sweep, cfg.sample_rate, cfg.averaging
    );
    println!("  Threshold:  {} deg", cfg.angle_threshold_deg);
    println!("  Runtime:    {:.2} h", cfg.runtime_secs / 3600.0);
    println!("  Output:     {}", cfg.output_dir.display());
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!(
        "{} {} sweeps in {:.1} s, {} transients",
        "[OK]".green().bold(),
        summary.sweeps,
        summary.elapsed.as_secs_f64(),
        summary.transients().to_string().yellow().bold()
    );
    println!("  Coarse log: {}", summary.coarse_log.display());
    for path in &summary.transient_logs {
        println!("  Transient:  {}", path.display());
    }
}
