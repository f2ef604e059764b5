//! polmon CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use polmon_cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level when set.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Log(args) => polmon_cli::acquire::execute(args)?,
        Commands::Autocorr(args) => polmon_cli::autocorr::execute(args)?,
        Commands::Version => {
            println!("polmon {}", env!("CARGO_PKG_VERSION"));
            println!("signal analysis version: {}", polmon_signal::VERSION);
        }
    }

    Ok(())
}
