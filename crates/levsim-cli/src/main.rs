mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::leveraged::{CurveArgs, PathArgs};

/// Payoff simulation for leveraged and structured products
#[derive(Parser)]
#[command(
    name = "levsim",
    version,
    about = "Payoff simulation for leveraged and structured products",
    long_about = "Values daily-reset certificates, CFDs, turbos, mini futures, warrants \
                  and trackers across a range of underlying prices with decimal precision, \
                  simulates explicit day-by-day compounding, and estimates the value lost \
                  to holding costs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Value an instrument across a range of underlying end prices
    Curve(CurveArgs),
    /// Compound a daily-reset certificate over explicit daily moves
    Path(PathArgs),
    /// Median value lost to the daily holding cost across a price range
    FeeImpact(CurveArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Curve(args) => commands::leveraged::run_curve(args),
        Commands::Path(args) => commands::leveraged::run_path(args),
        Commands::FeeImpact(args) => commands::leveraged::run_fee_impact(args),
        Commands::Version => {
            println!("levsim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
