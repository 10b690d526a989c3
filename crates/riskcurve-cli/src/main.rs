mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::curves::CurvesArgs;
use commands::pricing::{ImpliedVolArgs, PriceArgs};
use commands::regimes::RegimesArgs;

/// Option P&L curves, Greeks and pricing for multi-leg positions
#[derive(Parser)]
#[command(
    name = "riskcurve",
    version,
    about = "Option P&L curves, Greeks and pricing for multi-leg positions",
    long_about = "A CLI over the riskcurve engine. Builds expiration and theoretical \
                  P&L curves with breakevens and position Greeks, prices single options \
                  under the closed-form, smile or simulated models, and solves implied \
                  volatility. Input is JSON or YAML from --input, or JSON on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build P&L curves, breakevens and Greeks for a set of strategies
    Curves(CurvesArgs),
    /// Price a single option with Greeks
    Price(PriceArgs),
    /// Solve implied volatility from a market price
    ImpliedVol(ImpliedVolArgs),
    /// Show the market regime skew table
    Regimes(RegimesArgs),
    /// Show version information
    Version,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Curves(args) => commands::curves::run_curves(args),
        Commands::Price(args) => commands::pricing::run_price(args),
        Commands::ImpliedVol(args) => commands::pricing::run_implied_vol(args),
        Commands::Regimes(args) => commands::regimes::run_regimes(args),
        Commands::Version => {
            println!("riskcurve {}", env!("CARGO_PKG_VERSION"));
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
