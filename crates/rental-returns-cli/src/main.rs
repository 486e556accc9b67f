mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::AnalyzeArgs;
use commands::financing::AmortizeArgs;
use commands::returns::IrrArgs;

/// Rental property cash-flow and return analysis
#[derive(Parser)]
#[command(
    name = "rra",
    version,
    about = "Rental property cash-flow and return analysis",
    long_about = "A CLI for underwriting rental properties with decimal precision. \
                  Computes year-1 KPIs, a multi-year cash-flow projection with one or two \
                  loans, exit proceeds, IRR and equity multiple."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Emit debug logs on stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a property: year-1 KPIs, projection, exit and IRR
    Analyze(AnalyzeArgs),
    /// Build an annual amortization schedule for one loan
    Amortize(AmortizeArgs),
    /// Solve the IRR of an annual cash-flow series
    Irr(IrrArgs),
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
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::Irr(args) => commands::returns::run_irr(args),
        Commands::Version => {
            println!("rra {}", env!("CARGO_PKG_VERSION"));
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
