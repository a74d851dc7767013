mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::allocation::{CoverArgs, FitArgs};
use commands::deal::{ProceedsArgs, ScheduleArgs};
use commands::engine::ComputeArgs;
use commands::rate::RateArgs;

/// Capital-raising analysis for consortium credit quotas
#[derive(Parser)]
#[command(
    name = "qcap",
    version,
    about = "Capital-raising analysis for consortium credit quotas",
    long_about = "Decimal-precision analysis of consortium-quota monetization deals: \
                  amortization schedules, net proceeds, effective cost (IRR), \
                  collateral sufficiency and greedy guarantee allocation."
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
    /// Build the month-by-month amortization schedule for a deal
    Schedule(ScheduleArgs),
    /// Net proceeds of a deal at disbursement
    Proceeds(ProceedsArgs),
    /// Solve the effective per-period rate of a cash-flow stream
    Rate(RateArgs),
    /// Minimal-cover guarantee selection over a collateral inventory
    Cover(CoverArgs),
    /// Maximal-fit selection over marketplace quotas
    Fit(FitArgs),
    /// Full analysis: schedule, rates, collateral sufficiency and alerts
    Compute(ComputeArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::deal::run_schedule(args),
        Commands::Proceeds(args) => commands::deal::run_proceeds(args),
        Commands::Rate(args) => commands::rate::run_rate(args),
        Commands::Cover(args) => commands::allocation::run_cover(args),
        Commands::Fit(args) => commands::allocation::run_fit(args),
        Commands::Compute(args) => commands::engine::run_compute(args),
        Commands::Version => {
            println!("qcap {}", env!("CARGO_PKG_VERSION"));
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
