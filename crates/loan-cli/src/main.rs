mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::amortization::{MaxLoanArgs, ScheduleArgs, SimpleInterestArgs};
use commands::application::ApplicationArgs;
use commands::risk::AssessArgs;

/// Loan amortization schedules and applicant risk assessment
#[derive(Parser)]
#[command(
    name = "loancalc",
    version,
    about = "Loan amortization schedules and applicant risk assessment",
    long_about = "A CLI for computing fixed-rate amortization schedules with exact-cent \
                  payoff, affordability and simple interest, scoring applicant risk, and \
                  moving loan applications through their review lifecycle."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Lending configuration file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a full amortization schedule
    Schedule(ScheduleArgs),
    /// Largest principal whose payment fits a debt-to-income ceiling
    MaxLoan(MaxLoanArgs),
    /// Actual/365 simple interest over a number of days
    SimpleInterest(SimpleInterestArgs),
    /// Score an applicant's risk profile
    Assess(AssessArgs),
    /// Apply a lifecycle action to a loan application
    Application(ApplicationArgs),
    /// List reference annual rates per loan type
    Rates,
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
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("loan_core=debug,loancalc=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("loan_core=warn,loancalc=info"))
    };

    // stdout carries the result; logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Version = cli.command {
        println!("loancalc {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let config = match input::file::read_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::amortization::run_schedule(args, &config),
        Commands::MaxLoan(args) => commands::amortization::run_max_loan(args, &config),
        Commands::SimpleInterest(args) => commands::amortization::run_simple_interest(args, &config),
        Commands::Assess(args) => commands::risk::run_assess(args, &config),
        Commands::Application(args) => commands::application::run_application(args, &config),
        Commands::Rates => commands::amortization::run_rates(),
        Commands::Version => return,
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
