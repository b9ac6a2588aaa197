pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tia",
    about = "TIA operator CLI",
    long_about = "Operate the TIA term-insurance advisor: migrations, catalog seeding, config inspection, readiness checks, and offline plan recommendations.",
    after_help = "Examples:\n  tia doctor --json\n  tia seed\n  tia recommend --age 32 --term 11 --coverage 1500000 --income 600000 --factors csr,premium"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic insurer/plan/premium catalog fixtures")]
    Seed,
    #[command(about = "Validate config and DB connectivity, and report transport readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with redacted secrets")]
    Config,
    #[command(about = "Rank eligible plans for a customer profile without any model in the loop")]
    Recommend {
        #[arg(long, help = "Customer age in whole years")]
        age: i64,
        #[arg(long, help = "Desired policy term in years")]
        term: i64,
        #[arg(long, help = "Desired coverage amount in rupees")]
        coverage: i64,
        #[arg(long, help = "Annual income in rupees")]
        income: i64,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Priority factors in order: premium, csr, asr, complaints"
        )]
        factors: Vec<String>,
        #[arg(long, help = "Override the configured number of recommendations")]
        limit: Option<usize>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Recommend { age, term, coverage, income, factors, limit } => {
            commands::recommend::run(age, term, coverage, income, &factors, limit)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
