mod commands;
mod input;
mod logging;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::{ScheduleArgs, SchedulesArgs};
use commands::consolidation::{ConsolidateArgs, RefinanceArgs};
use commands::milestones::MilestonesArgs;
use commands::risk::DtiArgs;
use commands::strategy::{CompareArgs, PlanArgs};
use debt_planner_core::config::EngineConfig;

/// Debt repayment planning with decimal precision
#[derive(Parser)]
#[command(
    name = "debtplan",
    version,
    about = "Debt repayment planning with decimal precision",
    long_about = "A CLI for planning debt repayment with decimal precision. Supports \
                  amortization schedules, avalanche/snowball/hybrid/custom payoff \
                  strategies, consolidation and refinance what-ifs, debt-to-income \
                  risk assessment, and milestone tracking."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine config file (YAML or JSON) replacing the input's `config`
    #[arg(long, global = true)]
    config: Option<String>,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule for one debt at a fixed payment
    Schedule(ScheduleArgs),
    /// Independent schedules for every debt at its minimum plus extra
    Schedules(SchedulesArgs),
    /// Month-by-month repayment plan under one strategy
    Plan(PlanArgs),
    /// Compare avalanche, snowball, hybrid (and custom) on the same budget
    Compare(CompareArgs),
    /// Consolidation what-if: several debts into one loan
    Consolidate(ConsolidateArgs),
    /// Refinance what-if for a single debt
    Refinance(RefinanceArgs),
    /// Debt-to-income ratio and risk tier
    Dti(DtiArgs),
    /// Evaluate milestones against a repayment plan
    Milestones(MilestonesArgs),
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

fn load_config(path: Option<&str>) -> Result<Option<EngineConfig>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let config: EngineConfig = input::file::read_yaml_or_json(path)?;
    config.validate()?;
    tracing::debug!(path, max_months = config.max_months, "engine config loaded");
    Ok(Some(config))
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    let config = config.as_ref();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::amortization::run_schedule(args, config),
        Commands::Schedules(args) => commands::amortization::run_schedules(args, config),
        Commands::Plan(args) => commands::strategy::run_plan(args, config),
        Commands::Compare(args) => commands::strategy::run_compare(args, config),
        Commands::Consolidate(args) => commands::consolidation::run_consolidate(args, config),
        Commands::Refinance(args) => commands::consolidation::run_refinance(args, config),
        Commands::Dti(args) => commands::risk::run_dti(args, config),
        Commands::Milestones(args) => commands::milestones::run_milestones(args, config),
        Commands::Version => {
            println!("debtplan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
