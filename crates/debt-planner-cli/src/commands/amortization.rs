use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_planner_core::amortization::{self, AmortizationInput, DebtScheduleInput};
use debt_planner_core::config::EngineConfig;

use crate::commands::{apply_config, start_date_or_today};
use crate::input;

/// Arguments for a single-debt amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Debt identifier shown in the output
    #[arg(long)]
    pub id: Option<String>,

    /// Current balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Annual interest rate as a decimal (0.18 = 18%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Fixed monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Date of the first payment (YYYY-MM-DD, default today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

/// Arguments for scheduling every debt independently
#[derive(Args)]
pub struct SchedulesArgs {
    /// Path to JSON input file ({ debts, start_date, config })
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut schedule_input: AmortizationInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => AmortizationInput {
            debt_id: args.id,
            balance: args
                .balance
                .ok_or("--balance is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            monthly_payment: args
                .payment
                .ok_or("--payment is required (or provide --input)")?,
            start_date: start_date_or_today(args.start_date),
            config: EngineConfig::default(),
        },
    };
    apply_config(&mut schedule_input.config, config);

    let result = amortization::simulate_amortization(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedules(
    args: SchedulesArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut batch: DebtScheduleInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for batch schedules")?;
    apply_config(&mut batch.config, config);

    let result = amortization::schedule_debts(&batch)?;
    Ok(serde_json::to_value(result)?)
}
