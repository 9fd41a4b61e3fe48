use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_planner_core::config::EngineConfig;
use debt_planner_core::consolidation::{self, ConsolidationInput, RefinanceInput};
use debt_planner_core::Debt;

use crate::commands::{apply_config, start_date_or_today};
use crate::input;

/// Arguments for a consolidation what-if
#[derive(Args)]
pub struct ConsolidateArgs {
    /// Path to JSON input file ({ debts, new_rate, term_months, fees, ... })
    #[arg(long)]
    pub input: Option<String>,

    /// Override the new loan's annual rate
    #[arg(long)]
    pub new_rate: Option<Decimal>,

    /// Override the new loan's term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Override the one-time fees
    #[arg(long)]
    pub fees: Option<Decimal>,

    /// Consolidate only these debts (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    pub include: Option<Vec<String>>,
}

/// Arguments for refinancing a single debt
#[derive(Args)]
pub struct RefinanceArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Current annual rate
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Current monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// New annual rate
    #[arg(long)]
    pub new_rate: Option<Decimal>,

    /// New term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// One-time refinancing fees
    #[arg(long, default_value = "0")]
    pub fees: Decimal,

    /// Date of the first payment (YYYY-MM-DD, default today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_consolidate(
    args: ConsolidateArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut consolidation_input: ConsolidationInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for consolidation analysis")?;

    if let Some(rate) = args.new_rate {
        consolidation_input.new_rate = rate;
    }
    if let Some(term) = args.term {
        consolidation_input.term_months = term;
    }
    if let Some(fees) = args.fees {
        consolidation_input.fees = fees;
    }
    if let Some(include) = args.include {
        consolidation_input.include = Some(include);
    }
    apply_config(&mut consolidation_input.config, config);

    let result = consolidation::analyze_consolidation(&consolidation_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_refinance(
    args: RefinanceArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut refinance_input: RefinanceInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => RefinanceInput {
            debt: Debt {
                id: "loan".into(),
                name: String::new(),
                balance: args
                    .balance
                    .ok_or("--balance is required (or provide --input)")?,
                annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
                minimum_payment: args
                    .payment
                    .ok_or("--payment is required (or provide --input)")?,
                term_months: None,
                extra_payment: None,
            },
            new_rate: args
                .new_rate
                .ok_or("--new-rate is required (or provide --input)")?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
            fees: args.fees,
            start_date: start_date_or_today(args.start_date),
            config: EngineConfig::default(),
        },
    };
    apply_config(&mut refinance_input.config, config);

    let result = consolidation::analyze_refinance(&refinance_input)?;
    Ok(serde_json::to_value(result)?)
}
