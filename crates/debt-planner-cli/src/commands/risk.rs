use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_planner_core::config::EngineConfig;
use debt_planner_core::risk::{self, DebtToIncomeInput};

use crate::commands::apply_config;
use crate::input;

/// Arguments for the debt-to-income assessment
#[derive(Args)]
pub struct DtiArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross monthly income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Total monthly debt payments
    #[arg(long)]
    pub payments: Option<Decimal>,
}

pub fn run_dti(
    args: DtiArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut dti_input: DebtToIncomeInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => DebtToIncomeInput {
            monthly_income: args
                .income
                .ok_or("--income is required (or provide --input)")?,
            monthly_debt_payments: Some(
                args.payments
                    .ok_or("--payments is required (or provide --input)")?,
            ),
            debts: Vec::new(),
            config: EngineConfig::default(),
        },
    };
    apply_config(&mut dti_input.config, config);

    let result = risk::assess_debt_to_income(&dti_input)?;
    Ok(serde_json::to_value(result)?)
}
