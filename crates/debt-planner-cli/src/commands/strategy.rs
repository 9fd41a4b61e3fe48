use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_planner_core::config::EngineConfig;
use debt_planner_core::strategy::{
    self, RepaymentPlanInput, RepaymentStrategy, StrategyComparisonInput,
};

use crate::commands::apply_config;
use crate::input;

/// Arguments for a strategy repayment plan
#[derive(Args)]
pub struct PlanArgs {
    /// Path to JSON input file ({ debts, strategy, monthly_budget, start_date, ... })
    #[arg(long)]
    pub input: Option<String>,

    /// Override the strategy in the input file
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Override the monthly budget in the input file
    #[arg(long)]
    pub budget: Option<Decimal>,

    /// Custom priority order (comma-separated debt ids, highest first)
    #[arg(long, value_delimiter = ',')]
    pub order: Option<Vec<String>>,
}

/// Arguments for comparing every strategy on the same inputs
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file ({ debts, monthly_budget, start_date, ... })
    #[arg(long)]
    pub input: Option<String>,

    /// Override the monthly budget in the input file
    #[arg(long)]
    pub budget: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StrategyArg {
    Avalanche,
    Snowball,
    Hybrid,
    Custom,
}

impl From<StrategyArg> for RepaymentStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Avalanche => RepaymentStrategy::Avalanche,
            StrategyArg::Snowball => RepaymentStrategy::Snowball,
            StrategyArg::Hybrid => RepaymentStrategy::Hybrid,
            StrategyArg::Custom => RepaymentStrategy::Custom,
        }
    }
}

pub fn run_plan(
    args: PlanArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut plan_input: RepaymentPlanInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for a repayment plan")?;

    if let Some(strategy) = args.strategy {
        plan_input.strategy = strategy.into();
    }
    if let Some(budget) = args.budget {
        plan_input.monthly_budget = budget;
    }
    if let Some(order) = args.order {
        plan_input.custom_order = Some(order);
    }
    apply_config(&mut plan_input.config, config);

    tracing::info!(
        strategy = %plan_input.strategy,
        debts = plan_input.debts.len(),
        "planning repayment"
    );
    let result = strategy::plan_repayment(&plan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(
    args: CompareArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut compare_input: StrategyComparisonInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for a strategy comparison")?;

    if let Some(budget) = args.budget {
        compare_input.monthly_budget = budget;
    }
    apply_config(&mut compare_input.config, config);

    let result = strategy::compare_strategies(&compare_input)?;
    Ok(serde_json::to_value(result)?)
}
