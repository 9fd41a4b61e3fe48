use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::strategy::allocator::{check_budget, plan_repayment, RepaymentPlanInput};
use crate::strategy::ordering::RepaymentStrategy;
use crate::types::*;
use crate::DebtPlannerResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparisonInput {
    pub debts: Vec<Debt>,
    pub monthly_budget: Money,
    pub start_date: NaiveDate,
    /// When present, the custom strategy is compared as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_order: Option<Vec<DebtId>>,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: RepaymentStrategy,
    pub total_interest: Money,
    pub total_paid: Money,
    pub total_months: u32,
    pub debt_free_date: Option<NaiveDate>,
    /// Month in which the first debt is retired.
    pub first_payoff_month: Option<u32>,
    /// Debt ids from first to last priority.
    pub payoff_order: Vec<DebtId>,
    pub interest_saved_vs_baseline: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    /// In evaluation order: avalanche, snowball, hybrid, then custom.
    pub results: Vec<StrategySummary>,
    /// Lowest interest, then fewest months, then evaluation order.
    pub recommended: RepaymentStrategy,
    /// Earliest first payoff, the psychological quick win.
    pub quickest_first_payoff: RepaymentStrategy,
    /// Interest difference between the worst and the recommended strategy.
    pub interest_spread: Money,
}

/// Run the allocator once per strategy on identical inputs and rank them.
pub fn compare_strategies(
    input: &StrategyComparisonInput,
) -> DebtPlannerResult<ComputationOutput<StrategyComparison>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    input.config.validate()?;
    validate_debt_set(&input.debts)?;
    check_budget(&input.debts, input.monthly_budget, &input.config)?;

    let mut strategies = RepaymentStrategy::BUILT_IN.to_vec();
    if input.custom_order.is_some() {
        strategies.push(RepaymentStrategy::Custom);
    }

    let mut results = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let plan_input = RepaymentPlanInput {
            debts: input.debts.clone(),
            strategy,
            custom_order: (strategy == RepaymentStrategy::Custom)
                .then(|| input.custom_order.clone())
                .flatten(),
            monthly_budget: input.monthly_budget,
            start_date: input.start_date,
            config: input.config.clone(),
        };
        let output = plan_repayment(&plan_input)?;
        warnings.extend(
            output
                .warnings
                .into_iter()
                .map(|w| format!("{strategy}: {w}")),
        );

        let plan = output.result;
        let first_payoff_month = plan
            .plans
            .iter()
            .filter(|p| !p.schedule.is_empty())
            .map(|p| p.months_to_payoff)
            .min();
        results.push(StrategySummary {
            strategy,
            total_interest: plan.projection.total_interest,
            total_paid: plan.projection.total_paid,
            total_months: plan.projection.total_months,
            debt_free_date: plan.projection.debt_free_date,
            first_payoff_month,
            payoff_order: plan.plans.iter().map(|p| p.debt_id.clone()).collect(),
            interest_saved_vs_baseline: plan.projection.interest_saved,
        });
    }

    // min_by_key keeps the first of equal elements, preserving evaluation order
    let recommended = results
        .iter()
        .min_by_key(|r| (r.total_interest, r.total_months))
        .map(|r| r.strategy)
        .unwrap_or(RepaymentStrategy::Avalanche);
    let quickest_first_payoff = results
        .iter()
        .min_by_key(|r| r.first_payoff_month.unwrap_or(u32::MAX))
        .map(|r| r.strategy)
        .unwrap_or(RepaymentStrategy::Snowball);
    let best = results.iter().map(|r| r.total_interest).min().unwrap_or_default();
    let worst = results.iter().map(|r| r.total_interest).max().unwrap_or_default();

    tracing::debug!(%recommended, strategies = results.len(), "strategies compared");

    let output = StrategyComparison {
        results,
        recommended,
        quickest_first_payoff,
        interest_spread: worst - best,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Strategy comparison (identical budget and debts per strategy)",
        &serde_json::json!({
            "monthly_budget": input.monthly_budget.to_string(),
            "debts": input.debts.len(),
            "includes_custom": input.custom_order.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn debt(id: &str, balance: Decimal, rate: Decimal, minimum: Decimal) -> Debt {
        Debt {
            id: id.into(),
            name: String::new(),
            balance,
            annual_rate: rate,
            minimum_payment: minimum,
            term_months: None,
            extra_payment: None,
        }
    }

    fn comparison_input(custom_order: Option<Vec<DebtId>>) -> StrategyComparisonInput {
        StrategyComparisonInput {
            debts: vec![
                debt("small", dec!(500), dec!(0.10), dec!(25)),
                debt("big", dec!(3000), dec!(0.22), dec!(75)),
                debt("mid", dec!(1500), dec!(0.15), dec!(40)),
            ],
            monthly_budget: dec!(400),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            custom_order,
            config: EngineConfig::default(),
        }
    }

    #[test]
    fn test_avalanche_recommended_and_snowball_quickest() {
        let out = compare_strategies(&comparison_input(None)).unwrap();
        let cmp = &out.result;
        assert_eq!(cmp.results.len(), 3);
        assert_eq!(cmp.recommended, RepaymentStrategy::Avalanche);
        assert_eq!(cmp.quickest_first_payoff, RepaymentStrategy::Snowball);
        assert_eq!(cmp.results[1].payoff_order, vec!["small", "mid", "big"]);
        assert!(cmp.interest_spread > Decimal::ZERO);
    }

    #[test]
    fn test_custom_included_when_order_given() {
        let order = vec!["mid".to_string(), "big".to_string(), "small".to_string()];
        let out = compare_strategies(&comparison_input(Some(order.clone()))).unwrap();
        let custom = out.result.results.last().unwrap();
        assert_eq!(custom.strategy, RepaymentStrategy::Custom);
        assert_eq!(custom.payoff_order, order);
    }
}
