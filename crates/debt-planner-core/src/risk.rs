use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{EngineConfig, RiskThresholds};
use crate::error::DebtPlannerError;
use crate::types::*;
use crate::DebtPlannerResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtToIncomeInput {
    /// Gross monthly income.
    pub monthly_income: Money,
    /// Total monthly debt obligations. Summed from `debts` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_debt_payments: Option<Money>,
    #[serde(default)]
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Severe,
}

/// Improvement actions, emitted in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// Cut monthly obligations by `amount` to reach the target ratio.
    ReduceMonthlyPayments { amount: Money },
    /// Income at which current obligations meet the target ratio.
    IncreaseIncome { target_income: Money },
    PrioritizeHighInterestDebt,
    ConsiderConsolidation,
    SeekCreditCounseling,
    AvoidNewDebt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtToIncomeAssessment {
    pub monthly_income: Money,
    pub monthly_debt_payments: Money,
    pub ratio: Rate,
    pub tier: RiskTier,
    pub target_ratio: Rate,
    /// `ratio - target_ratio`; positive means above target.
    pub gap_to_target: Rate,
    pub payment_reduction_needed: Money,
    pub income_needed_for_target: Money,
    pub suggestions: Vec<Suggestion>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Debt-to-income ratio, risk tier and the gap to the configured target.
pub fn assess_debt_to_income(
    input: &DebtToIncomeInput,
) -> DebtPlannerResult<ComputationOutput<DebtToIncomeAssessment>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;
    if input.monthly_income <= Decimal::ZERO {
        return Err(DebtPlannerError::DivideByZeroIncome {
            income: input.monthly_income,
        });
    }

    let payments = match input.monthly_debt_payments {
        Some(p) => {
            if !input.debts.is_empty() {
                warnings.push("monthly_debt_payments given; debts list not summed".into());
            }
            p
        }
        None => {
            for debt in &input.debts {
                debt.validate()?;
            }
            total_minimum_payments(&input.debts)
        }
    };
    if payments < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidInput {
            field: "monthly_debt_payments".into(),
            reason: "Debt payments cannot be negative".into(),
        });
    }
    if input.monthly_debt_payments.is_none() && input.debts.is_empty() {
        warnings.push("No debts or payments supplied; ratio is zero".into());
    }

    let thresholds = &input.config.risk_thresholds;
    let ratio = payments / input.monthly_income;
    let tier = classify(ratio, thresholds);
    let target_payments = input.config.round(thresholds.target * input.monthly_income);
    let payment_reduction_needed = (payments - target_payments).max(Decimal::ZERO);
    let income_needed_for_target = input.config.round_up(payments / thresholds.target);

    let assessment = DebtToIncomeAssessment {
        monthly_income: input.monthly_income,
        monthly_debt_payments: payments,
        ratio,
        tier,
        target_ratio: thresholds.target,
        gap_to_target: ratio - thresholds.target,
        payment_reduction_needed,
        income_needed_for_target,
        suggestions: suggestions(
            ratio,
            tier,
            thresholds,
            payment_reduction_needed,
            income_needed_for_target,
        ),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt-to-income ratio with tiered risk classification",
        &serde_json::json!({
            "thresholds": thresholds,
        }),
        warnings,
        elapsed,
        assessment,
    ))
}

/// Sum of minimum payments on debts that still carry a balance.
pub fn total_minimum_payments(debts: &[Debt]) -> Money {
    debts
        .iter()
        .filter(|d| d.balance > Decimal::ZERO)
        .map(|d| d.minimum_payment)
        .sum()
}

pub fn classify(ratio: Rate, thresholds: &RiskThresholds) -> RiskTier {
    if ratio < thresholds.low {
        RiskTier::Low
    } else if ratio < thresholds.moderate {
        RiskTier::Moderate
    } else if ratio < thresholds.high {
        RiskTier::High
    } else {
        RiskTier::Severe
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn suggestions(
    ratio: Rate,
    tier: RiskTier,
    thresholds: &RiskThresholds,
    payment_reduction_needed: Money,
    income_needed_for_target: Money,
) -> Vec<Suggestion> {
    let mut out = Vec::new();
    let over_target = ratio > thresholds.target;

    if over_target {
        out.push(Suggestion::ReduceMonthlyPayments {
            amount: payment_reduction_needed,
        });
        out.push(Suggestion::IncreaseIncome {
            target_income: income_needed_for_target,
        });
        if tier >= RiskTier::Moderate {
            out.push(Suggestion::PrioritizeHighInterestDebt);
        }
    }
    if tier >= RiskTier::High {
        out.push(Suggestion::ConsiderConsolidation);
    }
    if tier == RiskTier::Severe {
        out.push(Suggestion::SeekCreditCounseling);
        out.push(Suggestion::AvoidNewDebt);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
