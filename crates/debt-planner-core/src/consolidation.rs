use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::amortization::amortize;
use crate::config::EngineConfig;
use crate::error::DebtPlannerError;
use crate::time_value::{annuity_payment, monthly_rate};
use crate::types::*;
use crate::DebtPlannerResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationInput {
    pub debts: Vec<Debt>,
    /// Debts rolled into the new loan; all debts when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<DebtId>>,
    pub new_rate: Rate,
    pub term_months: u32,
    /// One-time origination / transfer fees.
    #[serde(default)]
    pub fees: Money,
    /// Accelerated payments replacing a debt's minimum on the original side.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payment_overrides: BTreeMap<DebtId, Money>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub config: EngineConfig,
}

/// A single debt refinanced into a new rate and term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub debt: Debt,
    pub new_rate: Rate,
    pub term_months: u32,
    #[serde(default)]
    pub fees: Money,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationScenario {
    pub included_debt_ids: Vec<DebtId>,
    pub combined_balance: Money,
    /// Sum of the payments the included debts are simulated at.
    pub original_monthly_payment: Money,
    pub original_total_interest: Money,
    /// Longest payoff among the included debts.
    pub original_months: u32,
    pub new_rate: Rate,
    pub term_months: u32,
    pub fees: Money,
    pub new_monthly_payment: Money,
    pub new_total_interest: Money,
    pub new_months: u32,
    /// `original_total_interest - new_total_interest - fees`.
    pub net_savings: Money,
    /// New payment minus original payment (negative = lower payment).
    pub monthly_payment_change: Money,
    /// Months of payment reduction needed to recover the fees.
    pub break_even_month: Option<u32>,
    pub favorable: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate replacing a subset of debts with one amortising loan.
pub fn analyze_consolidation(
    input: &ConsolidationInput,
) -> DebtPlannerResult<ComputationOutput<ConsolidationScenario>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;
    validate_debt_set(&input.debts)?;
    validate_loan_terms(input.new_rate, input.term_months, input.fees)?;

    let included = select_debts(&input.debts, input.include.as_deref())?;
    for id in input.payment_overrides.keys() {
        if !included.iter().any(|d| &d.id == id) {
            warnings.push(format!("payment override for '{id}' ignored: debt not included"));
        }
    }

    let scenario = evaluate(
        &included,
        &input.payment_overrides,
        input.new_rate,
        input.term_months,
        input.fees,
        input.start_date,
        &input.config,
    )?;
    if !scenario.favorable {
        warnings.push(format!(
            "Consolidation is unfavourable: net savings {}",
            scenario.net_savings
        ));
    }
    if scenario.new_months > scenario.original_months {
        warnings.push(format!(
            "New loan runs {} months longer than the current payoff",
            scenario.new_months - scenario.original_months
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt consolidation (per-debt amortisation vs single annuity loan)",
        &serde_json::json!({
            "new_rate": input.new_rate.to_string(),
            "term_months": input.term_months,
            "fees": input.fees.to_string(),
            "payment_rounding": "new payment rounded up to the minor unit",
        }),
        warnings,
        elapsed,
        scenario,
    ))
}

/// Evaluate moving one debt to a new rate and term.
pub fn analyze_refinance(
    input: &RefinanceInput,
) -> DebtPlannerResult<ComputationOutput<ConsolidationScenario>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;
    input.debt.validate()?;
    validate_loan_terms(input.new_rate, input.term_months, input.fees)?;

    let included = select_debts(std::slice::from_ref(&input.debt), None)?;
    let scenario = evaluate(
        &included,
        &BTreeMap::new(),
        input.new_rate,
        input.term_months,
        input.fees,
        input.start_date,
        &input.config,
    )?;
    match scenario.break_even_month {
        Some(month) if month > scenario.new_months => warnings.push(format!(
            "Fees are not recovered within the new term (break-even month {month})"
        )),
        None if scenario.fees > Decimal::ZERO => {
            warnings.push("New payment is not lower; fees are never recovered monthly".into())
        }
        _ => {}
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinance (current terms vs new annuity loan)",
        &serde_json::json!({
            "debt_id": input.debt.id,
            "current_rate": input.debt.annual_rate.to_string(),
            "new_rate": input.new_rate.to_string(),
            "term_months": input.term_months,
        }),
        warnings,
        elapsed,
        scenario,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn evaluate(
    included: &[&Debt],
    overrides: &BTreeMap<DebtId, Money>,
    new_rate: Rate,
    term_months: u32,
    fees: Money,
    start_date: NaiveDate,
    config: &EngineConfig,
) -> DebtPlannerResult<ConsolidationScenario> {
    let mut combined_balance = Decimal::ZERO;
    let mut original_payment = Decimal::ZERO;
    let mut original_interest = Decimal::ZERO;
    let mut original_months = 0u32;

    for debt in included {
        let payment = overrides
            .get(&debt.id)
            .copied()
            .unwrap_or(debt.minimum_payment);
        let schedule = amortize(
            &debt.id,
            debt.balance,
            debt.annual_rate,
            payment,
            start_date,
            config,
        )?;
        combined_balance += config.round(debt.balance);
        if !schedule.is_empty() {
            original_payment += payment;
        }
        original_interest += schedule.iter().map(|i| i.interest).sum::<Money>();
        original_months = original_months.max(schedule.len() as u32);
    }

    if combined_balance.is_zero() {
        return Err(DebtPlannerError::InvalidInput {
            field: "include".into(),
            reason: "Included debts carry no balance to consolidate".into(),
        });
    }

    let rate = monthly_rate(new_rate);
    // The level payment must clear the first month's rounded interest.
    let interest_only = config.round(combined_balance * rate);
    let new_payment = config
        .round_up(annuity_payment(combined_balance, rate, term_months)?)
        .max(interest_only + config.minor_unit());
    // The annuity retires the loan within its own term, however long.
    let loan_config = EngineConfig {
        max_months: config.max_months.max(term_months),
        ..config.clone()
    };
    let new_schedule = amortize(
        "consolidated",
        combined_balance,
        new_rate,
        new_payment,
        start_date,
        &loan_config,
    )?;
    let new_interest: Money = new_schedule.iter().map(|i| i.interest).sum();

    let net_savings = original_interest - new_interest - fees;
    let monthly_payment_change = new_payment - original_payment;
    let break_even_month = if monthly_payment_change < Decimal::ZERO {
        (fees / -monthly_payment_change).ceil().to_u32()
    } else {
        None
    };

    Ok(ConsolidationScenario {
        included_debt_ids: included.iter().map(|d| d.id.clone()).collect(),
        combined_balance,
        original_monthly_payment: original_payment,
        original_total_interest: original_interest,
        original_months,
        new_rate,
        term_months,
        fees,
        new_monthly_payment: new_payment,
        new_total_interest: new_interest,
        new_months: new_schedule.len() as u32,
        net_savings,
        monthly_payment_change,
        break_even_month,
        favorable: net_savings > Decimal::ZERO,
    })
}

fn validate_loan_terms(new_rate: Rate, term_months: u32, fees: Money) -> DebtPlannerResult<()> {
    if term_months == 0 {
        return Err(DebtPlannerError::InvalidTerm {
            field: "term_months".into(),
            term_months,
        });
    }
    if new_rate < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidRate {
            field: "new_rate".into(),
            rate: new_rate,
        });
    }
    if fees < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidInput {
            field: "fees".into(),
            reason: "Fees cannot be negative".into(),
        });
    }
    Ok(())
}

fn select_debts<'a>(debts: &'a [Debt], include: Option<&[DebtId]>) -> DebtPlannerResult<Vec<&'a Debt>> {
    let Some(ids) = include else {
        return Ok(debts.iter().collect());
    };
    if ids.is_empty() {
        return Err(DebtPlannerError::InvalidInput {
            field: "include".into(),
            reason: "At least one debt must be included".into(),
        });
    }

    let mut selected: Vec<&Debt> = Vec::with_capacity(ids.len());
    for id in ids {
        let debt = debts
            .iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| DebtPlannerError::InvalidInput {
                field: format!("include[{id}]"),
                reason: "Unknown debt identifier".into(),
            })?;
        if selected.iter().any(|d| d.id == debt.id) {
            return Err(DebtPlannerError::InvalidInput {
                field: format!("include[{id}]"),
                reason: "Debt included more than once".into(),
            });
        }
        selected.push(debt);
    }
    Ok(selected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
