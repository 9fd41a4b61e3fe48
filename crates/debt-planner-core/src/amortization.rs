use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::DebtPlannerError;
use crate::time_value::{monthly_rate, payment_date};
use crate::types::*;
use crate::DebtPlannerResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// A single debt amortised at a fixed monthly payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<DebtId>,
    pub balance: Money,
    pub annual_rate: Rate,
    pub monthly_payment: Money,
    /// Date of the first payment.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<DebtId>,
    pub schedule: Vec<PaymentScheduleItem>,
    pub months_to_payoff: u32,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_paid: Money,
    pub payoff_date: Option<NaiveDate>,
}

/// Every debt scheduled independently at its own planned payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtScheduleInput {
    pub debts: Vec<Debt>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFailure {
    pub debt_id: DebtId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtScheduleOutput {
    pub schedules: Vec<AmortizationSchedule>,
    pub failures: Vec<ScheduleFailure>,
    /// Interest across the converging schedules only.
    pub total_interest: Money,
    /// Longest payoff among the converging schedules.
    pub months_to_last_payoff: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate the month-by-month schedule of one debt at a fixed payment.
pub fn simulate_amortization(
    input: &AmortizationInput,
) -> DebtPlannerResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    input.config.validate()?;

    let debt_id = input.debt_id.clone().unwrap_or_else(|| "debt".to_string());
    let schedule = amortize(
        &debt_id,
        input.balance,
        input.annual_rate,
        input.monthly_payment,
        input.start_date,
        &input.config,
    )?;
    let output = summarise(input.debt_id.clone(), schedule);
    let warnings: Vec<String> = [
        input.config.rounding_warning("balance", input.balance),
        input.config.rounding_warning("monthly_payment", input.monthly_payment),
    ]
    .into_iter()
    .flatten()
    .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment amortisation (monthly compounding, half-even rounding)",
        &serde_json::json!({
            "balance": input.balance.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "monthly_payment": input.monthly_payment.to_string(),
            "max_months": input.config.max_months,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Schedule each debt on its own at minimum plus extra payment. Debts that
/// cannot converge are reported as failures; the rest are still returned.
pub fn schedule_debts(
    input: &DebtScheduleInput,
) -> DebtPlannerResult<ComputationOutput<DebtScheduleOutput>> {
    let start = Instant::now();
    input.config.validate()?;
    validate_debt_set(&input.debts)?;

    let mut warnings = Vec::new();
    let mut schedules = Vec::with_capacity(input.debts.len());
    let mut failures = Vec::new();

    for debt in &input.debts {
        match schedule_debt(debt, input.start_date, &input.config) {
            Ok((schedule, mut debt_warnings)) => {
                warnings.append(&mut debt_warnings);
                schedules.push(schedule);
            }
            Err(e @ DebtPlannerError::NonConvergent { .. }) => {
                warnings.push(format!("{}: {e}", debt.id));
                failures.push(ScheduleFailure {
                    debt_id: debt.id.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let total_interest = schedules.iter().map(|s| s.total_interest).sum();
    let months_to_last_payoff = schedules
        .iter()
        .map(|s| s.months_to_payoff)
        .max()
        .unwrap_or(0);

    let output = DebtScheduleOutput {
        schedules,
        failures,
        total_interest,
        months_to_last_payoff,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Independent per-debt amortisation at minimum plus extra payment",
        &serde_json::json!({
            "debts": input.debts.len(),
            "start_date": input.start_date.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Schedule a single debt at `minimum_payment + extra_payment`, recording the
/// extra component on each month. Returns the schedule and any warnings.
pub fn schedule_debt(
    debt: &Debt,
    start_date: NaiveDate,
    config: &EngineConfig,
) -> DebtPlannerResult<(AmortizationSchedule, Vec<String>)> {
    debt.validate()?;

    let mut schedule = amortize(
        &debt.id,
        debt.balance,
        debt.annual_rate,
        debt.planned_payment(),
        start_date,
        config,
    )?;

    if debt.extra_payment.is_some() {
        for item in &mut schedule {
            let extra = (item.payment - debt.minimum_payment).max(Decimal::ZERO);
            item.extra_payment = Some(extra);
        }
    }

    let mut warnings: Vec<String> = [
        config.rounding_warning(&format!("{}.balance", debt.id), debt.balance),
        config.rounding_warning(&format!("{}.payment", debt.id), debt.planned_payment()),
    ]
    .into_iter()
    .flatten()
    .collect();
    if let Some(term) = debt.term_months {
        if schedule.len() as u32 > term {
            warnings.push(format!(
                "{}: payoff takes {} months, longer than the {term}-month loan term",
                debt.id,
                schedule.len()
            ));
        }
    }

    Ok((summarise(Some(debt.id.clone()), schedule), warnings))
}

/// Core amortisation primitive shared by every component.
///
/// Each month `interest = round(balance * rate / 12)` and
/// `principal = min(payment - interest, balance)`; the final payment is
/// clamped so nothing is overpaid. Fails with `NonConvergent` when the payment
/// does not exceed the first month's interest, or when the balance is still
/// outstanding after `config.max_months`.
pub fn amortize(
    debt_id: &str,
    balance: Money,
    annual_rate: Rate,
    monthly_payment: Money,
    start_date: NaiveDate,
    config: &EngineConfig,
) -> DebtPlannerResult<Vec<PaymentScheduleItem>> {
    if balance < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidInput {
            field: format!("{debt_id}.balance"),
            reason: "Balance cannot be negative".into(),
        });
    }
    if annual_rate < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidRate {
            field: format!("{debt_id}.annual_rate"),
            rate: annual_rate,
        });
    }
    if monthly_payment < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidInput {
            field: format!("{debt_id}.monthly_payment"),
            reason: "Payment cannot be negative".into(),
        });
    }
    if config.max_months == 0 {
        return Err(DebtPlannerError::InvalidTerm {
            field: "config.max_months".into(),
            term_months: 0,
        });
    }

    let balance = config.round(balance);
    let monthly_payment = config.round(monthly_payment);
    if balance.is_zero() {
        return Ok(Vec::new());
    }

    let rate = monthly_rate(annual_rate);
    let first_interest = config.round(balance * rate);
    if monthly_payment <= first_interest {
        return Err(DebtPlannerError::NonConvergent {
            debt_ids: vec![debt_id.to_string()],
            max_months: config.max_months,
            reason: format!(
                "payment {monthly_payment} does not exceed first month's interest {first_interest}"
            ),
        });
    }

    let mut schedule = Vec::new();
    let mut remaining = balance;
    let mut month = 0u32;

    while remaining > Decimal::ZERO {
        month += 1;
        if month > config.max_months {
            return Err(DebtPlannerError::NonConvergent {
                debt_ids: vec![debt_id.to_string()],
                max_months: config.max_months,
                reason: format!("balance of {remaining} still outstanding"),
            });
        }

        let interest = config.round(remaining * rate);
        let principal = (monthly_payment - interest).min(remaining);
        remaining -= principal;

        schedule.push(PaymentScheduleItem {
            month,
            date: payment_date(start_date, month)?,
            payment: principal + interest,
            principal,
            interest,
            remaining_balance: remaining,
            extra_payment: None,
        });
    }

    Ok(schedule)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn summarise(debt_id: Option<DebtId>, schedule: Vec<PaymentScheduleItem>) -> AmortizationSchedule {
    let total_interest = schedule.iter().map(|i| i.interest).sum();
    let total_principal = schedule.iter().map(|i| i.principal).sum();
    let total_paid = schedule.iter().map(|i| i.payment).sum();
    let payoff_date = schedule.last().map(|i| i.date);

    AmortizationSchedule {
        debt_id,
        months_to_payoff: schedule.len() as u32,
        schedule,
        total_interest,
        total_principal,
        total_paid,
        payoff_date,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_final_payment_is_clamped() {
        let cfg = EngineConfig::default();
        let schedule = amortize("loan", dec!(250), Decimal::ZERO, dec!(100), start(), &cfg).unwrap();
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[2].payment, dec!(50));
        assert_eq!(schedule[2].remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_balance_gives_empty_schedule() {
        let cfg = EngineConfig::default();
        let schedule = amortize("paid", Decimal::ZERO, dec!(0.2), dec!(10), start(), &cfg).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_payment_equal_to_interest_is_non_convergent() {
        // 1200 * 0.12 / 12 = 12 exactly
        let cfg = EngineConfig::default();
        let err = amortize("card", dec!(1200), dec!(0.12), dec!(12), start(), &cfg).unwrap_err();
        assert!(matches!(err, DebtPlannerError::NonConvergent { ref debt_ids, .. } if debt_ids == &vec!["card".to_string()]));
    }

    #[test]
    fn test_zero_payment_at_zero_rate_is_non_convergent() {
        let cfg = EngineConfig::default();
        let err = amortize("idle", dec!(100), Decimal::ZERO, Decimal::ZERO, start(), &cfg).unwrap_err();
        assert!(matches!(err, DebtPlannerError::NonConvergent { .. }));
    }

    #[test]
    fn test_max_months_cap() {
        let cfg = EngineConfig {
            max_months: 12,
            ..EngineConfig::default()
        };
        let err = amortize("slow", dec!(1000), Decimal::ZERO, dec!(50), start(), &cfg).unwrap_err();
        match err {
            DebtPlannerError::NonConvergent { max_months, .. } => assert_eq!(max_months, 12),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_dates_advance_monthly() {
        let cfg = EngineConfig::default();
        let schedule = amortize("loan", dec!(300), Decimal::ZERO, dec!(100), start(), &cfg).unwrap();
        let dates: Vec<_> = schedule.iter().map(|i| i.date).collect();
        assert_eq!(
            dates,
            vec![
                start(),
                NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            ]
        );
    }

    #[test]
    fn test_schedule_debt_records_extra_component() {
        let debt = Debt {
            id: "auto".into(),
            name: "Car loan".into(),
            balance: dec!(1000),
            annual_rate: Decimal::ZERO,
            minimum_payment: dec!(100),
            term_months: Some(6),
            extra_payment: Some(dec!(150)),
        };
        let (schedule, warnings) = schedule_debt(&debt, start(), &EngineConfig::default()).unwrap();
        assert_eq!(schedule.months_to_payoff, 4);
        assert_eq!(schedule.schedule[0].extra_payment, Some(dec!(150)));
        // Final month pays the remaining 250 => 150 above the minimum
        assert_eq!(schedule.schedule[3].payment, dec!(250));
        assert_eq!(schedule.schedule[3].extra_payment, Some(dec!(150)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_schedule_debt_warns_past_term() {
        let debt = Debt {
            id: "student".into(),
            name: String::new(),
            balance: dec!(1000),
            annual_rate: Decimal::ZERO,
            minimum_payment: dec!(100),
            term_months: Some(6),
            extra_payment: None,
        };
        let (_, warnings) = schedule_debt(&debt, start(), &EngineConfig::default()).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("6-month loan term"));
    }

    #[test]
    fn test_schedule_debt_notes_sub_cent_amounts() {
        let debt = Debt {
            id: "store".into(),
            name: String::new(),
            balance: dec!(300.004),
            annual_rate: Decimal::ZERO,
            minimum_payment: dec!(100),
            term_months: None,
            extra_payment: Some(dec!(0.125)),
        };
        let (schedule, warnings) = schedule_debt(&debt, start(), &EngineConfig::default()).unwrap();
        assert_eq!(schedule.total_principal, dec!(300));
        assert_eq!(
            warnings,
            vec![
                "store.balance 300.004 rounded to 300.00".to_string(),
                "store.payment 100.125 rounded to 100.12".to_string(),
            ]
        );
    }
}
