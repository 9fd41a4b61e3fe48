use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::DebtPlannerError;
use crate::strategy::ordering::{priority_order, RepaymentStrategy};
use crate::time_value::{monthly_rate, payment_date};
use crate::types::*;
use crate::DebtPlannerResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentPlanInput {
    pub debts: Vec<Debt>,
    pub strategy: RepaymentStrategy,
    /// Explicit priority for the custom strategy, highest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_order: Option<Vec<DebtId>>,
    /// Total amount available for debt payments each month.
    pub monthly_budget: Money,
    /// Date of the first monthly payment.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub config: EngineConfig,
}

/// One debt's trajectory under a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentPlan {
    pub debt_id: DebtId,
    pub name: String,
    /// 1 is paid down first.
    pub priority: u32,
    pub schedule: Vec<PaymentScheduleItem>,
    pub months_to_payoff: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_date: Option<NaiveDate>,
    /// Surplus directed at this debt beyond its minimum payments.
    pub total_extra_paid: Money,
}

/// Portfolio totals for one simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    pub month: u32,
    pub date: NaiveDate,
    pub total_payment: Money,
    pub total_principal: Money,
    pub total_interest: Money,
    /// Sum of balances after this month's payments.
    pub remaining_balance: Money,
    /// Budget left over once every active debt is paid off; only the final
    /// month can carry it.
    pub unallocated: Money,
    /// Debts with a balance at the start of the month.
    pub active_debts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateProjection {
    pub strategy: RepaymentStrategy,
    pub monthly_budget: Money,
    pub total_months: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub total_unallocated: Money,
    pub debt_free_date: Option<NaiveDate>,
    /// Interest under the proportional-split baseline; absent if the
    /// baseline does not converge.
    pub baseline_total_interest: Option<Money>,
    pub baseline_months: Option<u32>,
    pub interest_saved: Option<Money>,
    pub months_saved: Option<i64>,
    pub monthly: Vec<MonthlyProjection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentPlanOutput {
    pub start_date: NaiveDate,
    /// Plans in priority order.
    pub plans: Vec<RepaymentPlan>,
    pub projection: AggregateProjection,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Allocate a monthly budget across a set of debts under `input.strategy`.
///
/// Every active debt receives its minimum payment each month. The remaining
/// budget goes entirely to the highest-priority active debt, and a retired
/// debt's minimum joins that surplus from the following month. When the
/// top debt retires mid-month, what it cannot absorb passes down the
/// priority list, so the whole budget is spent while any debt is active. The result is
/// compared against a baseline that instead splits the surplus across all
/// active debts in proportion to their balances.
pub fn plan_repayment(
    input: &RepaymentPlanInput,
) -> DebtPlannerResult<ComputationOutput<RepaymentPlanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;
    validate_debt_set(&input.debts)?;
    if input.monthly_budget < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidInput {
            field: "monthly_budget".into(),
            reason: "Monthly budget cannot be negative".into(),
        });
    }
    if input.strategy != RepaymentStrategy::Custom && input.custom_order.is_some() {
        warnings.push(format!(
            "custom_order ignored for the {} strategy",
            input.strategy
        ));
    }

    warnings.extend(
        input
            .debts
            .iter()
            .filter_map(|d| input.config.rounding_warning(&format!("{}.balance", d.id), d.balance)),
    );

    let order = priority_order(
        &input.debts,
        input.strategy,
        input.custom_order.as_deref(),
        &input.config.hybrid_weights,
    )?;
    check_budget(&input.debts, input.monthly_budget, &input.config)?;

    let output = build_plan(input, &order, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Month-by-month cascade allocation vs proportional baseline",
        &serde_json::json!({
            "strategy": input.strategy.to_string(),
            "monthly_budget": input.monthly_budget.to_string(),
            "debts": input.debts.len(),
            "max_months": input.config.max_months,
            "hybrid_weights": input.config.hybrid_weights,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Fail with `InsufficientBudget` when the minimums of the debts that still
/// carry a balance exceed the budget. Returns the required minimum.
///
/// Balances are rounded to the minor unit first, as the simulation does, so a
/// debt that rounds to zero is not counted.
pub fn check_budget(
    debts: &[Debt],
    monthly_budget: Money,
    config: &EngineConfig,
) -> DebtPlannerResult<Money> {
    let required: Money = debts
        .iter()
        .filter(|d| config.round(d.balance) > Decimal::ZERO)
        .map(|d| d.minimum_payment)
        .sum();

    if required > monthly_budget {
        return Err(DebtPlannerError::InsufficientBudget {
            budget: monthly_budget,
            required,
            shortfall: required - monthly_budget,
        });
    }
    Ok(required)
}

// ---------------------------------------------------------------------------
// Simulation core
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurplusDistribution {
    /// Whole surplus to the highest-priority active debt.
    Cascade,
    /// Surplus split by balance across every active debt.
    Proportional,
}

#[derive(Debug, Clone)]
struct DebtState {
    balance: Money,
    schedule: Vec<PaymentScheduleItem>,
    total_interest: Money,
    total_paid: Money,
    total_extra: Money,
    payoff_month: Option<u32>,
}

impl DebtState {
    fn new(balance: Money) -> Self {
        Self {
            balance,
            schedule: Vec::new(),
            total_interest: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_extra: Decimal::ZERO,
            payoff_month: None,
        }
    }
}

struct SimulationRun {
    states: Vec<DebtState>,
    monthly: Vec<MonthlyProjection>,
}

impl SimulationRun {
    fn total_interest(&self) -> Money {
        self.states.iter().map(|s| s.total_interest).sum()
    }

    fn total_months(&self) -> u32 {
        self.monthly.len() as u32
    }
}

fn build_plan(
    input: &RepaymentPlanInput,
    order: &[usize],
    warnings: &mut Vec<String>,
) -> DebtPlannerResult<RepaymentPlanOutput> {
    let run = simulate(
        &input.debts,
        order,
        input.monthly_budget,
        input.start_date,
        &input.config,
        SurplusDistribution::Cascade,
    )?;

    let baseline = match simulate(
        &input.debts,
        order,
        input.monthly_budget,
        input.start_date,
        &input.config,
        SurplusDistribution::Proportional,
    ) {
        Ok(baseline) => Some(baseline),
        Err(e @ DebtPlannerError::NonConvergent { .. }) => {
            tracing::warn!(error = %e, "proportional baseline did not converge");
            warnings.push(format!("Baseline comparison unavailable: {e}"));
            None
        }
        Err(e) => return Err(e),
    };

    let total_months = run.total_months();
    let total_interest = run.total_interest();
    let total_paid: Money = run.states.iter().map(|s| s.total_paid).sum();
    let total_unallocated: Money = run.monthly.iter().map(|m| m.unallocated).sum();
    let debt_free_date = run.monthly.last().map(|m| m.date);

    let baseline_total_interest = baseline.as_ref().map(SimulationRun::total_interest);
    let baseline_months = baseline.as_ref().map(SimulationRun::total_months);

    tracing::debug!(
        strategy = %input.strategy,
        months = total_months,
        interest = %total_interest,
        "repayment plan simulated"
    );

    let SimulationRun { states, monthly } = run;
    let mut states: Vec<Option<DebtState>> = states.into_iter().map(Some).collect();
    let mut plans = Vec::with_capacity(order.len());
    for (rank, &idx) in order.iter().enumerate() {
        let Some(state) = states[idx].take() else {
            continue;
        };
        let debt = &input.debts[idx];
        plans.push(RepaymentPlan {
            debt_id: debt.id.clone(),
            name: debt.name.clone(),
            priority: rank as u32 + 1,
            months_to_payoff: state.payoff_month.unwrap_or(0),
            payoff_date: state.schedule.last().map(|i| i.date),
            total_interest: state.total_interest,
            total_paid: state.total_paid,
            total_extra_paid: state.total_extra,
            schedule: state.schedule,
        });
    }

    Ok(RepaymentPlanOutput {
        start_date: input.start_date,
        plans,
        projection: AggregateProjection {
            strategy: input.strategy,
            monthly_budget: input.monthly_budget,
            total_months,
            total_interest,
            total_paid,
            total_unallocated,
            debt_free_date,
            baseline_total_interest,
            baseline_months,
            interest_saved: baseline_total_interest.map(|b| b - total_interest),
            months_saved: baseline_months.map(|b| b as i64 - total_months as i64),
            monthly,
        },
    })
}

/// Discrete month loop over a flat, priority-ordered array of debt states.
fn simulate(
    debts: &[Debt],
    order: &[usize],
    budget: Money,
    start_date: NaiveDate,
    config: &EngineConfig,
    distribution: SurplusDistribution,
) -> DebtPlannerResult<SimulationRun> {
    let n = debts.len();
    let rates: Vec<Rate> = debts.iter().map(|d| monthly_rate(d.annual_rate)).collect();
    let mut states: Vec<DebtState> = debts
        .iter()
        .map(|d| DebtState::new(config.round(d.balance)))
        .collect();
    let mut monthly = Vec::new();

    let mut interest = vec![Decimal::ZERO; n];
    let mut owed = vec![Decimal::ZERO; n];
    let mut base = vec![Decimal::ZERO; n];
    let mut extra = vec![Decimal::ZERO; n];

    let mut month = 0u32;
    loop {
        let active: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| states[i].balance > Decimal::ZERO)
            .collect();
        if active.is_empty() {
            break;
        }

        month += 1;
        if month > config.max_months {
            return Err(non_convergent(
                debts,
                &active,
                config,
                format!("{} debt(s) still active at the month cap", active.len()),
            ));
        }
        let date = payment_date(start_date, month)?;

        for &i in &active {
            let accrued = states[i]
                .balance
                .checked_mul(rates[i])
                .map(|v| config.round(v));
            let payoff = accrued.and_then(|v| states[i].balance.checked_add(v));
            let (Some(accrued), Some(payoff)) = (accrued, payoff) else {
                return Err(non_convergent(
                    debts,
                    &active,
                    config,
                    "balance grew beyond the representable range".into(),
                ));
            };
            interest[i] = accrued;
            owed[i] = payoff;
            base[i] = debts[i].minimum_payment.min(payoff);
            extra[i] = Decimal::ZERO;
        }

        // A debt retiring below its minimum frees the difference this month.
        let surplus = budget - active.iter().map(|&i| base[i]).sum::<Money>();

        let leftover = match distribution {
            SurplusDistribution::Cascade => surplus,
            SurplusDistribution::Proportional => {
                let total_balance: Money = active.iter().map(|&i| states[i].balance).sum();
                let mut remaining = surplus;
                for (k, &i) in active.iter().enumerate() {
                    let share = if k + 1 == active.len() {
                        remaining
                    } else {
                        let weighted = surplus.checked_mul(states[i].balance).ok_or_else(|| {
                            non_convergent(
                                debts,
                                &active,
                                config,
                                "balance grew beyond the representable range".into(),
                            )
                        })?;
                        config.round(weighted / total_balance).min(remaining)
                    };
                    extra[i] = share.min(owed[i] - base[i]);
                    remaining -= share;
                }
                surplus - active.iter().map(|&i| extra[i]).sum::<Money>()
            }
        };
        spill_in_priority_order(&active, leftover, &owed, &base, &mut extra);

        let mut total_payment = Decimal::ZERO;
        let mut total_principal = Decimal::ZERO;
        let mut total_interest = Decimal::ZERO;
        for &i in &active {
            let payment = base[i] + extra[i];
            let principal = payment - interest[i];
            let state = &mut states[i];
            state.balance -= principal;
            state.total_interest += interest[i];
            state.total_paid += payment;
            state.total_extra += extra[i];
            state.schedule.push(PaymentScheduleItem {
                month,
                date,
                payment,
                principal,
                interest: interest[i],
                remaining_balance: state.balance,
                extra_payment: (extra[i] > Decimal::ZERO).then_some(extra[i]),
            });
            if state.balance.is_zero() {
                state.payoff_month = Some(month);
                tracing::debug!(debt = %debts[i].id, month, "debt retired");
            }

            total_payment += payment;
            total_principal += principal;
            total_interest += interest[i];
        }

        monthly.push(MonthlyProjection {
            month,
            date,
            total_payment,
            total_principal,
            total_interest,
            remaining_balance: states.iter().map(|s| s.balance).sum(),
            unallocated: budget - total_payment,
            active_debts: active.len() as u32,
        });
    }

    Ok(SimulationRun { states, monthly })
}

/// Hand `amount` to the active debts in priority order, each up to what it
/// still owes this month. Whatever is left stays unallocated.
fn spill_in_priority_order(
    active: &[usize],
    mut amount: Money,
    owed: &[Money],
    base: &[Money],
    extra: &mut [Money],
) {
    for &i in active {
        if amount <= Decimal::ZERO {
            break;
        }
        let take = amount.min(owed[i] - base[i] - extra[i]);
        extra[i] += take;
        amount -= take;
    }
}

fn non_convergent(
    debts: &[Debt],
    active: &[usize],
    config: &EngineConfig,
    reason: String,
) -> DebtPlannerError {
    DebtPlannerError::NonConvergent {
        debt_ids: active.iter().map(|&i| debts[i].id.clone()).collect(),
        max_months: config.max_months,
        reason,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
