use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DebtPlannerError;
use crate::strategy::RepaymentPlanOutput;
use crate::types::*;
use crate::DebtPlannerResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MilestoneTarget {
    /// Balance at or below `amount`, whenever that happens.
    Balance { amount: Money },
    /// Fully paid off on or before `date`.
    PayoffBy { date: NaiveDate },
    /// Balance at or below `amount` on or before `date`.
    BalanceBy { amount: Money, date: NaiveDate },
}

impl MilestoneTarget {
    fn amount(&self) -> Money {
        match self {
            MilestoneTarget::Balance { amount } | MilestoneTarget::BalanceBy { amount, .. } => *amount,
            MilestoneTarget::PayoffBy { .. } => Decimal::ZERO,
        }
    }

    fn deadline(&self) -> Option<NaiveDate> {
        match self {
            MilestoneTarget::Balance { .. } => None,
            MilestoneTarget::PayoffBy { date } | MilestoneTarget::BalanceBy { date, .. } => Some(*date),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    /// Month 0 means the opening balance already met the target.
    Achieved { month: u32, date: NaiveDate },
}

impl MilestoneStatus {
    pub fn is_achieved(&self) -> bool {
        matches!(self, MilestoneStatus::Achieved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    /// Tracked debt; the whole portfolio when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<DebtId>,
    #[serde(default)]
    pub name: String,
    pub target: MilestoneTarget,
    /// Status recorded by an earlier run.
    #[serde(default)]
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneTrackingInput {
    pub milestones: Vec<Milestone>,
    pub plan: RepaymentPlanOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MilestoneWarning {
    /// The new plan no longer satisfies a milestone recorded as achieved.
    InconsistentHistory { previously_achieved_on: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneUpdate {
    pub milestone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<DebtId>,
    pub previous: MilestoneStatus,
    pub status: MilestoneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<MilestoneWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneTrackingOutput {
    pub updates: Vec<MilestoneUpdate>,
    /// Input milestones carrying their new status, ready to persist.
    pub milestones: Vec<Milestone>,
    pub achieved_count: u32,
    pub pending_count: u32,
    pub inconsistent_count: u32,
}

/// A dated balance observation: month 0 is the opening balance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CurvePoint {
    month: u32,
    date: NaiveDate,
    balance: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate milestones against the dated balance curves of a repayment plan.
pub fn track_milestones(
    input: &MilestoneTrackingInput,
) -> DebtPlannerResult<ComputationOutput<MilestoneTrackingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_milestones(&input.milestones)?;

    let mut updates = Vec::with_capacity(input.milestones.len());
    let mut milestones = Vec::with_capacity(input.milestones.len());
    for milestone in &input.milestones {
        let curve = balance_curve(&input.plan, milestone)?;
        let reached = first_satisfying(&curve, &milestone.target)
            .map(|p| MilestoneStatus::Achieved {
                month: p.month,
                date: p.date,
            })
            .unwrap_or_default();

        let (status, warning) = match (milestone.status, reached) {
            (MilestoneStatus::Achieved { date, .. }, MilestoneStatus::Pending) => {
                tracing::warn!(
                    milestone = %milestone.id,
                    %date,
                    "achieved milestone not satisfied by the current plan"
                );
                warnings.push(format!(
                    "{}: recorded as achieved on {date} but not satisfied by the current plan",
                    milestone.id
                ));
                (
                    milestone.status,
                    Some(MilestoneWarning::InconsistentHistory {
                        previously_achieved_on: date,
                    }),
                )
            }
            (_, reached) => (reached, None),
        };

        updates.push(MilestoneUpdate {
            milestone_id: milestone.id.clone(),
            debt_id: milestone.debt_id.clone(),
            previous: milestone.status,
            status,
            warning,
        });
        milestones.push(Milestone {
            status,
            ..milestone.clone()
        });
    }

    let achieved_count = updates.iter().filter(|u| u.status.is_achieved()).count() as u32;
    let inconsistent_count = updates.iter().filter(|u| u.warning.is_some()).count() as u32;
    let output = MilestoneTrackingOutput {
        pending_count: updates.len() as u32 - achieved_count,
        achieved_count,
        inconsistent_count,
        updates,
        milestones,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Milestone evaluation against dated balance curves",
        &serde_json::json!({
            "strategy": input.plan.projection.strategy.to_string(),
            "plan_start": input.plan.start_date.to_string(),
            "milestones": input.milestones.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_milestones(milestones: &[Milestone]) -> DebtPlannerResult<()> {
    for (i, m) in milestones.iter().enumerate() {
        if m.id.trim().is_empty() {
            return Err(DebtPlannerError::InvalidInput {
                field: "milestones[].id".into(),
                reason: "Milestone identifier must not be empty".into(),
            });
        }
        if milestones[..i].iter().any(|other| other.id == m.id) {
            return Err(DebtPlannerError::InvalidInput {
                field: format!("milestones[{}].id", m.id),
                reason: "Duplicate milestone identifier".into(),
            });
        }
        if m.target.amount() < Decimal::ZERO {
            return Err(DebtPlannerError::InvalidInput {
                field: format!("milestones[{}].target.amount", m.id),
                reason: "Target balance cannot be negative".into(),
            });
        }
    }
    Ok(())
}

fn balance_curve(plan: &RepaymentPlanOutput, milestone: &Milestone) -> DebtPlannerResult<Vec<CurvePoint>> {
    let opening = |balance| CurvePoint {
        month: 0,
        date: plan.start_date,
        balance,
    };

    let Some(debt_id) = &milestone.debt_id else {
        let monthly = &plan.projection.monthly;
        let Some(first) = monthly.first() else {
            return Ok(vec![opening(Decimal::ZERO)]);
        };
        let mut curve = vec![opening(first.remaining_balance + first.total_principal)];
        curve.extend(monthly.iter().map(|m| CurvePoint {
            month: m.month,
            date: m.date,
            balance: m.remaining_balance,
        }));
        return Ok(curve);
    };

    let debt_plan = plan
        .plans
        .iter()
        .find(|p| &p.debt_id == debt_id)
        .ok_or_else(|| DebtPlannerError::InvalidInput {
            field: format!("milestones[{}].debt_id", milestone.id),
            reason: format!("Unknown debt identifier '{debt_id}'"),
        })?;

    let Some(first) = debt_plan.schedule.first() else {
        return Ok(vec![opening(Decimal::ZERO)]);
    };
    let mut curve = vec![opening(first.remaining_balance + first.principal)];
    curve.extend(debt_plan.schedule.iter().map(|item| CurvePoint {
        month: item.month,
        date: item.date,
        balance: item.remaining_balance,
    }));
    Ok(curve)
}

fn first_satisfying(curve: &[CurvePoint], target: &MilestoneTarget) -> Option<CurvePoint> {
    let amount = target.amount();
    let deadline = target.deadline();
    curve
        .iter()
        .take_while(|p| deadline.map_or(true, |d| p.date <= d))
        .find(|p| p.balance <= amount)
        .copied()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn curve() -> Vec<CurvePoint> {
        vec![
            CurvePoint { month: 0, date: date(2025, 1, 1), balance: dec!(300) },
            CurvePoint { month: 1, date: date(2025, 1, 1), balance: dec!(200) },
            CurvePoint { month: 2, date: date(2025, 2, 1), balance: dec!(100) },
            CurvePoint { month: 3, date: date(2025, 3, 1), balance: dec!(0) },
        ]
    }

    #[test]
    fn test_balance_target_hits_first_point_at_or_below() {
        let hit = first_satisfying(&curve(), &MilestoneTarget::Balance { amount: dec!(150) }).unwrap();
        assert_eq!(hit.month, 2);
    }

    #[test]
    fn test_payoff_by_respects_deadline() {
        let late = MilestoneTarget::PayoffBy { date: date(2025, 2, 28) };
        assert!(first_satisfying(&curve(), &late).is_none());
        let ok = MilestoneTarget::PayoffBy { date: date(2025, 3, 1) };
        assert_eq!(first_satisfying(&curve(), &ok).unwrap().month, 3);
    }

    #[test]
    fn test_opening_balance_can_satisfy() {
        let target = MilestoneTarget::BalanceBy { amount: dec!(300), date: date(2024, 12, 31) };
        assert!(first_satisfying(&curve(), &target).is_none());
        let target = MilestoneTarget::Balance { amount: dec!(300) };
        assert_eq!(first_satisfying(&curve(), &target).unwrap().month, 0);
    }

    #[test]
    fn test_status_serde_shape() {
        let status = MilestoneStatus::Achieved { month: 4, date: date(2025, 4, 1) };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"state":"achieved","month":4,"date":"2025-04-01"}"#);
        let pending: MilestoneStatus = serde_json::from_str(r#"{"state":"pending"}"#).unwrap();
        assert_eq!(pending, MilestoneStatus::Pending);
    }
}
