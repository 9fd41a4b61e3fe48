use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::config::HybridWeights;
use crate::error::DebtPlannerError;
use crate::types::{Debt, DebtId};
use crate::DebtPlannerResult;

/// How the monthly surplus is prioritised across debts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentStrategy {
    /// Highest rate first.
    Avalanche,
    /// Smallest balance first.
    Snowball,
    /// Weighted blend of rate and (inverse) balance.
    Hybrid,
    /// Caller-supplied order.
    Custom,
}

impl RepaymentStrategy {
    pub const BUILT_IN: [RepaymentStrategy; 3] = [
        RepaymentStrategy::Avalanche,
        RepaymentStrategy::Snowball,
        RepaymentStrategy::Hybrid,
    ];
}

impl fmt::Display for RepaymentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepaymentStrategy::Avalanche => "avalanche",
            RepaymentStrategy::Snowball => "snowball",
            RepaymentStrategy::Hybrid => "hybrid",
            RepaymentStrategy::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Indices into `debts`, highest priority first. The order is fixed for the
/// whole simulation; input position is the final tie-break.
pub fn priority_order(
    debts: &[Debt],
    strategy: RepaymentStrategy,
    custom_order: Option<&[DebtId]>,
    weights: &HybridWeights,
) -> DebtPlannerResult<Vec<usize>> {
    let mut order: Vec<usize> = (0..debts.len()).collect();

    match strategy {
        RepaymentStrategy::Avalanche => order.sort_by(|&a, &b| {
            by_rate_desc(&debts[a], &debts[b])
                .then_with(|| debts[b].balance.cmp(&debts[a].balance))
        }),
        RepaymentStrategy::Snowball => order.sort_by(|&a, &b| {
            debts[a]
                .balance
                .cmp(&debts[b].balance)
                .then_with(|| by_rate_desc(&debts[a], &debts[b]))
        }),
        RepaymentStrategy::Hybrid => {
            let scores = hybrid_scores(debts, weights);
            order.sort_by(|&a, &b| {
                scores[b]
                    .cmp(&scores[a])
                    .then_with(|| by_rate_desc(&debts[a], &debts[b]))
                    .then_with(|| debts[a].balance.cmp(&debts[b].balance))
            });
        }
        RepaymentStrategy::Custom => {
            let ids = custom_order.ok_or_else(|| DebtPlannerError::InvalidOrder {
                reason: "custom strategy requires custom_order".into(),
            })?;
            order = resolve_custom_order(debts, ids)?;
        }
    }

    Ok(order)
}

/// Hybrid score per debt: `w_rate * rate / max_rate + w_balance * min_balance / balance`.
///
/// Retired (zero-balance) debts score the full balance weight, as if they
/// were the smallest balance.
pub fn hybrid_scores(debts: &[Debt], weights: &HybridWeights) -> Vec<Decimal> {
    let max_rate = debts
        .iter()
        .map(|d| d.annual_rate)
        .max()
        .unwrap_or(Decimal::ZERO);
    let min_balance = debts
        .iter()
        .map(|d| d.balance)
        .filter(|b| *b > Decimal::ZERO)
        .min()
        .unwrap_or(Decimal::ZERO);

    debts
        .iter()
        .map(|d| {
            let normalized_rate = if max_rate.is_zero() {
                Decimal::ZERO
            } else {
                d.annual_rate / max_rate
            };
            let normalized_inverse_balance = if d.balance.is_zero() {
                Decimal::ONE
            } else {
                min_balance / d.balance
            };
            weights.rate * normalized_rate + weights.balance * normalized_inverse_balance
        })
        .collect()
}

fn by_rate_desc(a: &Debt, b: &Debt) -> Ordering {
    b.annual_rate.cmp(&a.annual_rate)
}

fn resolve_custom_order(debts: &[Debt], ids: &[DebtId]) -> DebtPlannerResult<Vec<usize>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut order = Vec::with_capacity(ids.len());

    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(DebtPlannerError::InvalidOrder {
                reason: format!("debt '{id}' appears more than once"),
            });
        }
        let idx = debts
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| DebtPlannerError::InvalidOrder {
                reason: format!("unknown debt '{id}'"),
            })?;
        order.push(idx);
    }

    let missing: Vec<&str> = debts
        .iter()
        .filter(|d| !seen.contains(d.id.as_str()))
        .map(|d| d.id.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(DebtPlannerError::InvalidOrder {
            reason: format!("missing debt(s) {}", missing.join(", ")),
        });
    }

    Ok(order)
}
