use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DebtPlannerError;
use crate::DebtPlannerResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.199 = 19.9%). Never as percentages.
pub type Rate = Decimal;

/// Caller-assigned debt identifier, unique within one request.
pub type DebtId = String;

/// A liability being tracked. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: DebtId,
    #[serde(default)]
    pub name: String,
    /// Current principal balance.
    pub balance: Money,
    pub annual_rate: Rate,
    pub minimum_payment: Money,
    /// Fixed loan term, when the debt is an instalment loan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    /// Extra amount the owner is willing to pay on top of the minimum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<Money>,
}

impl Debt {
    /// Minimum plus any voluntary extra payment.
    pub fn planned_payment(&self) -> Money {
        self.minimum_payment + self.extra_payment.unwrap_or(Decimal::ZERO)
    }

    pub fn validate(&self) -> DebtPlannerResult<()> {
        if self.id.trim().is_empty() {
            return Err(DebtPlannerError::InvalidInput {
                field: "debts[].id".into(),
                reason: "Debt identifier must not be empty".into(),
            });
        }
        if self.balance < Decimal::ZERO {
            return Err(DebtPlannerError::InvalidInput {
                field: format!("debts[{}].balance", self.id),
                reason: "Balance cannot be negative".into(),
            });
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(DebtPlannerError::InvalidRate {
                field: format!("debts[{}].annual_rate", self.id),
                rate: self.annual_rate,
            });
        }
        if self.minimum_payment < Decimal::ZERO {
            return Err(DebtPlannerError::InvalidInput {
                field: format!("debts[{}].minimum_payment", self.id),
                reason: "Minimum payment cannot be negative".into(),
            });
        }
        if let Some(extra) = self.extra_payment {
            if extra < Decimal::ZERO {
                return Err(DebtPlannerError::InvalidInput {
                    field: format!("debts[{}].extra_payment", self.id),
                    reason: "Extra payment cannot be negative".into(),
                });
            }
        }
        if self.term_months == Some(0) {
            return Err(DebtPlannerError::InvalidTerm {
                field: format!("debts[{}].term_months", self.id),
                term_months: 0,
            });
        }
        Ok(())
    }
}

/// Validate every debt and reject duplicate identifiers.
pub fn validate_debt_set(debts: &[Debt]) -> DebtPlannerResult<()> {
    if debts.is_empty() {
        return Err(DebtPlannerError::InvalidInput {
            field: "debts".into(),
            reason: "At least one debt is required".into(),
        });
    }
    for (i, debt) in debts.iter().enumerate() {
        debt.validate()?;
        if debts[..i].iter().any(|d| d.id == debt.id) {
            return Err(DebtPlannerError::InvalidInput {
                field: format!("debts[{}].id", debt.id),
                reason: "Duplicate debt identifier".into(),
            });
        }
    }
    Ok(())
}

/// One simulated month for one debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentScheduleItem {
    /// 1-based month index.
    pub month: u32,
    pub date: NaiveDate,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<Money>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit_half_even".to_string(),
        },
    }
}
