use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::DebtId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DebtPlannerError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Non-convergent: {} cannot be repaid within {max_months} months ({reason})", debt_ids.join(", "))]
    NonConvergent {
        debt_ids: Vec<DebtId>,
        max_months: u32,
        reason: String,
    },

    #[error("Insufficient budget: minimum payments of {required} exceed budget of {budget} (shortfall {shortfall})")]
    InsufficientBudget {
        budget: Decimal,
        required: Decimal,
        shortfall: Decimal,
    },

    #[error("Invalid custom order: {reason}")]
    InvalidOrder { reason: String },

    #[error("Invalid term: {field} must be at least 1 month (got {term_months})")]
    InvalidTerm { field: String, term_months: u32 },

    #[error("Invalid rate: {field} must not be negative (got {rate})")]
    InvalidRate { field: String, rate: Decimal },

    #[error("Debt-to-income ratio undefined for non-positive income {income}")]
    DivideByZeroIncome { income: Decimal },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DebtPlannerError {
    fn from(e: serde_json::Error) -> Self {
        DebtPlannerError::SerializationError(e.to_string())
    }
}
