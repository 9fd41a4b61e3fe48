pub mod amortization;
pub mod config;
pub mod error;
pub mod strategy;
pub mod time_value;
pub mod types;

#[cfg(feature = "consolidation")]
pub mod consolidation;

#[cfg(feature = "risk")]
pub mod risk;

#[cfg(feature = "milestones")]
pub mod milestones;

pub use error::DebtPlannerError;
pub use types::*;

/// Standard result type for all debt-planner operations
pub type DebtPlannerResult<T> = Result<T, DebtPlannerError>;
