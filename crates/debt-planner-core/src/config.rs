use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DebtPlannerError;
use crate::types::{Money, Rate};
use crate::DebtPlannerResult;

/// Hard cap on simulated months (100 years).
pub const DEFAULT_MAX_MONTHS: u32 = 1200;

/// Minor currency unit precision (cents).
pub const DEFAULT_CURRENCY_DECIMALS: u32 = 2;

/// Weights of the hybrid strategy score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    /// Weight on the rate normalised against the highest rate.
    pub rate: Decimal,
    /// Weight on the smallest balance normalised against this balance.
    pub balance: Decimal,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            rate: dec!(0.5),
            balance: dec!(0.5),
        }
    }
}

/// Debt-to-income tier boundaries. A ratio below `low` is low risk, below
/// `moderate` moderate, below `high` high, anything else severe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub low: Rate,
    pub moderate: Rate,
    pub high: Rate,
    /// Ratio the household is steering towards.
    pub target: Rate,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: dec!(0.20),
            moderate: dec!(0.36),
            high: dec!(0.50),
            target: dec!(0.36),
        }
    }
}

/// Engine-wide knobs shared by every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_months: u32,
    pub currency_decimals: u32,
    pub hybrid_weights: HybridWeights,
    pub risk_thresholds: RiskThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_months: DEFAULT_MAX_MONTHS,
            currency_decimals: DEFAULT_CURRENCY_DECIMALS,
            hybrid_weights: HybridWeights::default(),
            risk_thresholds: RiskThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Round to the minor unit, half-to-even. Applied at every monthly step.
    pub fn round(&self, amount: Money) -> Money {
        amount.round_dp_with_strategy(self.currency_decimals, RoundingStrategy::MidpointNearestEven)
    }

    /// Round up to the next minor unit.
    pub fn round_up(&self, amount: Money) -> Money {
        amount.round_dp_with_strategy(self.currency_decimals, RoundingStrategy::AwayFromZero)
    }

    /// Smallest representable amount, one cent by default.
    pub fn minor_unit(&self) -> Money {
        Decimal::new(1, self.currency_decimals)
    }

    /// Warning text when `amount` carries digits below the minor unit and is
    /// rounded before simulation.
    pub fn rounding_warning(&self, field: &str, amount: Money) -> Option<String> {
        let rounded = self.round(amount);
        (rounded != amount).then(|| format!("{field} {amount} rounded to {rounded}"))
    }

    pub fn validate(&self) -> DebtPlannerResult<()> {
        if self.max_months == 0 {
            return Err(DebtPlannerError::InvalidTerm {
                field: "config.max_months".into(),
                term_months: 0,
            });
        }
        if self.currency_decimals > 8 {
            return Err(DebtPlannerError::InvalidInput {
                field: "config.currency_decimals".into(),
                reason: "At most 8 decimal places are supported".into(),
            });
        }

        let w = &self.hybrid_weights;
        if w.rate < Decimal::ZERO || w.balance < Decimal::ZERO {
            return Err(DebtPlannerError::InvalidInput {
                field: "config.hybrid_weights".into(),
                reason: "Hybrid weights cannot be negative".into(),
            });
        }
        if (w.rate + w.balance).is_zero() {
            return Err(DebtPlannerError::InvalidInput {
                field: "config.hybrid_weights".into(),
                reason: "At least one hybrid weight must be positive".into(),
            });
        }

        let t = &self.risk_thresholds;
        if !(Decimal::ZERO < t.low && t.low < t.moderate && t.moderate < t.high) {
            return Err(DebtPlannerError::InvalidInput {
                field: "config.risk_thresholds".into(),
                reason: "Thresholds must be positive and strictly increasing (low < moderate < high)"
                    .into(),
            });
        }
        if t.target <= Decimal::ZERO {
            return Err(DebtPlannerError::InvalidInput {
                field: "config.risk_thresholds.target".into(),
                reason: "Target ratio must be positive".into(),
            });
        }
        Ok(())
    }
}
