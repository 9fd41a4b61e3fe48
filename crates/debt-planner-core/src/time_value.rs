use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::DebtPlannerError;
use crate::types::{Money, Rate};
use crate::DebtPlannerResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Periodic rate for monthly compounding of a nominal annual rate.
pub fn monthly_rate(annual_rate: Rate) -> Rate {
    annual_rate / MONTHS_PER_YEAR
}

/// Level payment that fully amortises `principal` over `nper` months (PMT).
///
/// `payment = principal * r / (1 - (1 + r)^-n)`, or `principal / n` when the
/// rate is zero. The result is unrounded. When the compounding factor
/// overflows, the limit `principal * r` is returned.
pub fn annuity_payment(principal: Money, rate: Rate, nper: u32) -> DebtPlannerResult<Money> {
    if nper == 0 {
        return Err(DebtPlannerError::InvalidTerm {
            field: "nper".into(),
            term_months: 0,
        });
    }
    if rate < Decimal::ZERO {
        return Err(DebtPlannerError::InvalidRate {
            field: "rate".into(),
            rate,
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    // Past Decimal's range (1 + r)^-n is zero and PMT reduces to interest only.
    let Some(factor) = (Decimal::ONE + rate).checked_powi(nper as i64) else {
        return Ok(principal * rate);
    };
    if factor.is_zero() {
        return Err(DebtPlannerError::DivisionByZero {
            context: "PMT compounding factor".into(),
        });
    }

    let denominator = Decimal::ONE - Decimal::ONE / factor;
    if denominator.is_zero() {
        return Err(DebtPlannerError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(principal * rate / denominator)
}

/// Fractional number of months needed to repay `principal` with a level
/// `payment` (NPER). `None` when the payment never covers the interest.
pub fn payoff_months_closed_form(principal: Money, rate: Rate, payment: Money) -> Option<Decimal> {
    if payment <= Decimal::ZERO {
        return None;
    }
    if rate.is_zero() {
        return Some(principal / payment);
    }

    let coverage = Decimal::ONE - rate * principal / payment;
    if coverage <= Decimal::ZERO {
        return None;
    }
    Some(-coverage.ln() / (Decimal::ONE + rate).ln())
}

/// Calendar date of the 1-based payment `month`, where month 1 falls on
/// `start`.
pub fn payment_date(start: NaiveDate, month: u32) -> DebtPlannerResult<NaiveDate> {
    let offset = month.saturating_sub(1);
    start
        .checked_add_months(Months::new(offset))
        .ok_or_else(|| DebtPlannerError::DateError(format!("{start} + {offset} months is out of range")))
}
