use debt_planner_core::config::{EngineConfig, RiskThresholds};
use debt_planner_core::risk::{assess_debt_to_income, DebtToIncomeInput, RiskTier, Suggestion};
use debt_planner_core::{Debt, DebtPlannerError};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn with_payments(income: Decimal, payments: Decimal) -> DebtToIncomeInput {
    DebtToIncomeInput {
        monthly_income: income,
        monthly_debt_payments: Some(payments),
        debts: Vec::new(),
        config: EngineConfig::default(),
    }
}

fn debt(id: &str, balance: Decimal, minimum: Decimal) -> Debt {
    Debt {
        id: id.into(),
        name: String::new(),
        balance,
        annual_rate: dec!(0.2),
        minimum_payment: minimum,
        term_months: None,
        extra_payment: None,
    }
}

#[test]
fn test_moderate_under_target_has_no_suggestions() {
    let out = assess_debt_to_income(&with_payments(dec!(5000), dec!(1500))).unwrap();
    let a = &out.result;
    assert_eq!(a.ratio, dec!(0.3));
    assert_eq!(a.tier, RiskTier::Moderate);
    assert_eq!(a.gap_to_target, dec!(-0.06));
    assert_eq!(a.payment_reduction_needed, Decimal::ZERO);
    assert!(a.suggestions.is_empty());
}

#[test]
fn test_high_tier_suggestions() {
    let out = assess_debt_to_income(&with_payments(dec!(5000), dec!(2000))).unwrap();
    let a = &out.result;
    assert_eq!(a.ratio, dec!(0.4));
    assert_eq!(a.tier, RiskTier::High);
    // Target payments 0.36 * 5000 = 1800
    assert_eq!(a.payment_reduction_needed, dec!(200));
    // 2000 / 0.36 = 5555.555... rounded up
    assert_eq!(a.income_needed_for_target, dec!(5555.56));
    assert_eq!(
        a.suggestions,
        vec![
            Suggestion::ReduceMonthlyPayments { amount: dec!(200) },
            Suggestion::IncreaseIncome { target_income: dec!(5555.56) },
            Suggestion::PrioritizeHighInterestDebt,
            Suggestion::ConsiderConsolidation,
        ]
    );
}

#[test]
fn test_severe_tier() {
    let out = assess_debt_to_income(&with_payments(dec!(5000), dec!(3000))).unwrap();
    let a = &out.result;
    assert_eq!(a.tier, RiskTier::Severe);
    assert_eq!(a.payment_reduction_needed, dec!(1200));
    assert_eq!(a.suggestions.len(), 6);
    assert_eq!(a.suggestions.last(), Some(&Suggestion::AvoidNewDebt));
}

#[test]
fn test_ratio_exactly_at_target() {
    let out = assess_debt_to_income(&with_payments(dec!(5000), dec!(1800))).unwrap();
    let a = &out.result;
    assert_eq!(a.tier, RiskTier::High);
    assert_eq!(a.gap_to_target, Decimal::ZERO);
    assert_eq!(a.suggestions, vec![Suggestion::ConsiderConsolidation]);
}

#[test]
fn test_payments_summed_from_open_debts() {
    let input = DebtToIncomeInput {
        monthly_income: dec!(4000),
        monthly_debt_payments: None,
        debts: vec![
            debt("card", dec!(2500), dec!(200)),
            debt("auto", dec!(9000), dec!(150)),
            debt("closed", Decimal::ZERO, dec!(500)),
        ],
        config: EngineConfig::default(),
    };
    let out = assess_debt_to_income(&input).unwrap();
    assert_eq!(out.result.monthly_debt_payments, dec!(350));
    assert_eq!(out.result.ratio, dec!(0.0875));
    assert_eq!(out.result.tier, RiskTier::Low);
}

#[test]
fn test_zero_income_rejected() {
    match assess_debt_to_income(&with_payments(Decimal::ZERO, dec!(100))) {
        Err(DebtPlannerError::DivideByZeroIncome { income }) => assert_eq!(income, Decimal::ZERO),
        other => panic!("expected DivideByZeroIncome, got {other:?}"),
    }
}

#[test]
fn test_custom_thresholds() {
    let mut input = with_payments(dec!(5000), dec!(1500));
    input.config.risk_thresholds = RiskThresholds {
        low: dec!(0.10),
        moderate: dec!(0.20),
        high: dec!(0.28),
        target: dec!(0.25),
    };
    let out = assess_debt_to_income(&input).unwrap();
    assert_eq!(out.result.tier, RiskTier::Severe);
    assert_eq!(out.result.payment_reduction_needed, dec!(250));
}

#[test]
fn test_invalid_thresholds_rejected() {
    let mut input = with_payments(dec!(5000), dec!(1500));
    input.config.risk_thresholds.moderate = dec!(0.10);
    assert!(matches!(
        assess_debt_to_income(&input),
        Err(DebtPlannerError::InvalidInput { .. })
    ));
}
