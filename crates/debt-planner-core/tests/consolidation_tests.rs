use chrono::NaiveDate;
use debt_planner_core::config::EngineConfig;
use debt_planner_core::consolidation::{
    analyze_consolidation, analyze_refinance, ConsolidationInput, RefinanceInput,
};
use debt_planner_core::{Debt, DebtPlannerError};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn debt(id: &str, balance: Decimal, rate: Decimal, minimum: Decimal) -> Debt {
    Debt {
        id: id.into(),
        name: String::new(),
        balance,
        annual_rate: rate,
        minimum_payment: minimum,
        term_months: None,
        extra_payment: None,
    }
}

fn jan_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn cards() -> Vec<Debt> {
    vec![
        debt("card-a", dec!(3000), dec!(0.24), dec!(90)),
        debt("card-b", dec!(2000), dec!(0.19), dec!(60)),
    ]
}

fn consolidation(new_rate: Decimal, term_months: u32, fees: Decimal) -> ConsolidationInput {
    ConsolidationInput {
        debts: cards(),
        include: None,
        new_rate,
        term_months,
        fees,
        payment_overrides: BTreeMap::new(),
        start_date: jan_first(),
        config: EngineConfig::default(),
    }
}

// ===========================================================================
// Consolidation
// ===========================================================================

#[test]
fn test_low_rate_consolidation_is_favorable() {
    let out = analyze_consolidation(&consolidation(dec!(0.09), 36, dec!(150))).unwrap();
    let s = &out.result;

    assert_eq!(s.combined_balance, dec!(5000));
    assert_eq!(s.original_monthly_payment, dec!(150));
    assert_eq!(s.original_total_interest, dec!(2859.05));
    assert_eq!(s.original_months, 56);

    // PMT(5000, 0.75%, 36) = 158.9987 rounded up
    assert_eq!(s.new_monthly_payment, dec!(159.00));
    assert_eq!(s.new_total_interest, dec!(723.96));
    assert_eq!(s.new_months, 36);
    assert_eq!(s.net_savings, dec!(1985.09));
    assert_eq!(s.monthly_payment_change, dec!(9.00));
    assert_eq!(s.break_even_month, None);
    assert!(s.favorable);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_high_rate_long_term_is_unfavorable() {
    let out = analyze_consolidation(&consolidation(dec!(0.22), 60, dec!(300))).unwrap();
    let s = &out.result;

    assert_eq!(s.new_monthly_payment, dec!(138.10));
    assert_eq!(s.new_total_interest, dec!(3285.46));
    assert_eq!(s.net_savings, dec!(-726.41));
    assert_eq!(s.monthly_payment_change, dec!(-11.90));
    // 300 / 11.90 = 25.2 => 26 months
    assert_eq!(s.break_even_month, Some(26));
    assert!(!s.favorable);
    // new interest + fees exceed the original interest
    assert!(s.new_total_interest + s.fees > s.original_total_interest);
    assert!(s.net_savings < Decimal::ZERO);
    assert!(out.warnings.iter().any(|w| w.contains("unfavourable")));
    assert!(out.warnings.iter().any(|w| w.contains("months longer")));
}

#[test]
fn test_include_subset_and_override_warning() {
    let mut input = consolidation(dec!(0.09), 24, Decimal::ZERO);
    input.include = Some(vec!["card-a".into()]);
    input.payment_overrides.insert("card-b".into(), dec!(500));
    let out = analyze_consolidation(&input).unwrap();

    assert_eq!(out.result.included_debt_ids, vec!["card-a".to_string()]);
    assert_eq!(out.result.combined_balance, dec!(3000));
    assert!(out.warnings.iter().any(|w| w.contains("card-b")));
}

#[test]
fn test_payment_override_shortens_original_side() {
    let base = analyze_consolidation(&consolidation(dec!(0.09), 36, dec!(150))).unwrap();
    let mut input = consolidation(dec!(0.09), 36, dec!(150));
    input.payment_overrides.insert("card-a".into(), dec!(300));
    let faster = analyze_consolidation(&input).unwrap();

    assert_eq!(faster.result.original_monthly_payment, dec!(360));
    assert!(faster.result.original_total_interest < base.result.original_total_interest);
    assert_eq!(faster.result.new_total_interest, base.result.new_total_interest);
}

#[test]
fn test_invalid_loan_terms() {
    let err = analyze_consolidation(&consolidation(dec!(0.09), 0, Decimal::ZERO)).unwrap_err();
    assert!(matches!(err, DebtPlannerError::InvalidTerm { .. }));

    let err = analyze_consolidation(&consolidation(dec!(-0.01), 36, Decimal::ZERO)).unwrap_err();
    assert!(matches!(err, DebtPlannerError::InvalidRate { .. }));

    let err = analyze_consolidation(&consolidation(dec!(0.09), 36, dec!(-1))).unwrap_err();
    assert!(matches!(err, DebtPlannerError::InvalidInput { .. }));
}

#[test]
fn test_term_beyond_month_cap_still_amortises() {
    let mut input = consolidation(dec!(0.06), 600, Decimal::ZERO);
    input.config.max_months = 360;
    let s = analyze_consolidation(&input).unwrap().result;

    // PMT(5000, 0.5%, 600) = 26.3202 rounded up
    assert_eq!(s.new_monthly_payment, dec!(26.33));
    assert_eq!(s.new_months, 599);
    assert_eq!(s.original_months, 56);
}

#[test]
fn test_unknown_include_rejected() {
    let mut input = consolidation(dec!(0.09), 36, Decimal::ZERO);
    input.include = Some(vec!["card-z".into()]);
    match analyze_consolidation(&input) {
        Err(DebtPlannerError::InvalidInput { field, .. }) => assert_eq!(field, "include[card-z]"),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

// ===========================================================================
// Refinance
// ===========================================================================

#[test]
fn test_refinance_lower_payment_with_fees() {
    let input = RefinanceInput {
        debt: debt("auto", dec!(8000), dec!(0.07), dec!(400)),
        new_rate: dec!(0.05),
        term_months: 24,
        fees: dec!(500),
        start_date: jan_first(),
        config: EngineConfig::default(),
    };
    let out = analyze_refinance(&input).unwrap();
    let s = &out.result;

    assert_eq!(s.original_total_interest, dec!(531.52));
    assert_eq!(s.original_months, 22);
    assert_eq!(s.new_monthly_payment, dec!(350.98));
    assert_eq!(s.new_total_interest, dec!(423.31));
    assert_eq!(s.net_savings, dec!(-391.79));
    assert_eq!(s.monthly_payment_change, dec!(-49.02));
    // 500 / 49.02 = 10.2 => 11
    assert_eq!(s.break_even_month, Some(11));
    assert!(!s.favorable);
}

#[test]
fn test_refinance_rate_cut_saves_interest() {
    let input = RefinanceInput {
        debt: debt("card", dec!(10000), dec!(0.18), dec!(300)),
        new_rate: dec!(0.08),
        term_months: 36,
        fees: dec!(400),
        start_date: jan_first(),
        config: EngineConfig::default(),
    };
    let out = analyze_refinance(&input).unwrap();
    let s = &out.result;

    assert_eq!(s.original_total_interest, dec!(3967.25));
    assert_eq!(s.original_months, 47);
    assert_eq!(s.new_monthly_payment, dec!(313.37));
    assert_eq!(s.new_total_interest, dec!(1281.05));
    assert_eq!(s.net_savings, dec!(2286.20));
    assert_eq!(s.monthly_payment_change, dec!(13.37));
    assert_eq!(s.break_even_month, None);
    assert!(s.favorable);
    // Payment rises, so the fees are never recovered month to month
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_refinance_at_extreme_rate_and_term() {
    // (1 + 4/12)^360 overflows Decimal, so the payment is the interest-only
    // limit rounded up. The rounded-up cent compounds and retires the loan.
    let input = RefinanceInput {
        debt: debt("payday", dec!(1000), dec!(0.30), dec!(100)),
        new_rate: dec!(4.0),
        term_months: 360,
        fees: Decimal::ZERO,
        start_date: jan_first(),
        config: EngineConfig::default(),
    };
    let s = analyze_refinance(&input).unwrap().result;

    assert_eq!(s.new_monthly_payment, dec!(333.34));
    assert_eq!(s.new_months, 38);
    assert_eq!(s.original_months, 12);
    assert!(!s.favorable);
}

#[test]
fn test_consolidation_at_extreme_rate_and_term() {
    let input = ConsolidationInput {
        debts: vec![debt("payday", dec!(1000), dec!(0.30), dec!(100))],
        include: None,
        new_rate: dec!(4.0),
        term_months: 360,
        fees: Decimal::ZERO,
        payment_overrides: BTreeMap::new(),
        start_date: jan_first(),
        config: EngineConfig::default(),
    };
    let s = analyze_consolidation(&input).unwrap().result;
    assert_eq!(s.new_monthly_payment, dec!(333.34));
    assert!(s.net_savings < Decimal::ZERO);
}
