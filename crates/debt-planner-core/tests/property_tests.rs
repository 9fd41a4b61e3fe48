use chrono::NaiveDate;
use debt_planner_core::amortization::amortize;
use debt_planner_core::config::EngineConfig;
use debt_planner_core::strategy::{plan_repayment, RepaymentPlanInput, RepaymentStrategy};
use debt_planner_core::Debt;
use proptest::prelude::{prop_assert, prop_assert_eq, proptest, Strategy};
use proptest::sample::select;
use proptest::test_runner::TestCaseError;
use rust_decimal::Decimal;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn cents(v: u32) -> Decimal {
    Decimal::new(v as i64, 2)
}

fn bp(v: u32) -> Decimal {
    Decimal::new(v as i64, 4)
}

/// Balance 100-20,000, rate 0-35%, minimum 2-5% of the balance.
fn arb_debt(id: usize) -> impl Strategy<Value = Debt> {
    (10_000u32..2_000_000, 0u32..3_500, 200u32..500).prop_map(move |(balance, rate, min_bp)| {
        let balance = cents(balance);
        Debt {
            id: format!("d{id}"),
            name: String::new(),
            balance,
            annual_rate: bp(rate),
            minimum_payment: (balance * bp(min_bp)).round_dp(2),
            term_months: None,
            extra_payment: None,
        }
    })
}

fn arb_debts() -> impl Strategy<Value = Vec<Debt>> {
    (1usize..5).prop_flat_map(|n| (0..n).map(arb_debt).collect::<Vec<_>>())
}

fn arb_strategy() -> impl Strategy<Value = RepaymentStrategy> {
    select(RepaymentStrategy::BUILT_IN.to_vec())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(48))]

    #[test]
    fn prop_converging_schedule_repays_exact_principal(
        balance in 10_000u32..5_000_000,
        rate in 0u32..3_000,
        payment_bp in 150u32..2_000,
    ) {
        let balance = cents(balance);
        let payment = (balance * bp(payment_bp)).round_dp(2);
        let cfg = EngineConfig::default();
        let schedule = match amortize("p", balance, bp(rate), payment, start(), &cfg) {
            Ok(schedule) => schedule,
            Err(_) => return Err(TestCaseError::reject("payment does not converge")),
        };

        let principal: Decimal = schedule.iter().map(|i| i.principal).sum();
        prop_assert_eq!(principal, balance);

        let mut previous = balance;
        for item in &schedule {
            prop_assert_eq!(item.principal + item.interest, item.payment);
            prop_assert!(item.remaining_balance <= previous);
            prop_assert!(item.payment <= payment);
            previous = item.remaining_balance;
        }
        prop_assert_eq!(previous, Decimal::ZERO);
    }

    #[test]
    fn prop_allocator_spends_whole_budget_and_honours_minimums(
        debts in arb_debts(),
        strategy in arb_strategy(),
        headroom in 0u32..200_000,
    ) {
        let required: Decimal = debts.iter().map(|d| d.minimum_payment).sum();
        let budget = required + cents(headroom);
        let input = RepaymentPlanInput {
            debts: debts.clone(),
            strategy,
            custom_order: None,
            monthly_budget: budget,
            start_date: start(),
            config: EngineConfig::default(),
        };
        let out = match plan_repayment(&input) {
            Ok(out) => out,
            Err(_) => return Err(TestCaseError::reject("plan does not converge")),
        };
        let plan = &out.result;

        for month in &plan.projection.monthly {
            prop_assert_eq!(month.total_payment + month.unallocated, budget);
            prop_assert!(month.unallocated >= Decimal::ZERO);
            if month.remaining_balance > Decimal::ZERO {
                prop_assert_eq!(month.unallocated, Decimal::ZERO);
            }
        }

        for p in &plan.plans {
            let debt = debts.iter().find(|d| d.id == p.debt_id).unwrap();
            let mut balance = debt.balance;
            for item in &p.schedule {
                let owed = balance + item.interest;
                prop_assert!(item.payment >= debt.minimum_payment.min(owed));
                prop_assert_eq!(item.principal + item.interest, item.payment);
                balance = item.remaining_balance;
            }
            prop_assert_eq!(balance, Decimal::ZERO);
        }
    }

    #[test]
    fn prop_plans_are_deterministic(
        debts in arb_debts(),
        strategy in arb_strategy(),
    ) {
        let required: Decimal = debts.iter().map(|d| d.minimum_payment).sum();
        let input = RepaymentPlanInput {
            debts,
            strategy,
            custom_order: None,
            monthly_budget: required + cents(50_000),
            start_date: start(),
            config: EngineConfig::default(),
        };
        let first = plan_repayment(&input).map(|o| serde_json::to_string(&o.result).unwrap());
        let second = plan_repayment(&input).map(|o| serde_json::to_string(&o.result).unwrap());
        prop_assert_eq!(first, second);
    }
}
