pub mod allocator;
pub mod comparison;
pub mod ordering;

pub use allocator::{plan_repayment, AggregateProjection, MonthlyProjection, RepaymentPlan, RepaymentPlanInput, RepaymentPlanOutput};
pub use comparison::{compare_strategies, StrategyComparison, StrategyComparisonInput, StrategySummary};
pub use ordering::{priority_order, RepaymentStrategy};
