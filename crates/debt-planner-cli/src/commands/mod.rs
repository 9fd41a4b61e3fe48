pub mod amortization;
pub mod consolidation;
pub mod milestones;
pub mod risk;
pub mod strategy;

use chrono::NaiveDate;
use debt_planner_core::config::EngineConfig;

/// Replace an input's engine config with the `--config` file, when given.
pub fn apply_config(target: &mut EngineConfig, override_config: Option<&EngineConfig>) {
    if let Some(cfg) = override_config {
        *target = cfg.clone();
    }
}

/// First payment date for flag-built inputs: `--start-date` or today.
pub fn start_date_or_today(start_date: Option<NaiveDate>) -> NaiveDate {
    start_date.unwrap_or_else(|| chrono::Local::now().date_naive())
}
