use clap::Args;
use serde_json::Value;

use debt_planner_core::config::EngineConfig;
use debt_planner_core::milestones::{self, Milestone, MilestoneTrackingInput};
use debt_planner_core::strategy::{self, RepaymentPlanInput};

use crate::commands::apply_config;
use crate::input;

/// Arguments for milestone tracking
#[derive(Args)]
pub struct MilestonesArgs {
    /// Path to JSON input file ({ milestones, plan }) with a computed plan
    #[arg(long, conflicts_with_all = ["milestones", "plan"])]
    pub input: Option<String>,

    /// Path to a JSON array of milestones
    #[arg(long, requires = "plan")]
    pub milestones: Option<String>,

    /// Path to a repayment plan input; the plan is computed before tracking
    #[arg(long, requires = "milestones")]
    pub plan: Option<String>,
}

pub fn run_milestones(
    args: MilestonesArgs,
    config: Option<&EngineConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let tracking_input: MilestoneTrackingInput = match (args.milestones, args.plan) {
        (Some(milestones_path), Some(plan_path)) => {
            let milestones: Vec<Milestone> = input::file::read_json(&milestones_path)?;
            let mut plan_input: RepaymentPlanInput = input::file::read_json(&plan_path)?;
            apply_config(&mut plan_input.config, config);

            let plan = strategy::plan_repayment(&plan_input)?;
            for warning in &plan.warnings {
                tracing::warn!(%warning, "repayment plan");
            }
            MilestoneTrackingInput {
                milestones,
                plan: plan.result,
            }
        }
        _ => input::read_input(args.input.as_deref())?.ok_or(
            "--input <file.json>, stdin, or --milestones with --plan required for milestone tracking",
        )?,
    };

    let result = milestones::track_milestones(&tracking_input)?;
    Ok(serde_json::to_value(result)?)
}
