use crate::ExperimentMetrics;
use gam3arch_sim::ScenarioSummary;

/// True when `after` burns out a larger share of agents than `before`.
pub fn burnout_regressed(before: &ScenarioSummary, after: &ScenarioSummary) -> bool {
    after.burnout_mean > before.burnout_mean
}

pub fn reject_if_burnout_increases(
    metrics: &ExperimentMetrics,
    before: &ScenarioSummary,
    after: &ScenarioSummary,
) -> bool {
    metrics.observe_summary(after);
    burnout_regressed(before, after)
}
