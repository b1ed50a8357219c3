use gam3arch_sim::{ExperimentReport, ScenarioSummary};
use prometheus::{
    register_gauge_vec_with_registry, register_int_gauge_vec_with_registry, GaugeVec,
    IntGaugeVec, Registry,
};

/// Per-scenario experiment gauges, labelled by `scenario`.
pub struct ExperimentMetrics {
    pub burnout_mean: GaugeVec,
    pub burnout_std_err: GaugeVec,
    pub resonance_mean: GaugeVec,
    pub resonance_std_err: GaugeVec,
    pub repetitions_total: IntGaugeVec,
}

impl ExperimentMetrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let burnout_mean = register_gauge_vec_with_registry!(
            "gam3arch_burnout_mean",
            "Mean burnout incidence across repetitions",
            &["scenario"],
            registry
        )?;

        let burnout_std_err = register_gauge_vec_with_registry!(
            "gam3arch_burnout_std_err",
            "Standard error of burnout incidence",
            &["scenario"],
            registry
        )?;

        let resonance_mean = register_gauge_vec_with_registry!(
            "gam3arch_resonance_mean",
            "Mean final-step resonance across repetitions",
            &["scenario"],
            registry
        )?;

        let resonance_std_err = register_gauge_vec_with_registry!(
            "gam3arch_resonance_std_err",
            "Standard error of final-step resonance",
            &["scenario"],
            registry
        )?;

        let repetitions_total = register_int_gauge_vec_with_registry!(
            "gam3arch_repetitions_total",
            "Repetitions aggregated into the scenario summary",
            &["scenario"],
            registry
        )?;

        Ok(Self {
            burnout_mean,
            burnout_std_err,
            resonance_mean,
            resonance_std_err,
            repetitions_total,
        })
    }

    pub fn observe_summary(&self, summary: &ScenarioSummary) {
        let labels = [summary.scenario.as_str()];
        self.burnout_mean
            .with_label_values(&labels)
            .set(summary.burnout_mean);
        self.resonance_mean
            .with_label_values(&labels)
            .set(summary.resonance_mean);
        self.repetitions_total
            .with_label_values(&labels)
            .set(summary.repetitions as i64);
        set_or_clear(&self.burnout_std_err, &labels, summary.burnout_std_err);
        set_or_clear(&self.resonance_std_err, &labels, summary.resonance_std_err);
    }

    pub fn observe(&self, report: &ExperimentReport) {
        for summary in &report.summaries {
            self.observe_summary(summary);
        }
    }
}

// An unavailable standard error is exported as an absent series, not as 0.
fn set_or_clear(gauge: &GaugeVec, labels: &[&str], value: Option<f64>) {
    match value {
        Some(v) => gauge.with_label_values(labels).set(v),
        None => {
            let _ = gauge.remove_label_values(labels);
        }
    }
}
