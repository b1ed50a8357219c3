use crate::runner::{RunOptions, RunResult, SingleRunSimulator, StepSnapshot};
use crate::stats::MeanStdErr;
use crate::streams::{derive_sub_seeds, stream};
use gam3arch_core::{
    Result, ScenarioSet, ScenarioSpec, SimulationConfig, TransitionMatrix, TransitionModel,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Aggregate over the repetitions of one scenario. Standard errors are
/// `None` when there is a single repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub repetitions: usize,
    pub burnout_mean: f64,
    pub burnout_std_err: Option<f64>,
    pub resonance_mean: f64,
    pub resonance_std_err: Option<f64>,
}

impl ScenarioSummary {
    pub fn from_metrics(scenario: impl Into<String>, burnout: &[f64], resonance: &[f64]) -> Self {
        let b = MeanStdErr::of(burnout);
        let r = MeanStdErr::of(resonance);
        Self {
            scenario: scenario.into(),
            repetitions: burnout.len(),
            burnout_mean: b.mean,
            burnout_std_err: b.std_err,
            resonance_mean: r.mean,
            resonance_std_err: r.std_err,
        }
    }
}

/// Raw metrics of a single repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionRecord {
    pub scenario: String,
    pub run: usize,
    pub seed: u64,
    pub burnout: f64,
    pub resonance: f64,
    pub mean_resonance_over_run: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<StepSnapshot>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub summaries: Vec<ScenarioSummary>,
    pub runs: Vec<RepetitionRecord>,
}

impl ExperimentReport {
    pub fn summary(&self, scenario: &str) -> Option<&ScenarioSummary> {
        self.summaries.iter().find(|s| s.scenario == scenario)
    }

    pub fn runs_for<'a>(&'a self, scenario: &'a str) -> impl Iterator<Item = &'a RepetitionRecord> + 'a {
        self.runs.iter().filter(move |r| r.scenario == scenario)
    }
}

/// Fans every scenario out over `config.repetitions` independent streams and
/// aggregates the results.
#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    simulator: SingleRunSimulator,
    model: TransitionModel,
    parallel: bool,
}

impl ExperimentRunner {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self {
            simulator: SingleRunSimulator::new(config)?,
            model: TransitionModel::default(),
            parallel: true,
        })
    }

    pub fn with_model(mut self, model: TransitionModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.simulator = self.simulator.with_options(options);
        self
    }

    /// Runs repetitions one after another on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        self.simulator.config()
    }

    /// Validates every scenario and builds its transition matrix before any
    /// repetition starts, then runs them in name order.
    pub fn run(&self, scenarios: &ScenarioSet) -> Result<ExperimentReport> {
        let steps = self.config().steps;
        let mut prepared = Vec::with_capacity(scenarios.len());
        for (name, spec) in scenarios {
            spec.validate(steps)?;
            let matrix = self.model.build(&spec.bridge)?;
            prepared.push((name.as_str(), spec, matrix));
        }

        let mut report = ExperimentReport::default();
        for (name, spec, matrix) in prepared {
            let (summary, runs) = self.run_prepared(name, spec, &matrix)?;
            report.summaries.push(summary);
            report.runs.extend(runs);
        }
        Ok(report)
    }

    pub fn run_scenario(
        &self,
        name: &str,
        spec: &ScenarioSpec,
    ) -> Result<(ScenarioSummary, Vec<RepetitionRecord>)> {
        spec.validate(self.config().steps)?;
        let matrix = self.model.build(&spec.bridge)?;
        self.run_prepared(name, spec, &matrix)
    }

    fn run_prepared(
        &self,
        name: &str,
        spec: &ScenarioSpec,
        matrix: &TransitionMatrix,
    ) -> Result<(ScenarioSummary, Vec<RepetitionRecord>)> {
        let cfg = self.config();
        let scenario_seed = spec.seed.unwrap_or(cfg.seed);
        let seeds = derive_sub_seeds(scenario_seed, cfg.repetitions);
        info!(
            scenario = name,
            seed = scenario_seed,
            repetitions = cfg.repetitions,
            population = cfg.population,
            steps = cfg.steps,
            "running scenario"
        );

        let repeat = |seed: &u64| -> Result<RunResult> {
            let mut rng = stream(*seed);
            self.simulator.run_scenario(matrix, spec, &mut rng)
        };
        let results: Vec<RunResult> = if self.parallel {
            seeds.par_iter().map(repeat).collect::<Result<_>>()?
        } else {
            seeds.iter().map(repeat).collect::<Result<_>>()?
        };

        let runs: Vec<RepetitionRecord> = results
            .into_iter()
            .zip(&seeds)
            .enumerate()
            .map(|(run, (result, &seed))| {
                debug!(
                    scenario = name,
                    run,
                    seed,
                    burnout = result.burnout_incidence,
                    resonance = result.final_resonance,
                    "repetition finished"
                );
                RepetitionRecord {
                    scenario: name.to_string(),
                    run,
                    seed,
                    burnout: result.burnout_incidence,
                    resonance: result.final_resonance,
                    mean_resonance_over_run: result.mean_resonance_over_run,
                    history: result.history,
                }
            })
            .collect();

        let burnout: Vec<f64> = runs.iter().map(|r| r.burnout).collect();
        let resonance: Vec<f64> = runs.iter().map(|r| r.resonance).collect();
        let summary = ScenarioSummary::from_metrics(name, &burnout, &resonance);
        if summary.burnout_std_err.is_none() {
            warn!(scenario = name, "single repetition: standard error not available");
        }
        info!(
            scenario = name,
            burnout_mean = summary.burnout_mean,
            resonance_mean = summary.resonance_mean,
            "scenario finished"
        );
        Ok((summary, runs))
    }
}
