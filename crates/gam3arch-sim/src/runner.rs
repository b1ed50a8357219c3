use crate::burnout::BurnoutWindow;
use crate::population::{AgentPopulation, StepDynamics};
use gam3arch_core::{
    Result, ScenarioSpec, SimulationConfig, SimulationError, TransitionMatrix, STATE_COUNT,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub record_history: bool,
}

/// Population aggregates after one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub step: usize,
    pub burnout_fraction: f64,
    pub mean_fatigue: f64,
    pub mean_motivation: f64,
    pub mean_resonance: f64,
    pub occupancy: [usize; STATE_COUNT],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Fraction of agents that burned out at any point in the run.
    pub burnout_incidence: f64,
    /// Mean resonance on the final step only.
    pub final_resonance: f64,
    /// Mean over steps of the per-step population mean resonance.
    pub mean_resonance_over_run: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<StepSnapshot>>,
}

/// Drives one population through `config.steps` sequential steps.
#[derive(Debug, Clone)]
pub struct SingleRunSimulator {
    config: SimulationConfig,
    dynamics: StepDynamics,
    options: RunOptions,
}

impl SingleRunSimulator {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let dynamics = StepDynamics::from_config(&config);
        Ok(Self {
            config,
            dynamics,
            options: RunOptions::default(),
        })
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs a fresh population under `scenario`, boosting recovery on the
    /// steps for which [`ScenarioSpec::boost_at`] returns a value.
    pub fn run_scenario<R: Rng + ?Sized>(
        &self,
        matrix: &TransitionMatrix,
        scenario: &ScenarioSpec,
        rng: &mut R,
    ) -> Result<RunResult> {
        scenario.validate(self.config.steps)?;
        self.run_with(matrix, rng, |t| scenario.boost_at(t))
    }

    /// Runs a fresh population. The recovery boost is applied once, on
    /// `intervention_step`, which must lie inside the run.
    pub fn run<R: Rng + ?Sized>(
        &self,
        matrix: &TransitionMatrix,
        rng: &mut R,
        intervention_step: Option<usize>,
        recovery_boost: f64,
    ) -> Result<RunResult> {
        let cfg = &self.config;
        if let Some(step) = intervention_step {
            if step >= cfg.steps {
                return Err(SimulationError::config(
                    "intervention_step",
                    format!("step {step} is outside the run of {} steps", cfg.steps),
                ));
            }
        }
        self.run_with(matrix, rng, |t| {
            (intervention_step == Some(t)).then_some(recovery_boost)
        })
    }

    fn run_with<R, B>(&self, matrix: &TransitionMatrix, rng: &mut R, boost_at: B) -> Result<RunResult>
    where
        R: Rng + ?Sized,
        B: Fn(usize) -> Option<f64>,
    {
        let cfg = &self.config;
        let mut population = AgentPopulation::initialize(cfg.population, &cfg.initial, rng)?;
        population.refresh_resonance(&self.dynamics.resonance);
        let mut window = BurnoutWindow::new(cfg.population, cfg.burn_window)?;
        let mut history = self
            .options
            .record_history
            .then(|| Vec::with_capacity(cfg.steps));
        let mut resonance_total = 0.0;

        for t in 0..cfg.steps {
            population.step(matrix, &self.dynamics, boost_at(t), rng)?;
            window.record(population.fatigue());
            window.latch_into(cfg.f_burn, population.burned_out_mut());

            let mean_resonance = population.mean_resonance();
            resonance_total += mean_resonance;
            if let Some(history) = history.as_mut() {
                history.push(StepSnapshot {
                    step: t,
                    burnout_fraction: population.burnout_incidence(),
                    mean_fatigue: population.mean_fatigue(),
                    mean_motivation: population.mean_motivation(),
                    mean_resonance,
                    occupancy: population.occupancy(),
                });
            }
        }

        let final_resonance = population.mean_resonance();
        let mean_resonance_over_run = if cfg.steps == 0 {
            final_resonance
        } else {
            resonance_total / cfg.steps as f64
        };

        Ok(RunResult {
            burnout_incidence: population.burnout_incidence(),
            final_resonance,
            mean_resonance_over_run,
            history,
        })
    }
}
