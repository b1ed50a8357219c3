use crate::stats::mean;
use crate::streams::gaussian;
use gam3arch_core::{
    InitialProfile, ResonanceModel, Result, SimulationConfig, SimulationError, State,
    TransitionMatrix, STATE_COUNT,
};
use rand::Rng;

/// Coefficients of the per-step latent-state update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDynamics {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub noise_sd: f64,
    pub horizon_exposure: f64,
    pub resonance: ResonanceModel,
}

impl StepDynamics {
    pub fn from_config(cfg: &SimulationConfig) -> Self {
        Self {
            alpha: cfg.alpha,
            beta: cfg.beta,
            gamma: cfg.gamma,
            delta: cfg.delta,
            noise_sd: cfg.noise_sd,
            horizon_exposure: cfg.horizon_exposure,
            resonance: ResonanceModel::from_config(cfg),
        }
    }
}

fn pick_initial(weights: &[f64; STATE_COUNT], draw: f64) -> State {
    let mut acc = 0.0;
    let mut last = State::Forge;
    for (state, &w) in State::ALL.iter().zip(weights) {
        if w <= 0.0 {
            continue;
        }
        acc += w;
        if acc >= draw {
            return *state;
        }
        last = *state;
    }
    last
}

/// Column-wise agent state for one repetition. Agent `i` is the `i`-th
/// entry of every column.
#[derive(Debug, Clone)]
pub struct AgentPopulation {
    states: Vec<State>,
    fatigue: Vec<f64>,
    motivation: Vec<f64>,
    horizon: Vec<f64>,
    novelty: Vec<f64>,
    burned_out: Vec<bool>,
    resonance: Vec<f64>,
    scratch: Vec<f64>,
}

impl AgentPopulation {
    /// Draws a fresh population. Columns are filled one after another
    /// (states, fatigue, motivation, novelty) from the same stream.
    pub fn initialize<R: Rng + ?Sized>(
        size: usize,
        profile: &InitialProfile,
        rng: &mut R,
    ) -> Result<Self> {
        if size == 0 {
            return Err(SimulationError::config("population", "must be at least 1"));
        }
        let states = (0..size)
            .map(|_| pick_initial(&profile.state_weights, rng.gen::<f64>()))
            .collect();
        let fatigue = (0..size).map(|_| rng.gen::<f64>() * profile.fatigue_range).collect();
        let motivation = (0..size)
            .map(|_| rng.gen::<f64>() * profile.motivation_range)
            .collect();
        let novelty = (0..size).map(|_| rng.gen::<f64>() * profile.novelty_range).collect();

        Ok(Self {
            states,
            fatigue,
            motivation,
            horizon: vec![0.0; size],
            novelty,
            burned_out: vec![false; size],
            resonance: vec![0.0; size],
            scratch: vec![0.0; size],
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn fatigue(&self) -> &[f64] {
        &self.fatigue
    }

    pub fn motivation(&self) -> &[f64] {
        &self.motivation
    }

    pub fn horizon_exposure(&self) -> &[f64] {
        &self.horizon
    }

    pub fn novelty(&self) -> &[f64] {
        &self.novelty
    }

    pub fn burned_out(&self) -> &[bool] {
        &self.burned_out
    }

    pub(crate) fn burned_out_mut(&mut self) -> &mut [bool] {
        &mut self.burned_out
    }

    /// Resonance computed by the most recent step (or refresh).
    pub fn resonance(&self) -> &[f64] {
        &self.resonance
    }

    pub fn burnout_incidence(&self) -> f64 {
        self.burned_out.iter().filter(|&&b| b).count() as f64 / self.len() as f64
    }

    pub fn mean_fatigue(&self) -> f64 {
        mean(&self.fatigue)
    }

    pub fn mean_motivation(&self) -> f64 {
        mean(&self.motivation)
    }

    pub fn mean_resonance(&self) -> f64 {
        mean(&self.resonance)
    }

    pub fn occupancy(&self) -> [usize; STATE_COUNT] {
        let mut counts = [0; STATE_COUNT];
        for state in &self.states {
            counts[state.index()] += 1;
        }
        counts
    }

    /// Recomputes resonance from the current columns without advancing time.
    pub fn refresh_resonance(&mut self, model: &ResonanceModel) {
        for i in 0..self.len() {
            self.resonance[i] = model.score(
                self.novelty[i],
                self.fatigue[i],
                self.motivation[i],
                self.horizon[i],
            );
        }
    }

    /// Advances every agent by one step and returns this step's resonance.
    ///
    /// `boost` is the recovery boost of the intervention step, added to every
    /// agent regardless of state; pass `None` on ordinary steps. State
    /// transitions read only the agent's own pre-step state, so the update is
    /// synchronous even though it is done in place.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        matrix: &TransitionMatrix,
        dynamics: &StepDynamics,
        boost: Option<f64>,
        rng: &mut R,
    ) -> Result<&[f64]> {
        let extra = boost.unwrap_or(0.0);

        for i in 0..self.len() {
            let resting = if self.states[i] == State::Back { 1.0 } else { 0.0 };
            let recovery = resting + extra;
            let next = self.fatigue[i] + dynamics.alpha - dynamics.beta * recovery
                + gaussian(rng, dynamics.noise_sd);
            self.fatigue[i] = next.max(0.0);
        }

        for u in self.scratch.iter_mut() {
            *u = rng.gen::<f64>();
        }
        for i in 0..self.len() {
            let next = self.motivation[i] + dynamics.gamma * self.scratch[i]
                - dynamics.delta * self.fatigue[i]
                + gaussian(rng, dynamics.noise_sd);
            self.motivation[i] = next.max(0.0);
        }

        for (h, state) in self.horizon.iter_mut().zip(&self.states) {
            *h = if *state == State::Horizon {
                dynamics.horizon_exposure
            } else {
                0.0
            };
        }

        self.refresh_resonance(&dynamics.resonance);

        for state in self.states.iter_mut() {
            *state = matrix.sample(*state, rng.gen::<f64>())?;
        }

        Ok(&self.resonance)
    }
}
