use crate::error::{Result, SimulationError};
use crate::state::STATE_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a freshly constructed population is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialProfile {
    /// Categorical distribution of the initial state, in state order.
    pub state_weights: [f64; STATE_COUNT],
    /// Initial fatigue is uniform in `[0, fatigue_range)`.
    pub fatigue_range: f64,
    pub motivation_range: f64,
    pub novelty_range: f64,
}

impl Default for InitialProfile {
    fn default() -> Self {
        Self {
            state_weights: [0.5, 0.2, 0.2, 0.1],
            fatigue_range: 0.2,
            motivation_range: 0.8,
            novelty_range: 0.3,
        }
    }
}

fn default_noise_sd() -> f64 {
    0.02
}

fn default_horizon_exposure() -> f64 {
    0.7
}

/// Every numeric knob of a simulation. Passed by value into the runners so
/// that experiments with different presets can run side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub population: usize,
    pub steps: usize,
    pub repetitions: usize,
    pub seed: u64,
    pub r_max: f64,
    pub s_n: f64,
    pub k_m: f64,
    pub k_h: f64,
    pub m_max: f64,
    pub f50: f64,
    pub p: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub f_burn: f64,
    pub burn_window: usize,
    #[serde(default = "default_noise_sd")]
    pub noise_sd: f64,
    #[serde(default = "default_horizon_exposure")]
    pub horizon_exposure: f64,
    #[serde(default)]
    pub initial: InitialProfile,
}

impl SimulationConfig {
    pub fn paper() -> Self {
        Self {
            population: 500,
            steps: 500,
            repetitions: 20,
            seed: 42,
            r_max: 1.0,
            s_n: 5.0,
            k_m: 1.2,
            k_h: 1.0,
            m_max: 1.0,
            f50: 50.0,
            p: 2.0,
            alpha: 0.8,
            beta: 0.5,
            gamma: 0.4,
            delta: 0.6,
            f_burn: 0.8,
            burn_window: 50,
            noise_sd: default_noise_sd(),
            horizon_exposure: default_horizon_exposure(),
            initial: InitialProfile::default(),
        }
    }

    pub fn realistic() -> Self {
        Self {
            population: 1000,
            steps: 1000,
            repetitions: 5,
            s_n: 0.05,
            alpha: 0.03,
            f_burn: 0.75,
            burn_window: 10,
            ..Self::paper()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimulationError::config("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the fields that must be positive or finite before any
    /// simulation work starts.
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(SimulationError::config("population", "must be at least 1"));
        }
        if self.repetitions == 0 {
            return Err(SimulationError::config("repetitions", "must be at least 1"));
        }
        if self.burn_window == 0 {
            return Err(SimulationError::config("burn_window", "must be at least 1"));
        }
        if !(self.f50 > 0.0) || !self.f50.is_finite() {
            return Err(SimulationError::config("f50", format!("must be positive, got {}", self.f50)));
        }
        if !(self.m_max > 0.0) || !self.m_max.is_finite() {
            return Err(SimulationError::config("m_max", format!("must be positive, got {}", self.m_max)));
        }
        let finite = [
            ("r_max", self.r_max),
            ("s_n", self.s_n),
            ("k_m", self.k_m),
            ("k_h", self.k_h),
            ("p", self.p),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("delta", self.delta),
            ("f_burn", self.f_burn),
            ("horizon_exposure", self.horizon_exposure),
        ];
        if let Some((field, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimulationError::config(*field, format!("must be finite, got {value}")));
        }
        if !(self.noise_sd >= 0.0) || !self.noise_sd.is_finite() {
            return Err(SimulationError::config(
                "noise_sd",
                format!("must be finite and non-negative, got {}", self.noise_sd),
            ));
        }
        self.validate_initial()
    }

    fn validate_initial(&self) -> Result<()> {
        let weights = &self.initial.state_weights;
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SimulationError::config(
                "initial.state_weights",
                "entries must be finite and non-negative",
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(SimulationError::config(
                "initial.state_weights",
                format!("must sum to 1, got {sum}"),
            ));
        }
        let ranges = [
            ("initial.fatigue_range", self.initial.fatigue_range),
            ("initial.motivation_range", self.initial.motivation_range),
            ("initial.novelty_range", self.initial.novelty_range),
        ];
        if let Some((field, value)) = ranges.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(SimulationError::config(
                *field,
                format!("must be finite and non-negative, got {value}"),
            ));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::paper()
    }
}

/// Named parameter sets shipped with the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Paper,
    Realistic,
}

impl Preset {
    pub fn config(self) -> SimulationConfig {
        match self {
            Preset::Paper => SimulationConfig::paper(),
            Preset::Realistic => SimulationConfig::realistic(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Paper => f.write_str("paper"),
            Preset::Realistic => f.write_str("realistic"),
        }
    }
}

impl FromStr for Preset {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paper" => Ok(Preset::Paper),
            "realistic" => Ok(Preset::Realistic),
            other => Err(SimulationError::config("preset", format!("unknown preset `{other}`"))),
        }
    }
}
