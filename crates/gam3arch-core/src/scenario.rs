use crate::error::{Result, SimulationError};
use crate::matrix::BridgeMatrix;
use crate::state::State;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scenarios keyed by name. Ordered so reports come out the same way every
/// run.
pub type ScenarioSet = BTreeMap<String, ScenarioSpec>;

/// One experimental condition: a bridge matrix and an optional one-time
/// recovery intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub bridge: BridgeMatrix,
    #[serde(default)]
    pub intervention_step: Option<usize>,
    #[serde(default)]
    pub recovery_boost: f64,
    /// Overrides the experiment seed for this scenario's repetitions.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ScenarioSpec {
    pub fn new(bridge: BridgeMatrix) -> Self {
        Self {
            bridge,
            intervention_step: None,
            recovery_boost: 0.0,
            seed: None,
        }
    }

    pub fn with_intervention(mut self, step: usize, recovery_boost: f64) -> Self {
        self.intervention_step = Some(step);
        self.recovery_boost = recovery_boost;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn baseline() -> Self {
        Self::new(BridgeMatrix::ones())
    }

    pub fn strong_bridges() -> Result<Self> {
        Ok(Self::new(BridgeMatrix::uniform(0.98)?))
    }

    /// Uniformly weakened bridges with Forge->Back and Horizon->Forge
    /// sharply dampened.
    pub fn weak_bridges() -> Result<Self> {
        let bridge = BridgeMatrix::uniform(0.95)?
            .with_entry(State::Forge, State::Back, 0.1)?
            .with_entry(State::Horizon, State::Forge, 0.2)?;
        Ok(Self::new(bridge))
    }

    /// Bridges at 0.9 plus a recovery boost of 0.2 halfway through the run.
    /// A run without steps has no step to boost, so it gets the bridges only.
    pub fn intervention(steps: usize) -> Result<Self> {
        let spec = Self::new(BridgeMatrix::uniform(0.9)?);
        if steps == 0 {
            return Ok(spec);
        }
        Ok(spec.with_intervention(steps / 2, 0.2))
    }

    /// Recovery boost to apply at `step`, if this is the intervention step.
    pub fn boost_at(&self, step: usize) -> Option<f64> {
        match self.intervention_step {
            Some(at) if at == step => Some(self.recovery_boost),
            _ => None,
        }
    }

    pub fn validate(&self, steps: usize) -> Result<()> {
        if let Some(step) = self.intervention_step {
            if step >= steps {
                return Err(SimulationError::config(
                    "intervention_step",
                    format!("step {step} is outside the run of {steps} steps"),
                ));
            }
        }
        if !self.recovery_boost.is_finite() {
            return Err(SimulationError::config(
                "recovery_boost",
                format!("must be finite, got {}", self.recovery_boost),
            ));
        }
        Ok(())
    }
}

/// Baseline, StrongBridges, WeakBridges and Intervention for a run of
/// `steps` steps.
pub fn standard_scenarios(steps: usize) -> Result<ScenarioSet> {
    let mut set = ScenarioSet::new();
    set.insert("Baseline".to_string(), ScenarioSpec::baseline());
    set.insert("StrongBridges".to_string(), ScenarioSpec::strong_bridges()?);
    set.insert("WeakBridges".to_string(), ScenarioSpec::weak_bridges()?);
    set.insert("Intervention".to_string(), ScenarioSpec::intervention(steps)?);
    Ok(set)
}

pub fn scenarios_from_json(json: &str) -> Result<ScenarioSet> {
    serde_json::from_str(json).map_err(|e| SimulationError::config("scenarios", e.to_string()))
}
