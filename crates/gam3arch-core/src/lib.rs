pub mod config;
pub mod error;
pub mod matrix;
pub mod resonance;
pub mod scenario;
pub mod state;
pub mod telemetry;
#[cfg(test)]
mod tests;

pub use config::{InitialProfile, Preset, SimulationConfig};
pub use error::{Result, SimulationError};
pub use matrix::{
    normalize_rows, BaseAffinity, BridgeMatrix, Matrix4, TransitionMatrix, TransitionModel,
    ROW_SUM_TOLERANCE,
};
pub use resonance::ResonanceModel;
pub use scenario::{scenarios_from_json, standard_scenarios, ScenarioSet, ScenarioSpec};
pub use state::{State, STATE_COUNT};
pub use telemetry::{extract_bridges, transition_intervals, ZoneVisit, DEFAULT_T0_MINUTES};
