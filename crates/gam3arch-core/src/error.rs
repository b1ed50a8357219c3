use crate::state::State;
use thiserror::Error;

/// Errors raised by model construction and simulation setup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid configuration `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },
    #[error("degenerate transition row: no valid outgoing transition from {state}")]
    DegenerateTransition { state: State },
    /// `record` is the 1-based position of the visit in the input.
    #[error("malformed telemetry record {record}: {reason}")]
    Telemetry { record: usize, reason: String },
}

impl SimulationError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        SimulationError::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
