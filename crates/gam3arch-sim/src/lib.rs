//! Monte-Carlo engine for the GAM3ARCH burnout model.
//!
//! [`AgentPopulation`] holds the per-agent columns and applies one step of
//! the coupled fatigue/motivation/Markov update, [`BurnoutWindow`] latches
//! sustained fatigue, [`SingleRunSimulator`] drives one repetition and
//! [`ExperimentRunner`] fans scenarios out over independent random streams.

pub mod burnout;
pub mod experiment;
pub mod population;
pub mod runner;
pub mod stats;
pub mod streams;

pub use burnout::BurnoutWindow;
pub use experiment::{ExperimentReport, ExperimentRunner, RepetitionRecord, ScenarioSummary};
pub use population::{AgentPopulation, StepDynamics};
pub use runner::{RunOptions, RunResult, SingleRunSimulator, StepSnapshot};
pub use stats::{mean, sample_std_dev, standard_error, MeanStdErr};
pub use streams::{derive_sub_seeds, stream, sub_seed, SimRng};
