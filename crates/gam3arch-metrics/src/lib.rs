pub mod guards;
pub mod metrics;

pub use guards::{burnout_regressed, reject_if_burnout_increases};
pub use metrics::ExperimentMetrics;
