use serde::{Deserialize, Serialize};

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Needs two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Standard error of the mean, `None` when it is not available.
pub fn standard_error(values: &[f64]) -> Option<f64> {
    sample_std_dev(values).map(|sd| sd / (values.len() as f64).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStdErr {
    pub mean: f64,
    pub std_err: Option<f64>,
}

impl MeanStdErr {
    pub fn of(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std_err: standard_error(values),
        }
    }
}
