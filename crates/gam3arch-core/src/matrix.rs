use crate::error::{Result, SimulationError};
use crate::state::{State, STATE_COUNT};
use serde::{Deserialize, Serialize};

pub type Matrix4 = [[f64; STATE_COUNT]; STATE_COUNT];

/// Tolerance used when checking that a transition row sums to one.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

fn check_entries(field: &'static str, rows: &Matrix4) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::config(
                    field,
                    format!("entry [{i}][{j}] = {value} must be finite and non-negative"),
                ));
            }
        }
    }
    Ok(())
}

/// Intrinsic state-to-state affinity, before any scenario modifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseAffinity(Matrix4);

impl BaseAffinity {
    pub fn standard() -> Self {
        Self([
            [0.55, 0.15, 0.20, 0.10],
            [0.20, 0.50, 0.20, 0.10],
            [0.25, 0.25, 0.40, 0.10],
            [0.30, 0.20, 0.10, 0.40],
        ])
    }

    pub fn new(rows: Matrix4) -> Result<Self> {
        check_entries("base_affinity", &rows)?;
        Ok(Self(rows))
    }

    pub fn rows(&self) -> &Matrix4 {
        &self.0
    }
}

impl Default for BaseAffinity {
    fn default() -> Self {
        Self::standard()
    }
}

/// Scenario-specific multiplicative modifier of the base affinity.
///
/// Serializes as a JSON array of four arrays of four numbers, indexed in
/// [`State`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct BridgeMatrix(Matrix4);

impl BridgeMatrix {
    pub fn ones() -> Self {
        Self([[1.0; STATE_COUNT]; STATE_COUNT])
    }

    pub fn uniform(value: f64) -> Result<Self> {
        Self::new([[value; STATE_COUNT]; STATE_COUNT])
    }

    pub fn new(rows: Matrix4) -> Result<Self> {
        check_entries("bridge", &rows)?;
        Ok(Self(rows))
    }

    /// Builds a bridge matrix from dynamically shaped rows, rejecting
    /// anything that is not 4x4.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.len() != STATE_COUNT {
            return Err(SimulationError::config(
                "bridge",
                format!("expected {STATE_COUNT} rows, got {}", rows.len()),
            ));
        }
        let mut matrix = [[0.0; STATE_COUNT]; STATE_COUNT];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != STATE_COUNT {
                return Err(SimulationError::config(
                    "bridge",
                    format!("row {i} has {} columns, expected {STATE_COUNT}", row.len()),
                ));
            }
            matrix[i].copy_from_slice(row);
        }
        Self::new(matrix)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SimulationError::config("bridge", e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimulationError::config("bridge", e.to_string()))
    }

    pub fn with_entry(mut self, from: State, to: State, value: f64) -> Result<Self> {
        self.0[from.index()][to.index()] = value;
        check_entries("bridge", &self.0)?;
        Ok(self)
    }

    pub fn get(&self, from: State, to: State) -> f64 {
        self.0[from.index()][to.index()]
    }

    pub fn rows(&self) -> &Matrix4 {
        &self.0
    }
}

impl Default for BridgeMatrix {
    fn default() -> Self {
        Self::ones()
    }
}

impl TryFrom<Vec<Vec<f64>>> for BridgeMatrix {
    type Error = SimulationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<BridgeMatrix> for Vec<Vec<f64>> {
    fn from(bridge: BridgeMatrix) -> Self {
        bridge.0.iter().map(|row| row.to_vec()).collect()
    }
}

/// Divides every row by its sum. Rows summing to zero are left all-zero.
pub fn normalize_rows(weights: &Matrix4) -> Matrix4 {
    let mut out = *weights;
    for row in out.iter_mut() {
        let sum: f64 = row.iter().sum();
        if sum > 0.0 {
            row.iter_mut().for_each(|w| *w /= sum);
        }
    }
    out
}

/// Row-stochastic transition matrix, shared read-only by every repetition
/// of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionMatrix {
    rows: Matrix4,
    #[serde(skip)]
    cumulative: Matrix4,
}

impl TransitionMatrix {
    fn from_parts(rows: Matrix4) -> Self {
        let mut cumulative = [[0.0; STATE_COUNT]; STATE_COUNT];
        for (row, cum) in rows.iter().zip(cumulative.iter_mut()) {
            let mut acc = 0.0;
            for (p, c) in row.iter().zip(cum.iter_mut()) {
                acc += p;
                *c = acc;
            }
        }
        Self { rows, cumulative }
    }

    /// Accepts rows that are already normalized. A row may also be all-zero;
    /// sampling from such a row fails with
    /// [`SimulationError::DegenerateTransition`].
    pub fn from_normalized(rows: Matrix4) -> Result<Self> {
        check_entries("transition_matrix", &rows)?;
        for (i, row) in rows.iter().enumerate() {
            let sum: f64 = row.iter().sum();
            if sum != 0.0 && (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SimulationError::config(
                    "transition_matrix",
                    format!("row {i} sums to {sum}"),
                ));
            }
        }
        Ok(Self::from_parts(rows))
    }

    pub fn rows(&self) -> &Matrix4 {
        &self.rows
    }

    pub fn row(&self, from: State) -> &[f64; STATE_COUNT] {
        &self.rows[from.index()]
    }

    pub fn probability(&self, from: State, to: State) -> f64 {
        self.rows[from.index()][to.index()]
    }

    pub fn is_degenerate(&self, from: State) -> bool {
        self.row(from).iter().all(|&p| p == 0.0)
    }

    pub fn degenerate_states(&self) -> Vec<State> {
        State::ALL
            .iter()
            .copied()
            .filter(|&s| self.is_degenerate(s))
            .collect()
    }

    /// Picks the next state for an agent in `from` given a uniform draw in
    /// `[0, 1)`: the first category whose cumulative probability reaches the
    /// draw. Zero-probability categories are never selected, and the last
    /// reachable category absorbs any floating-point shortfall of the
    /// cumulative sum.
    pub fn sample(&self, from: State, draw: f64) -> Result<State> {
        let row = &self.rows[from.index()];
        let cumulative = &self.cumulative[from.index()];
        let mut last_reachable = None;
        for k in 0..STATE_COUNT {
            if row[k] <= 0.0 {
                continue;
            }
            if cumulative[k] >= draw {
                return Ok(State::ALL[k]);
            }
            last_reachable = Some(k);
        }
        last_reachable
            .map(|k| State::ALL[k])
            .ok_or(SimulationError::DegenerateTransition { state: from })
    }
}

/// Combines the base affinity with a scenario's bridge matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionModel {
    base: BaseAffinity,
}

impl TransitionModel {
    pub fn new(base: BaseAffinity) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BaseAffinity {
        &self.base
    }

    /// Element-wise product of base affinity and bridge, before normalization.
    pub fn weights(&self, bridge: &BridgeMatrix) -> Matrix4 {
        let mut out = *self.base.rows();
        for (row, bridge_row) in out.iter_mut().zip(bridge.rows()) {
            for (w, b) in row.iter_mut().zip(bridge_row) {
                *w *= b;
            }
        }
        out
    }

    /// Builds the scenario's transition matrix. A bridge that leaves some
    /// state with no outgoing mass is rejected rather than patched.
    pub fn build(&self, bridge: &BridgeMatrix) -> Result<TransitionMatrix> {
        let rows = normalize_rows(&self.weights(bridge));
        if let Some(state) = State::ALL
            .iter()
            .copied()
            .find(|s| rows[s.index()].iter().all(|&p| p == 0.0))
        {
            return Err(SimulationError::DegenerateTransition { state });
        }
        Ok(TransitionMatrix::from_parts(rows))
    }
}
