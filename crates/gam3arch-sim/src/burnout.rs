use gam3arch_core::{Result, SimulationError};

/// Per-agent ring buffer of the most recent fatigue samples.
///
/// The buffer starts zero-filled, so its trailing mean is meaningless until
/// it has been overwritten completely. Detection opens once the step with
/// index `capacity` has been recorded and stays closed before that.
#[derive(Debug, Clone)]
pub struct BurnoutWindow {
    capacity: usize,
    agents: usize,
    // agent-major: agent i owns samples[i * capacity..(i + 1) * capacity]
    samples: Vec<f64>,
    cursor: usize,
    recorded: usize,
}

impl BurnoutWindow {
    pub fn new(agents: usize, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SimulationError::config("burn_window", "must be at least 1"));
        }
        Ok(Self {
            capacity,
            agents,
            samples: vec![0.0; agents * capacity],
            cursor: 0,
            recorded: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn agents(&self) -> usize {
        self.agents
    }

    pub fn steps_recorded(&self) -> usize {
        self.recorded
    }

    /// Overwrites the current slot with one fatigue sample per agent.
    pub fn record(&mut self, fatigue: &[f64]) {
        debug_assert_eq!(fatigue.len(), self.agents);
        let slot = self.cursor;
        for (agent, &value) in fatigue.iter().enumerate().take(self.agents) {
            self.samples[agent * self.capacity + slot] = value;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
        self.recorded += 1;
    }

    pub fn is_warm(&self) -> bool {
        self.recorded > self.capacity
    }

    pub fn trailing_mean(&self, agent: usize) -> f64 {
        let start = agent * self.capacity;
        self.samples[start..start + self.capacity].iter().sum::<f64>() / self.capacity as f64
    }

    /// Which agents currently exceed `threshold`, or `None` during warm-up.
    pub fn burned_out_now(&self, threshold: f64) -> Option<Vec<bool>> {
        if !self.is_warm() {
            return None;
        }
        Some(
            (0..self.agents)
                .map(|agent| self.trailing_mean(agent) > threshold)
                .collect(),
        )
    }

    /// ORs the current detection into `flags`. Flags are never cleared.
    /// Returns how many agents were newly flagged.
    pub fn latch_into(&self, threshold: f64, flags: &mut [bool]) -> usize {
        let Some(now) = self.burned_out_now(threshold) else {
            return 0;
        };
        let mut newly = 0;
        for (flag, hit) in flags.iter_mut().zip(now) {
            if hit && !*flag {
                *flag = true;
                newly += 1;
            }
        }
        newly
    }
}
