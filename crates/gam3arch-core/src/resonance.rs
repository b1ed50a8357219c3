use crate::config::SimulationConfig;
use serde::{Deserialize, Serialize};

/// Weights of the per-agent resonance score.
///
/// `score = r_max * (1 + s_n*S) * F(fat) * M(mot) * H(hor)` where `F`
/// decreases with fatigue, `M` grows with motivation and `H` is the horizon
/// exposure boost. The score is diagnostic only and never feeds back into
/// the transition dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResonanceModel {
    pub r_max: f64,
    pub s_n: f64,
    pub k_m: f64,
    pub k_h: f64,
    pub m_max: f64,
    pub f50: f64,
    pub p: f64,
}

impl ResonanceModel {
    pub fn from_config(cfg: &SimulationConfig) -> Self {
        Self {
            r_max: cfg.r_max,
            s_n: cfg.s_n,
            k_m: cfg.k_m,
            k_h: cfg.k_h,
            m_max: cfg.m_max,
            f50: cfg.f50,
            p: cfg.p,
        }
    }

    pub fn fatigue_multiplier(&self, fatigue: f64) -> f64 {
        1.0 / (1.0 + (fatigue / self.f50).powf(self.p))
    }

    pub fn motivation_multiplier(&self, motivation: f64) -> f64 {
        1.0 + self.k_m * (motivation / self.m_max)
    }

    pub fn horizon_multiplier(&self, exposure: f64) -> f64 {
        1.0 + self.k_h * exposure
    }

    pub fn score(&self, novelty: f64, fatigue: f64, motivation: f64, exposure: f64) -> f64 {
        self.r_max
            * (1.0 + self.s_n * novelty)
            * self.fatigue_multiplier(fatigue)
            * self.motivation_multiplier(motivation)
            * self.horizon_multiplier(exposure)
    }
}

impl From<&SimulationConfig> for ResonanceModel {
    fn from(cfg: &SimulationConfig) -> Self {
        Self::from_config(cfg)
    }
}
