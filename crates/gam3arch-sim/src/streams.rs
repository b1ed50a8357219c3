//! Random streams: per-repetition seed derivation and Gaussian noise.
//!
//! Sub-seeds come from a counter-based SplitMix64 scheme so that repetition
//! `i` of a scenario always receives the same stream for a given seed, no
//! matter how many scenarios ran before it or which thread runs it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator driving one repetition.
pub type SimRng = StdRng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 output function.
pub fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn sub_seed(seed: u64, repetition: usize) -> u64 {
    splitmix64(seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(repetition as u64 + 1)))
}

pub fn derive_sub_seeds(seed: u64, count: usize) -> Vec<u64> {
    (0..count).map(|i| sub_seed(seed, i)).collect()
}

pub fn stream(seed: u64) -> SimRng {
    StdRng::seed_from_u64(seed)
}

/// Standard normal variate via Box-Muller. Always consumes exactly two
/// uniforms so the stream position never depends on the values drawn.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // 1 - [0, 1) keeps the logarithm finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, sd: f64) -> f64 {
    sd * standard_normal(rng)
}
