//! Seeded pseudo-random number generator
//!
//! Every stochastic decision in a game draws from one `SeededRng` owned by
//! that game. The same seed and game index always replay the same game.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::error::SampleError;

/// Seeded random number generator
///
/// Deterministic: same seed + index = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    inner: Pcg64Mcg,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and game index
    pub fn new(seed: &[u8; 32], game_index: u32) -> Self {
        // Combine seed bytes into initial state
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }

        // Mix in game index
        state ^= (game_index as u64).wrapping_mul(0x517cc1b727220a95);

        Self::from_u64(state)
    }

    /// Create an RNG from a single 64-bit seed
    pub fn from_u64(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Uniform double in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform double in [min, max)
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..max)
    }

    /// Uniform integer in the closed interval [min, max]
    pub fn range_inclusive(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Bernoulli trial on the raw probability `p`.
    ///
    /// `p` is not clamped: anything above 1 always succeeds and anything
    /// at or below 0 never does.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick an index with probability proportional to its weight
    pub fn weighted_index(&mut self, weights: &[f64]) -> Result<usize, SampleError> {
        if weights.is_empty() {
            return Err(SampleError::Empty);
        }
        if let Some((index, &weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(SampleError::InvalidWeight { index, weight });
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err(SampleError::ZeroTotalWeight);
        }

        let dist = WeightedIndex::new(weights).map_err(|_| SampleError::ZeroTotalWeight)?;
        Ok(dist.sample(&mut self.inner))
    }

    /// Pick an element of `population` with probability proportional to
    /// the matching entry of `weights`
    pub fn weighted_choice<'a, T>(
        &mut self,
        population: &'a [T],
        weights: &[f64],
    ) -> Result<&'a T, SampleError> {
        if population.len() != weights.len() {
            return Err(SampleError::LengthMismatch {
                population: population.len(),
                weights: weights.len(),
            });
        }
        let index = self.weighted_index(weights)?;
        Ok(&population[index])
    }
}
