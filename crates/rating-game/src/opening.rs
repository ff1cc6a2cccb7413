//! Opening strategies
//!
//! Each turn a player either replays one of the best cells it remembers or
//! explores. Exploration samples a cell from a mix of the uniform
//! distribution and the shared signal raised to an exponent; the mix is
//! computed once per round and cached.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SampleError};
use crate::map::Cell;
use crate::random::SeededRng;

/// Scale of cell values in the replay rule
const VALUE_SCALE: f64 = 99.0;

/// Linear replay rule for one remembered slot
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayRule {
    pub threshold: f64,
    pub slope: f64,
}

impl ReplayRule {
    /// `slope · (value − threshold) / 99`, unclamped
    pub fn probability(&self, value: i32) -> f64 {
        self.slope * (value as f64 - self.threshold) / VALUE_SCALE
    }
}

/// Parameters of an opening strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpeningParams {
    /// Weight of uniform exploration against signal-driven exploration, in [0, 1]
    pub exploration_bias: f64,
    /// Exponent applied to the signal before normalizing
    pub exploration_exponent: f64,
    /// One rule per turn of a round
    pub replay: Vec<ReplayRule>,
}

impl OpeningParams {
    /// Read `[bias, exponent, threshold_0, slope_0, threshold_1, slope_1, ...]`
    pub fn from_flat(params: &[f64]) -> Result<Self, ConfigError> {
        if params.len() < 4 || params.len() % 2 != 0 {
            return Err(ConfigError::MalformedCoefficients {
                model: "opening",
                field: "parameters",
                expected: 8,
                found: params.len(),
            });
        }
        let replay = params[2..]
            .chunks_exact(2)
            .map(|pair| ReplayRule {
                threshold: pair[0],
                slope: pair[1],
            })
            .collect();
        Ok(Self {
            exploration_bias: params[0],
            exploration_exponent: params[1],
            replay,
        })
    }

    pub fn to_flat(&self) -> Vec<f64> {
        let mut flat = vec![self.exploration_bias, self.exploration_exponent];
        for rule in &self.replay {
            flat.push(rule.threshold);
            flat.push(rule.slope);
        }
        flat
    }

    pub fn validate(&self, turns: usize) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.exploration_bias) {
            return Err(ConfigError::InvalidParameter {
                name: "exploration bias",
                value: self.exploration_bias,
            });
        }
        if !self.exploration_exponent.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "exploration exponent",
                value: self.exploration_exponent,
            });
        }
        if self.replay.len() != turns {
            return Err(ConfigError::ReplaySlots {
                expected: turns,
                found: self.replay.len(),
            });
        }
        Ok(())
    }
}

/// Exploration probabilities of the last round seen
#[derive(Clone, Debug, Default)]
struct ExplorationCache {
    round: Option<usize>,
    probabilities: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct OpeningStrategy {
    params: OpeningParams,
    cache: ExplorationCache,
}

impl OpeningStrategy {
    pub fn new(params: OpeningParams) -> Self {
        Self {
            params,
            cache: ExplorationCache::default(),
        }
    }

    pub fn params(&self) -> &OpeningParams {
        &self.params
    }

    /// Exploration probabilities cached for the current round
    pub fn exploration_probabilities(&self) -> &[f64] {
        &self.cache.probabilities
    }

    /// Raw replay probability for a remembered slot, `None` if the slot
    /// has no rule
    pub fn replay_probability(&self, slot: usize, value: i32) -> Option<f64> {
        self.params.replay.get(slot).map(|rule| rule.probability(value))
    }

    /// Choose the cell to open on the next turn.
    ///
    /// `remembered` holds the player's best cells, one per turn slot;
    /// `played` the cells already opened this round, so its length is the
    /// index of the current turn.
    pub fn choose_cell(
        &mut self,
        round: usize,
        signal: &[f64],
        remembered: &[Cell],
        played: &[Cell],
        rng: &mut SeededRng,
    ) -> Result<usize, SampleError> {
        if self.cache.round != Some(round) {
            self.refresh(round, signal);
        }

        let turn = played.len();
        if round != 0 {
            if let Some(&Cell { index: Some(index), value }) = remembered.get(turn) {
                if self.should_replay(turn, value, rng) {
                    return Ok(index);
                }
            }
        }
        self.explore(round, remembered, played, rng)
    }

    fn refresh(&mut self, round: usize, signal: &[f64]) {
        self.cache.round = Some(round);
        let n = signal.len();
        let uniform = vec![1.0 / n as f64; n];

        if signal.iter().all(|s| *s == 0.0) {
            self.cache.probabilities = uniform;
            return;
        }

        let alpha = self.params.exploration_exponent;
        let powers: Vec<f64> = signal.iter().map(|s| s.powf(alpha)).collect();
        let total: f64 = powers.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            debug!("signal powers sum to {}, exploring uniformly", total);
            self.cache.probabilities = uniform;
            return;
        }

        let bias = self.params.exploration_bias;
        self.cache.probabilities = powers
            .iter()
            .map(|power| bias / n as f64 + (1.0 - bias) * power / total)
            .collect();
    }

    fn should_replay(&self, slot: usize, value: i32, rng: &mut SeededRng) -> bool {
        let Some(p) = self.replay_probability(slot, value) else {
            return false;
        };
        if !(0.0..=1.0).contains(&p) {
            debug!("replay probability {} outside [0, 1] for slot {} (value {})", p, slot, value);
        }
        rng.chance(p)
    }

    fn explore(
        &self,
        round: usize,
        remembered: &[Cell],
        played: &[Cell],
        rng: &mut SeededRng,
    ) -> Result<usize, SampleError> {
        let mut excluded = vec![false; self.cache.probabilities.len()];
        let remembered = if round > 0 { remembered } else { &[] };
        for index in remembered.iter().chain(played).filter_map(|cell| cell.index) {
            if let Some(slot) = excluded.get_mut(index) {
                *slot = true;
            }
        }

        let mut weights: Vec<f64> = self
            .cache
            .probabilities
            .iter()
            .zip(&excluded)
            .map(|(p, &skip)| if skip { 0.0 } else { *p })
            .collect();

        // Every allowed cell has zero weight: fall back to uniform over them
        if weights.iter().all(|w| *w == 0.0) {
            weights = excluded
                .iter()
                .map(|&skip| if skip { 0.0 } else { 1.0 })
                .collect();
        }
        rng.weighted_index(&weights)
    }
}
