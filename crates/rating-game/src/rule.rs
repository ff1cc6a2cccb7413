//! Scoring rules
//!
//! A rule fixes the allowed ratings and turns one round of a player's
//! openings into a score contribution. Rules are chosen by number (1..=4)
//! when the game is configured and never change afterwards.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rating bounds imposed by a rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingLimits {
    pub min: i32,
    pub max: i32,
    /// Total rating a player may hand out in one round
    pub per_round: i32,
}

impl RatingLimits {
    const fn new(min: i32, max: i32, per_round: i32) -> Self {
        Self { min, max, per_round }
    }
}

/// Score awarded per unused rating point under rule 4
pub const UNUSED_RATING_BONUS: i32 = 50;

/// Scoring policy of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rule {
    /// Rule 1: nobody scores.
    NoScore { limits: RatingLimits },
    /// Rule 2: sum of the opened values.
    ValueSum { limits: RatingLimits },
    /// Rule 3: opened values weighted by the ratings given.
    Weighted { limits: RatingLimits },
    /// Rule 4: rule 3 plus a bonus for every rating point left unused.
    WeightedWithBonus {
        limits: RatingLimits,
        unused_rating_bonus: i32,
    },
}

impl Rule {
    pub fn no_score() -> Self {
        Rule::NoScore {
            limits: RatingLimits::new(0, 5, 15),
        }
    }

    pub fn value_sum() -> Self {
        Rule::ValueSum {
            limits: RatingLimits::new(0, 5, 15),
        }
    }

    pub fn weighted() -> Self {
        Rule::Weighted {
            limits: RatingLimits::new(0, 5, 8),
        }
    }

    pub fn weighted_with_bonus() -> Self {
        Rule::WeightedWithBonus {
            limits: RatingLimits::new(0, 5, 8),
            unused_rating_bonus: UNUSED_RATING_BONUS,
        }
    }

    /// Build a rule from its number
    pub fn from_id(id: u8) -> Result<Self, ConfigError> {
        match id {
            1 => Ok(Self::no_score()),
            2 => Ok(Self::value_sum()),
            3 => Ok(Self::weighted()),
            4 => Ok(Self::weighted_with_bonus()),
            _ => Err(ConfigError::UnknownRule(id)),
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Rule::NoScore { .. } => 1,
            Rule::ValueSum { .. } => 2,
            Rule::Weighted { .. } => 3,
            Rule::WeightedWithBonus { .. } => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::NoScore { .. } => "rule_1",
            Rule::ValueSum { .. } => "rule_2",
            Rule::Weighted { .. } => "rule_3",
            Rule::WeightedWithBonus { .. } => "rule_4",
        }
    }

    pub fn limits(&self) -> RatingLimits {
        match *self {
            Rule::NoScore { limits }
            | Rule::ValueSum { limits }
            | Rule::Weighted { limits }
            | Rule::WeightedWithBonus { limits, .. } => limits,
        }
    }

    pub fn min_rating(&self) -> i32 {
        self.limits().min
    }

    pub fn max_rating(&self) -> i32 {
        self.limits().max
    }

    pub fn max_rating_per_round(&self) -> i32 {
        self.limits().per_round
    }

    /// Score of one round given the values opened and the ratings given,
    /// turn by turn
    pub fn score(&self, values: &[i32], ratings: &[i32]) -> i64 {
        match *self {
            Rule::NoScore { .. } => 0,
            Rule::ValueSum { .. } => values.iter().map(|&v| v as i64).sum(),
            Rule::Weighted { .. } => dot(values, ratings),
            Rule::WeightedWithBonus {
                limits,
                unused_rating_bonus,
            } => {
                let used: i64 = ratings.iter().map(|&r| r as i64).sum();
                let unused = limits.per_round as i64 - used;
                dot(values, ratings) + unused * unused_rating_bonus as i64
            }
        }
    }
}

fn dot(values: &[i32], ratings: &[i32]) -> i64 {
    values
        .iter()
        .zip(ratings)
        .map(|(&v, &r)| v as i64 * r as i64)
        .sum()
}

impl TryFrom<u8> for Rule {
    type Error = ConfigError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Rule::from_id(id)
    }
}

impl From<Rule> for u8 {
    fn from(rule: Rule) -> u8 {
        rule.id()
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::value_sum()
    }
}
