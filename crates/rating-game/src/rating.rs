//! Rating strategies
//!
//! A rating strategy turns the value of an opened cell into a probability
//! for each rating level 0..=5, then samples a rating. The response curve
//! is one of five parametric families, chosen by name in the JSON
//! configuration (`"functionType"`).

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};
use crate::random::SeededRng;

/// Number of rating levels (0 to 5 stars)
pub const RATING_LEVELS: usize = 6;

/// Scale of cell values in the response curves
const VALUE_SCALE: f64 = 99.0;

/// Rounding noise tolerated below zero before a probability is rejected
const PROBABILITY_TOLERANCE: f64 = 1e-12;

/// Parametric response curve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRatingModel", into = "RawRatingModel")]
pub enum RatingModel {
    /// `p = a0 + a1·tanh((v − a2)/99·a3)` for ratings 0 and 5
    Tanh { p0: [f64; 4], p5: [f64; 4] },
    /// Fixed probabilities for ratings 0 and 5
    Constant { p0: f64, p5: f64 },
    /// `p = a0 + a1·v/99` for ratings 0 and 5
    Linear { p0: [f64; 2], p5: [f64; 2] },
    /// `p = a0·exp(−((v − a1)/99·a2)²)` for ratings 1..=5; rating 0 gets
    /// the remainder
    Gaussian { levels: [[f64; 3]; 5] },
    /// Mean rating `m = b0 + 5·b1·v/99`, split between its two
    /// neighbouring levels
    MnsLinear { mns: [f64; 2] },
}

impl RatingModel {
    /// Identifiers accepted in `"functionType"`
    pub const NAMES: [&'static str; 5] = ["tanh", "constant", "linear", "gaussian", "mns_linear"];

    pub fn name(&self) -> &'static str {
        match self {
            RatingModel::Tanh { .. } => "tanh",
            RatingModel::Constant { .. } => "constant",
            RatingModel::Linear { .. } => "linear",
            RatingModel::Gaussian { .. } => "gaussian",
            RatingModel::MnsLinear { .. } => "mns_linear",
        }
    }

    /// Probability of each rating level for a cell of the given value
    pub fn probabilities(&self, value: i32) -> Result<[f64; RATING_LEVELS], ConfigError> {
        let v = value as f64;
        let mut p = [0.0; RATING_LEVELS];

        match self {
            RatingModel::Tanh { p0, p5 } => {
                p[0] = tanh_response(p0, v);
                p[5] = tanh_response(p5, v);
                spread_middle(&mut p);
            }
            RatingModel::Constant { p0, p5 } => {
                p[0] = *p0;
                p[5] = *p5;
                spread_middle(&mut p);
            }
            RatingModel::Linear { p0, p5 } => {
                p[0] = p0[0] + p0[1] * v / VALUE_SCALE;
                p[5] = p5[0] + p5[1] * v / VALUE_SCALE;
                spread_middle(&mut p);
            }
            RatingModel::Gaussian { levels } => {
                for (rating, coefficients) in levels.iter().enumerate() {
                    p[rating + 1] = gaussian_response(coefficients, v);
                }
                p[0] = 1.0 - p[1..].iter().sum::<f64>();
            }
            RatingModel::MnsLinear { mns } => {
                let m = mns[0] + 5.0 * mns[1] * v / VALUE_SCALE;
                if m <= 0.0 {
                    p[0] = 1.0;
                } else if m >= 5.0 {
                    p[5] = 1.0;
                } else {
                    let base = m.floor();
                    let frac = m - base;
                    let base = base as usize;
                    p[base] = 1.0 - frac;
                    p[base + 1] = frac;
                }
            }
        }

        for (rating, probability) in p.iter_mut().enumerate() {
            if !probability.is_finite() || *probability < -PROBABILITY_TOLERANCE {
                return Err(ConfigError::InvalidProbability {
                    rating,
                    value,
                    probability: *probability,
                });
            }
            if *probability < 0.0 {
                *probability = 0.0;
            }
        }
        Ok(p)
    }
}

/// Split what ratings 0 and 5 leave evenly over ratings 1..=4
fn spread_middle(p: &mut [f64; RATING_LEVELS]) {
    let middle = (1.0 - p[0] - p[5]) / 4.0;
    p[1..5].fill(middle);
}

fn tanh_response(a: &[f64; 4], v: f64) -> f64 {
    a[0] + a[1] * ((v - a[2]) / VALUE_SCALE * a[3]).tanh()
}

fn gaussian_response(a: &[f64; 3], v: f64) -> f64 {
    a[0] * (-((v - a[1]) / VALUE_SCALE * a[2]).powi(2)).exp()
}

/// How a rating model looks in JSON
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawRatingModel {
    #[serde(rename = "functionType")]
    function_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p0: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p1: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p2: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p3: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p4: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p5: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mns: Option<Vec<f64>>,
}

fn coefficients<const N: usize>(
    model: &'static str,
    field: &'static str,
    values: Option<Vec<f64>>,
) -> Result<[f64; N], ConfigError> {
    let values = values.unwrap_or_default();
    let found = values.len();
    values
        .try_into()
        .map_err(|_| ConfigError::MalformedCoefficients {
            model,
            field,
            expected: N,
            found,
        })
}

impl TryFrom<RawRatingModel> for RatingModel {
    type Error = ConfigError;

    fn try_from(raw: RawRatingModel) -> Result<Self, Self::Error> {
        match raw.function_type.as_str() {
            "tanh" => Ok(RatingModel::Tanh {
                p0: coefficients("tanh", "p0", raw.p0)?,
                p5: coefficients("tanh", "p5", raw.p5)?,
            }),
            "constant" => {
                let [p0]: [f64; 1] = coefficients("constant", "p0", raw.p0)?;
                let [p5]: [f64; 1] = coefficients("constant", "p5", raw.p5)?;
                Ok(RatingModel::Constant { p0, p5 })
            }
            "linear" => Ok(RatingModel::Linear {
                p0: coefficients("linear", "p0", raw.p0)?,
                p5: coefficients("linear", "p5", raw.p5)?,
            }),
            "gaussian" => Ok(RatingModel::Gaussian {
                levels: [
                    coefficients("gaussian", "p1", raw.p1)?,
                    coefficients("gaussian", "p2", raw.p2)?,
                    coefficients("gaussian", "p3", raw.p3)?,
                    coefficients("gaussian", "p4", raw.p4)?,
                    coefficients("gaussian", "p5", raw.p5)?,
                ],
            }),
            "mns_linear" | "mns" => Ok(RatingModel::MnsLinear {
                mns: coefficients("mns_linear", "mns", raw.mns)?,
            }),
            other => Err(ConfigError::UnknownRatingModel(other.to_string())),
        }
    }
}

impl From<RatingModel> for RawRatingModel {
    fn from(model: RatingModel) -> Self {
        let mut raw = RawRatingModel {
            function_type: model.name().to_string(),
            ..Default::default()
        };
        match model {
            RatingModel::Tanh { p0, p5 } => {
                raw.p0 = Some(p0.to_vec());
                raw.p5 = Some(p5.to_vec());
            }
            RatingModel::Constant { p0, p5 } => {
                raw.p0 = Some(vec![p0]);
                raw.p5 = Some(vec![p5]);
            }
            RatingModel::Linear { p0, p5 } => {
                raw.p0 = Some(p0.to_vec());
                raw.p5 = Some(p5.to_vec());
            }
            RatingModel::Gaussian { levels } => {
                let [p1, p2, p3, p4, p5] = levels;
                raw.p1 = Some(p1.to_vec());
                raw.p2 = Some(p2.to_vec());
                raw.p3 = Some(p3.to_vec());
                raw.p4 = Some(p4.to_vec());
                raw.p5 = Some(p5.to_vec());
            }
            RatingModel::MnsLinear { mns } => raw.mns = Some(mns.to_vec()),
        }
        raw
    }
}

/// Chooses how many stars to give an opened cell
#[derive(Clone, Debug, PartialEq)]
pub struct RatingStrategy {
    model: RatingModel,
    levels: [i32; RATING_LEVELS],
}

impl RatingStrategy {
    pub fn new(model: RatingModel) -> Self {
        Self {
            model,
            levels: [0, 1, 2, 3, 4, 5],
        }
    }

    pub fn model(&self) -> &RatingModel {
        &self.model
    }

    pub fn probabilities(&self, value: i32) -> Result<[f64; RATING_LEVELS], ConfigError> {
        self.model.probabilities(value)
    }

    /// Sample a rating for a cell of the given value
    pub fn choose_rating(&self, value: i32, rng: &mut SeededRng) -> Result<i32, Error> {
        let probabilities = self.model.probabilities(value)?;
        Ok(*rng.weighted_choice(&self.levels, &probabilities)?)
    }
}
