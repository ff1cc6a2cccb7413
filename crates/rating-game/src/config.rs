//! Game and population configuration
//!
//! Everything here is plain data with serde derives so a whole game setup
//! can be described in one JSON document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::map::Map;
use crate::opening::OpeningParams;
use crate::player::AgentType;
use crate::random::SeededRng;
use crate::rating::RatingModel;
use crate::rule::Rule;

/// Turns per round used by the full model
pub const DEFAULT_TURNS: usize = 3;

fn default_turns() -> usize {
    DEFAULT_TURNS
}

/// Exponential decay of the shared signal
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decay {
    /// Time constant, in rounds
    pub tau: f64,
}

impl Decay {
    /// Multiplier applied to the accumulated signal every round
    pub fn factor(&self) -> f64 {
        1.0 - 1.0 / self.tau
    }
}

/// Shape of one game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rounds: usize,
    #[serde(default = "default_turns")]
    pub turns: usize,
    pub players: usize,
    #[serde(default)]
    pub rule: Rule,
    /// `None` makes the signal the plain cumulative rating distribution
    #[serde(default)]
    pub decay: Option<Decay>,
}

impl GameConfig {
    /// Three turns per round, no decay
    pub fn standard(rounds: usize, players: usize, rule: Rule) -> Self {
        Self {
            rounds,
            turns: DEFAULT_TURNS,
            players,
            rule,
            decay: None,
        }
    }

    pub fn with_turns(mut self, turns: usize) -> Self {
        self.turns = turns;
        self
    }

    pub fn with_decay(mut self, decay: Decay) -> Self {
        self.decay = Some(decay);
        self
    }

    /// Check the configuration against a map of `cells` cells
    pub fn validate(&self, cells: usize) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "rounds",
                value: 0.0,
            });
        }
        if self.players == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "players",
                value: 0.0,
            });
        }
        if self.turns == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "turns",
                value: 0.0,
            });
        }
        // Exploring skips the remembered cells and this round's openings
        if cells < 2 * self.turns {
            return Err(ConfigError::MapTooSmall {
                cells,
                turns: self.turns,
            });
        }
        if let Some(decay) = self.decay {
            if !decay.tau.is_finite() || decay.tau < 1.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "decay tau",
                    value: decay.tau,
                });
            }
        }
        Ok(())
    }
}

/// Rating model of each player archetype
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingProfiles(BTreeMap<AgentType, RatingModel>);

impl RatingProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, archetype: AgentType, model: RatingModel) -> Self {
        self.0.insert(archetype, model);
        self
    }

    pub fn get(&self, archetype: AgentType) -> Result<&RatingModel, ConfigError> {
        self.0
            .get(&archetype)
            .ok_or(ConfigError::MissingProfile(archetype.key()))
    }
}

/// How the players of a game are split between archetypes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    /// Exactly these archetypes, in this order
    Explicit(Vec<AgentType>),
    /// Candidate `[defectors, neutrals, collaborators]` counts; one is
    /// picked uniformly for every game
    Numbers(Vec<[usize; 3]>),
    /// Each player is a defector, neutral or collaborator with the given
    /// probabilities
    Fractions { players: usize, fractions: [f64; 3] },
}

impl Population {
    /// Draw the archetype of every player, defectors first, then neutrals,
    /// then collaborators
    pub fn draw(&self, rng: &mut SeededRng) -> Result<Vec<AgentType>, ConfigError> {
        let counts = match self {
            Population::Explicit(archetypes) => return Ok(archetypes.clone()),
            Population::Numbers(candidates) => {
                if candidates.is_empty() {
                    return Err(ConfigError::InvalidParameter {
                        name: "population numbers",
                        value: 0.0,
                    });
                }
                let pick = rng.range_inclusive(0, candidates.len() as i32 - 1);
                candidates[pick as usize]
            }
            Population::Fractions { players, fractions } => {
                if let Some(&bad) = fractions.iter().find(|f| !f.is_finite() || **f < 0.0) {
                    return Err(ConfigError::InvalidParameter {
                        name: "population fraction",
                        value: bad,
                    });
                }
                let mut counts = [0usize; 3];
                for _ in 0..*players {
                    counts[draw_archetype_slot(rng, fractions)] += 1;
                }
                counts
            }
        };

        let mut archetypes = Vec::with_capacity(counts.iter().sum());
        for (archetype, count) in CLASSIC_ARCHETYPES.iter().zip(counts) {
            archetypes.extend(std::iter::repeat(*archetype).take(count));
        }
        Ok(archetypes)
    }
}

const CLASSIC_ARCHETYPES: [AgentType; 3] = [
    AgentType::Defector,
    AgentType::Neutral,
    AgentType::Collaborator,
];

fn draw_archetype_slot(rng: &mut SeededRng, fractions: &[f64; 3]) -> usize {
    let p = rng.next_f64();
    if p <= fractions[0] {
        0
    } else if p <= fractions[0] + fractions[1] {
        1
    } else {
        2
    }
}

/// Everything needed to play one game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSetup {
    pub game: GameConfig,
    pub map: Map,
    pub opening: OpeningParams,
    pub ratings: RatingProfiles,
    pub population: Population,
}

impl GameSetup {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let setup: GameSetup = serde_json::from_str(json)?;
        setup.game.validate(setup.map.cell_count())?;
        setup.opening.validate(setup.game.turns)?;
        Ok(setup)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}
