//! Players
//!
//! A player binds an opening strategy and a rating strategy to one seat of a
//! game. It holds only its [`PlayerId`]; the game is passed in on every call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::game::{Game, PlayerId};
use crate::map::Cell;
use crate::opening::{OpeningParams, OpeningStrategy};
use crate::random::SeededRng;
use crate::rating::RatingStrategy;

/// Player archetype, used to pick a rating profile
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentType {
    #[serde(rename = "def")]
    Defector,
    #[serde(rename = "neu")]
    Neutral,
    #[serde(rename = "col")]
    Collaborator,
    #[serde(rename = "opt")]
    Optimized,
}

impl AgentType {
    pub fn key(&self) -> &'static str {
        match self {
            AgentType::Defector => "def",
            AgentType::Neutral => "neu",
            AgentType::Collaborator => "col",
            AgentType::Optimized => "opt",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    id: PlayerId,
    archetype: AgentType,
    turns: usize,
    opening: OpeningStrategy,
    rating: RatingStrategy,
    /// Best cells of the last round, sorted by value, one per turn
    best_cells: Vec<Cell>,
    /// [slot][round]
    replays: Vec<Vec<u32>>,
    /// [slot][round]
    best_values: Vec<Vec<i32>>,
    found: Vec<bool>,
}

impl Player {
    /// Take the next seat of `game`
    pub fn new(
        game: &mut Game,
        opening: OpeningParams,
        rating: RatingStrategy,
        archetype: AgentType,
    ) -> Result<Self, Error> {
        let turns = game.turns();
        let rounds = game.rounds();
        opening.validate(turns)?;
        let id = game.register_player()?;

        Ok(Self {
            id,
            archetype,
            turns,
            opening: OpeningStrategy::new(opening),
            rating,
            best_cells: vec![Cell::UNKNOWN; turns],
            replays: vec![vec![0; rounds]; turns],
            best_values: vec![vec![Cell::UNKNOWN.value; rounds]; turns],
            found: vec![false; game.cell_count()],
        })
    }

    /// Play every turn of the current round
    pub fn play_round(&mut self, game: &mut Game, rng: &mut SeededRng) -> Result<(), Error> {
        let round = game.current_round();
        let mut played = Vec::with_capacity(self.turns);

        for _ in 0..self.turns {
            let cell =
                self.opening
                    .choose_cell(round, game.signal(), &self.best_cells, &played, rng)?;
            let value = game.open_cell(self.id, cell)?;
            // Never ask for more than what is left of the round budget
            let rating = self
                .rating
                .choose_rating(value, rng)?
                .min(game.remaining_budget(self.id)?);
            game.rate_cell(self.id, rating)?;

            played.push(Cell::new(cell, value));
            self.found[cell] = true;
        }

        self.count_replays(round, &played);
        self.best_cells = best_cells(&played, self.turns);
        for (slot, cell) in self.best_cells.iter().enumerate() {
            self.best_values[slot][round] = cell.value;
        }
        Ok(())
    }

    fn count_replays(&mut self, round: usize, played: &[Cell]) {
        for cell in played {
            for (slot, best) in self.best_cells.iter().enumerate() {
                if best.is_known() && best.index == cell.index {
                    self.replays[slot][round] += 1;
                }
            }
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn archetype(&self) -> AgentType {
        self.archetype
    }

    pub fn opening(&self) -> &OpeningStrategy {
        &self.opening
    }

    pub fn rating(&self) -> &RatingStrategy {
        &self.rating
    }

    pub fn remembered_cells(&self) -> &[Cell] {
        &self.best_cells
    }

    /// How often each remembered slot was replayed, [slot][round]
    pub fn replay_counts(&self) -> &[Vec<u32>] {
        &self.replays
    }

    /// Value held by each remembered slot at the end of each round,
    /// [slot][round]
    pub fn remembered_values(&self) -> &[Vec<i32>] {
        &self.best_values
    }

    /// Cells this player has ever opened
    pub fn found_cells(&self) -> &[bool] {
        &self.found
    }

    pub fn found_count(&self) -> usize {
        self.found.iter().filter(|found| **found).count()
    }
}

/// The `size` most valuable of `played`, best first, padded with unknown
/// cells. Among equal values the earlier cell ranks first.
fn best_cells(played: &[Cell], size: usize) -> Vec<Cell> {
    let mut best = vec![Cell::UNKNOWN; size];
    for &cell in played {
        if let Some(slot) = best.iter().position(|b| cell.value > b.value) {
            best.insert(slot, cell);
            best.pop();
        }
    }
    best
}
