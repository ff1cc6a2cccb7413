//! Game execution
//!
//! `run_game` plays one complete game from a [`GameSetup`]; `run_batch`
//! plays independent games in parallel. Game `i` of a batch always draws
//! from `SeededRng::new(seed, i)`, so any game can be replayed on its own.

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::GameSetup;
use crate::error::{ConfigError, Error};
use crate::game::{Game, PlayerId};
use crate::player::{AgentType, Player};
use crate::random::SeededRng;
use crate::rating::RatingStrategy;

/// State of the game at the end of a round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub round: usize,
    pub instantaneous_openings: Vec<f64>,
    pub instantaneous_ratings: Vec<f64>,
    pub openings: Vec<f64>,
    pub ratings: Vec<f64>,
    pub signal: Vec<f64>,
    /// Cumulative score of every player
    pub scores: Vec<i64>,
    /// Distinct cells found so far by every player
    pub found_cells: Vec<usize>,
}

/// What one player did over a whole game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub id: PlayerId,
    pub archetype: AgentType,
    pub score: i64,
    /// [slot][round]
    pub replay_counts: Vec<Vec<u32>>,
    /// [slot][round]
    pub remembered_values: Vec<Vec<i32>>,
    pub found_cells: Vec<bool>,
}

/// Result of a complete game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub rounds: Vec<RoundSnapshot>,
    pub players: Vec<PlayerReport>,
}

impl GameResult {
    pub fn scores(&self) -> Vec<i64> {
        self.players.iter().map(|p| p.score).collect()
    }
}

/// Play one game
///
/// # Arguments
/// * `setup` - Game shape, map, strategies and population
/// * `seed` - 32-byte batch seed
/// * `game_index` - Index of this game in its batch
pub fn run_game(setup: &GameSetup, seed: &[u8; 32], game_index: u32) -> Result<GameResult, Error> {
    let mut rng = SeededRng::new(seed, game_index);
    let mut game = Game::new(setup.game.clone(), setup.map.clone())?;

    let archetypes = setup.population.draw(&mut rng)?;
    if archetypes.len() != game.player_count() {
        return Err(ConfigError::PopulationSize {
            expected: game.player_count(),
            found: archetypes.len(),
        }
        .into());
    }

    let mut players = Vec::with_capacity(archetypes.len());
    for archetype in archetypes {
        let rating = RatingStrategy::new(setup.ratings.get(archetype)?.clone());
        players.push(Player::new(&mut game, setup.opening.clone(), rating, archetype)?);
    }

    let mut rounds = Vec::with_capacity(game.rounds());
    while !game.is_finished() {
        let round = game.current_round();
        for player in players.iter_mut() {
            player.play_round(&mut game, &mut rng)?;
        }
        rounds.push(snapshot(round, &game, &players));
    }

    let players = players
        .iter()
        .map(|player| {
            Ok(PlayerReport {
                id: player.id(),
                archetype: player.archetype(),
                score: game.score(player.id())?,
                replay_counts: player.replay_counts().to_vec(),
                remembered_values: player.remembered_values().to_vec(),
                found_cells: player.found_cells().to_vec(),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    debug!("game {} finished after {} rounds", game_index, rounds.len());
    Ok(GameResult { rounds, players })
}

fn snapshot(round: usize, game: &Game, players: &[Player]) -> RoundSnapshot {
    RoundSnapshot {
        round,
        instantaneous_openings: game.instantaneous_openings_distribution().to_vec(),
        instantaneous_ratings: game.instantaneous_ratings_distribution().to_vec(),
        openings: game.openings_distribution().to_vec(),
        ratings: game.ratings_distribution().to_vec(),
        signal: game.signal().to_vec(),
        scores: game.scores(),
        found_cells: players.iter().map(Player::found_count).collect(),
    }
}

/// Play `games` independent games in parallel, results in game order
pub fn run_batch(setup: &GameSetup, seed: &[u8; 32], games: u32) -> Vec<Result<GameResult, Error>> {
    info!(
        "running {} games of {} rounds with {} players",
        games, setup.game.rounds, setup.game.players
    );

    let results: Vec<_> = (0..games)
        .into_par_iter()
        .map(|game_index| {
            let result = run_game(setup, seed, game_index);
            if let Err(err) = &result {
                warn!("game {} failed: {}", game_index, err);
            }
            result
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!("batch done: {} games, {} failed", games, failed);
    results
}
