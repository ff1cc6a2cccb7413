//! Game engine
//!
//! The game owns the map and the whole history of a play-through. Players
//! interact with it only through `open_cell` and `rate_cell`; every call
//! is checked against the protocol and any violation is returned as a
//! [`GameError`]. When the last player finishes the last turn of a round
//! the game advances:
//!
//! 1. per-round and cumulative distributions are recomputed,
//! 2. the shared signal (the "colors") is updated,
//! 3. the rule scores every player's round,
//! 4. turns and rating budgets are reset,
//! 5. the round counter is incremented.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{ConfigError, GameError};
use crate::map::Map;
use crate::rule::Rule;

/// Handle issued by [`Game::register_player`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One open + rate action
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub cell: usize,
    pub value: i32,
    pub rating: i32,
}

/// Per-player state reset every round, plus the running score
#[derive(Clone, Debug)]
struct PlayerState {
    turn: usize,
    pending: bool,
    budget: i32,
    score: i64,
}

#[derive(Clone, Debug)]
pub struct Game {
    config: GameConfig,
    map: Map,
    // Lifetime counts per cell
    opening_counts: Vec<u32>,
    rating_sums: Vec<i32>,
    // Decayed rating mass per cell, only used with decay
    colors: Vec<f64>,
    // Distributions
    signal: Vec<f64>,
    openings: Vec<f64>,
    ratings: Vec<f64>,
    instantaneous_openings: Vec<f64>,
    instantaneous_ratings: Vec<f64>,
    players: Vec<PlayerState>,
    /// [player][round][turn]
    history: Vec<Vec<Vec<TurnRecord>>>,
    registered: usize,
    round: usize,
}

impl Game {
    pub fn new(config: GameConfig, map: Map) -> Result<Self, ConfigError> {
        config.validate(map.cell_count())?;

        let cells = map.cell_count();
        let budget = config.rule.max_rating_per_round();
        let players = vec![
            PlayerState {
                turn: 0,
                pending: false,
                budget,
                score: 0,
            };
            config.players
        ];
        let history =
            vec![vec![vec![TurnRecord::default(); config.turns]; config.rounds]; config.players];

        Ok(Self {
            config,
            map,
            opening_counts: vec![0; cells],
            rating_sums: vec![0; cells],
            colors: vec![0.0; cells],
            signal: vec![0.0; cells],
            openings: vec![0.0; cells],
            ratings: vec![0.0; cells],
            instantaneous_openings: vec![0.0; cells],
            instantaneous_ratings: vec![0.0; cells],
            players,
            history,
            registered: 0,
            round: 0,
        })
    }

    /// Hand out the next player id. Ids start at 0 and are never reused.
    pub fn register_player(&mut self) -> Result<PlayerId, GameError> {
        if self.registered >= self.config.players {
            return Err(GameError::RosterFull {
                players: self.config.players,
            });
        }
        let id = PlayerId(self.registered);
        self.registered += 1;
        Ok(id)
    }

    /// Open a cell and return its value
    pub fn open_cell(&mut self, player: PlayerId, cell: usize) -> Result<i32, GameError> {
        let p = self.check_player(player)?;
        self.check_can_play(player)?;

        let state = &self.players[p];
        if state.pending {
            return Err(GameError::PendingOpening { player });
        }
        let value = self.map.value(cell).ok_or(GameError::InvalidCell {
            cell,
            cells: self.map.cell_count(),
        })?;
        if self.opened_this_round(p, cell) {
            return Err(GameError::CellAlreadyOpened { player, cell });
        }

        let turn = state.turn;
        self.history[p][self.round][turn] = TurnRecord {
            cell,
            value,
            rating: 0,
        };
        self.players[p].pending = true;
        Ok(value)
    }

    /// Rate the cell opened last. Finishing the last turn of the round
    /// advances the game.
    pub fn rate_cell(&mut self, player: PlayerId, rating: i32) -> Result<(), GameError> {
        let p = self.check_player(player)?;
        self.check_can_play(player)?;

        let state = &self.players[p];
        if !state.pending {
            return Err(GameError::NoPendingOpening { player });
        }
        let limits = self.config.rule.limits();
        if rating < limits.min || rating > limits.max {
            return Err(GameError::InvalidRating {
                player,
                rating,
                min: limits.min,
                max: limits.max,
            });
        }
        if rating > state.budget {
            return Err(GameError::BudgetExceeded {
                player,
                rating,
                remaining: state.budget,
            });
        }

        let turn = state.turn;
        self.history[p][self.round][turn].rating = rating;
        let state = &mut self.players[p];
        state.budget -= rating;
        state.turn += 1;
        state.pending = false;

        if self.all_players_done() {
            self.advance_round();
        }
        Ok(())
    }

    fn check_player(&self, player: PlayerId) -> Result<usize, GameError> {
        if player.0 < self.registered {
            Ok(player.0)
        } else {
            Err(GameError::UnknownPlayer { player })
        }
    }

    fn check_can_play(&self, player: PlayerId) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if self.players[player.0].turn >= self.config.turns {
            return Err(GameError::TurnsExhausted {
                player,
                turns: self.config.turns,
            });
        }
        Ok(())
    }

    fn opened_this_round(&self, p: usize, cell: usize) -> bool {
        let done = self.players[p].turn;
        self.history[p][self.round][..done]
            .iter()
            .any(|record| record.cell == cell)
    }

    fn all_players_done(&self) -> bool {
        self.players
            .iter()
            .all(|state| state.turn == self.config.turns)
    }

    fn advance_round(&mut self) {
        let round_ratings = self.update_distributions();
        self.update_signal(&round_ratings);
        self.update_scores();

        let budget = self.config.rule.max_rating_per_round();
        for state in &mut self.players {
            state.turn = 0;
            state.budget = budget;
        }

        debug!(
            "round {} complete: {} rating points handed out",
            self.round,
            round_ratings.iter().sum::<i32>()
        );
        self.round += 1;
    }

    /// Fold this round's openings into the distributions and return the
    /// rating mass per cell for the round
    fn update_distributions(&mut self) -> Vec<i32> {
        let cells = self.map.cell_count();
        let mut round_openings = vec![0u32; cells];
        let mut round_ratings = vec![0i32; cells];

        for per_player in &self.history {
            for record in &per_player[self.round] {
                round_openings[record.cell] += 1;
                round_ratings[record.cell] += record.rating;
                self.opening_counts[record.cell] += 1;
                self.rating_sums[record.cell] += record.rating;
            }
        }

        self.instantaneous_openings = normalize(&round_openings);
        self.instantaneous_ratings = normalize(&round_ratings);
        self.openings = normalize(&self.opening_counts);
        self.ratings = normalize(&self.rating_sums);
        round_ratings
    }

    fn update_signal(&mut self, round_ratings: &[i32]) {
        match self.config.decay {
            None => self.signal = self.ratings.clone(),
            Some(decay) => {
                let factor = decay.factor();
                for (color, &added) in self.colors.iter_mut().zip(round_ratings) {
                    *color = *color * factor + added as f64;
                }
                self.signal = normalize(&self.colors);
            }
        }
    }

    fn update_scores(&mut self) {
        let rule = self.config.rule;
        for (state, per_player) in self.players.iter_mut().zip(&self.history) {
            let records = &per_player[self.round];
            let values: Vec<i32> = records.iter().map(|r| r.value).collect();
            let ratings: Vec<i32> = records.iter().map(|r| r.rating).collect();
            state.score += rule.score(&values, &ratings);
        }
    }

    // Accessors

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rule(&self) -> Rule {
        self.config.rule
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn values(&self) -> &[i32] {
        self.map.values()
    }

    /// Normalized shared signal players see when exploring
    pub fn signal(&self) -> &[f64] {
        &self.signal
    }

    pub fn openings_distribution(&self) -> &[f64] {
        &self.openings
    }

    pub fn instantaneous_openings_distribution(&self) -> &[f64] {
        &self.instantaneous_openings
    }

    pub fn ratings_distribution(&self) -> &[f64] {
        &self.ratings
    }

    pub fn instantaneous_ratings_distribution(&self) -> &[f64] {
        &self.instantaneous_ratings
    }

    pub fn score(&self, player: PlayerId) -> Result<i64, GameError> {
        let p = self.check_player(player)?;
        Ok(self.players[p].score)
    }

    pub fn scores(&self) -> Vec<i64> {
        self.players.iter().map(|state| state.score).collect()
    }

    pub fn remaining_budget(&self, player: PlayerId) -> Result<i32, GameError> {
        let p = self.check_player(player)?;
        Ok(self.players[p].budget)
    }

    /// Full record of a player's turns, indexed by round then turn.
    /// Rounds not played yet hold default records.
    pub fn history(&self, player: PlayerId) -> Result<&[Vec<TurnRecord>], GameError> {
        let p = self.check_player(player)?;
        Ok(&self.history[p])
    }

    pub fn rounds(&self) -> usize {
        self.config.rounds
    }

    pub fn turns(&self) -> usize {
        self.config.turns
    }

    pub fn player_count(&self) -> usize {
        self.config.players
    }

    pub fn cell_count(&self) -> usize {
        self.map.cell_count()
    }

    pub fn current_round(&self) -> usize {
        self.round
    }

    pub fn is_finished(&self) -> bool {
        self.round >= self.config.rounds
    }
}

/// L1 normalization. A vector summing to zero maps to all zeros.
pub fn normalize<T: Copy + Into<f64>>(counts: &[T]) -> Vec<f64> {
    let sum: f64 = counts.iter().map(|&c| c.into()).sum();
    if sum == 0.0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c.into() / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Decay;

    fn make_map() -> Map {
        Map::new((1..=10).map(|v| v * 10).collect()).unwrap()
    }

    fn make_game(players: usize, rounds: usize, rule: Rule) -> Game {
        Game::new(GameConfig::standard(rounds, players, rule), make_map()).unwrap()
    }

    /// Play one full turn (open + rate)
    fn turn(game: &mut Game, player: PlayerId, cell: usize, rating: i32) {
        game.open_cell(player, cell).unwrap();
        game.rate_cell(player, rating).unwrap();
    }

    fn assert_probability_vector(v: &[f64]) {
        let sum: f64 = v.iter().sum();
        assert!(v.iter().all(|x| *x >= 0.0));
        assert!((sum - 1.0).abs() < 1e-12, "sum = {}", sum);
    }

    #[test]
    fn test_player_ids_are_sequential() {
        let mut game = make_game(3, 1, Rule::value_sum());
        assert_eq!(game.register_player(), Ok(PlayerId(0)));
        assert_eq!(game.register_player(), Ok(PlayerId(1)));
        assert_eq!(game.register_player(), Ok(PlayerId(2)));
        assert_eq!(game.register_player(), Err(GameError::RosterFull { players: 3 }));
    }

    #[test]
    fn test_open_returns_value() {
        let mut game = make_game(1, 1, Rule::value_sum());
        let p = game.register_player().unwrap();
        assert_eq!(game.open_cell(p, 4), Ok(50));
    }

    #[test]
    fn test_open_twice_without_rating() {
        let mut game = make_game(1, 1, Rule::value_sum());
        let p = game.register_player().unwrap();
        game.open_cell(p, 0).unwrap();
        assert_eq!(game.open_cell(p, 1), Err(GameError::PendingOpening { player: p }));
    }

    #[test]
    fn test_rate_without_opening() {
        let mut game = make_game(1, 1, Rule::value_sum());
        let p = game.register_player().unwrap();
        assert_eq!(game.rate_cell(p, 3), Err(GameError::NoPendingOpening { player: p }));
    }

    #[test]
    fn test_invalid_cell() {
        let mut game = make_game(1, 1, Rule::value_sum());
        let p = game.register_player().unwrap();
        assert_eq!(
            game.open_cell(p, 10),
            Err(GameError::InvalidCell { cell: 10, cells: 10 })
        );
    }

    #[test]
    fn test_same_cell_twice_in_round() {
        let mut game = make_game(1, 2, Rule::value_sum());
        let p = game.register_player().unwrap();
        turn(&mut game, p, 3, 1);
        assert_eq!(
            game.open_cell(p, 3),
            Err(GameError::CellAlreadyOpened { player: p, cell: 3 })
        );

        // Allowed again in the next round
        turn(&mut game, p, 4, 1);
        turn(&mut game, p, 5, 1);
        assert_eq!(game.current_round(), 1);
        assert_eq!(game.open_cell(p, 3), Ok(40));
    }

    #[test]
    fn test_rating_bounds() {
        let mut game = make_game(1, 1, Rule::value_sum());
        let p = game.register_player().unwrap();
        game.open_cell(p, 0).unwrap();
        assert_eq!(
            game.rate_cell(p, 6),
            Err(GameError::InvalidRating { player: p, rating: 6, min: 0, max: 5 })
        );
        assert_eq!(
            game.rate_cell(p, -1),
            Err(GameError::InvalidRating { player: p, rating: -1, min: 0, max: 5 })
        );
        // The opening is still pending after a rejected rating
        assert_eq!(game.rate_cell(p, 5), Ok(()));
    }

    #[test]
    fn test_rating_budget() {
        // Rule 3 allows 8 rating points per round
        let mut game = make_game(1, 2, Rule::weighted());
        let p = game.register_player().unwrap();
        turn(&mut game, p, 0, 5);
        assert_eq!(game.remaining_budget(p), Ok(3));
        game.open_cell(p, 1).unwrap();
        assert_eq!(
            game.rate_cell(p, 4),
            Err(GameError::BudgetExceeded { player: p, rating: 4, remaining: 3 })
        );
        game.rate_cell(p, 3).unwrap();
        turn(&mut game, p, 2, 0);

        // Budget resets with the round
        assert_eq!(game.current_round(), 1);
        assert_eq!(game.remaining_budget(p), Ok(8));
    }

    #[test]
    fn test_turns_exhausted_waits_for_other_players() {
        let mut game = make_game(2, 2, Rule::value_sum());
        let a = game.register_player().unwrap();
        let _b = game.register_player().unwrap();
        turn(&mut game, a, 0, 1);
        turn(&mut game, a, 1, 1);
        turn(&mut game, a, 2, 1);

        assert_eq!(game.current_round(), 0);
        assert_eq!(
            game.open_cell(a, 3),
            Err(GameError::TurnsExhausted { player: a, turns: 3 })
        );
        assert_eq!(
            game.rate_cell(a, 1),
            Err(GameError::TurnsExhausted { player: a, turns: 3 })
        );
    }

    #[test]
    fn test_game_over() {
        let mut game = make_game(1, 1, Rule::value_sum());
        let p = game.register_player().unwrap();
        turn(&mut game, p, 0, 1);
        turn(&mut game, p, 1, 1);
        turn(&mut game, p, 2, 1);

        assert!(game.is_finished());
        assert_eq!(game.open_cell(p, 3), Err(GameError::GameOver));
        assert_eq!(game.rate_cell(p, 1), Err(GameError::GameOver));
    }

    #[test]
    fn test_unknown_player() {
        let mut game = make_game(1, 1, Rule::value_sum());
        assert_eq!(
            game.open_cell(PlayerId(5), 0),
            Err(GameError::UnknownPlayer { player: PlayerId(5) })
        );
        assert_eq!(
            game.score(PlayerId(1)),
            Err(GameError::UnknownPlayer { player: PlayerId(1) })
        );
    }

    #[test]
    fn test_seat_not_issued_yet() {
        let mut game = make_game(2, 1, Rule::value_sum());
        let a = game.register_player().unwrap();
        assert_eq!(
            game.open_cell(PlayerId(1), 0),
            Err(GameError::UnknownPlayer { player: PlayerId(1) })
        );
        assert_eq!(
            game.remaining_budget(PlayerId(1)),
            Err(GameError::UnknownPlayer { player: PlayerId(1) })
        );
        assert_eq!(game.open_cell(a, 0), Ok(10));

        let b = game.register_player().unwrap();
        assert_eq!(game.open_cell(b, 0), Ok(10));
    }

    #[test]
    fn test_distributions_before_first_round_are_zero() {
        let game = make_game(1, 1, Rule::value_sum());
        assert!(game.signal().iter().all(|x| *x == 0.0));
        assert!(game.openings_distribution().iter().all(|x| *x == 0.0));
        assert!(game.instantaneous_ratings_distribution().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_distributions_after_round() {
        let mut game = make_game(2, 2, Rule::value_sum());
        let a = game.register_player().unwrap();
        let b = game.register_player().unwrap();
        turn(&mut game, a, 0, 5);
        turn(&mut game, a, 1, 0);
        turn(&mut game, a, 2, 0);
        turn(&mut game, b, 0, 5);
        turn(&mut game, b, 3, 0);
        turn(&mut game, b, 4, 0);

        assert_probability_vector(game.openings_distribution());
        assert_probability_vector(game.instantaneous_openings_distribution());
        assert_probability_vector(game.ratings_distribution());
        assert_probability_vector(game.instantaneous_ratings_distribution());

        // Cell 0 opened twice out of six openings, and holds all ratings
        assert!((game.openings_distribution()[0] - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(game.ratings_distribution()[0], 1.0);
        // Without decay the signal is the cumulative rating distribution
        assert_eq!(game.signal(), game.ratings_distribution());

        // Second round: only ratings on cell 9
        turn(&mut game, a, 9, 1);
        turn(&mut game, a, 8, 0);
        turn(&mut game, a, 7, 0);
        turn(&mut game, b, 9, 1);
        turn(&mut game, b, 8, 0);
        turn(&mut game, b, 7, 0);

        assert_eq!(game.instantaneous_ratings_distribution()[9], 1.0);
        assert_eq!(game.instantaneous_ratings_distribution()[0], 0.0);
        // Cumulative: 10 points on cell 0, 2 on cell 9
        assert!((game.ratings_distribution()[0] - 10.0 / 12.0).abs() < 1e-12);
        assert!((game.ratings_distribution()[9] - 2.0 / 12.0).abs() < 1e-12);
        assert_eq!(game.signal(), game.ratings_distribution());
    }

    #[test]
    fn test_zero_ratings_give_zero_rating_distribution() {
        let mut game = make_game(1, 1, Rule::value_sum());
        let p = game.register_player().unwrap();
        turn(&mut game, p, 0, 0);
        turn(&mut game, p, 1, 0);
        turn(&mut game, p, 2, 0);

        assert_probability_vector(game.openings_distribution());
        assert!(game.ratings_distribution().iter().all(|x| *x == 0.0));
        assert!(game.signal().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_decayed_signal() {
        let tau = 4.0;
        let config = GameConfig::standard(2, 1, Rule::value_sum()).with_decay(Decay { tau });
        let mut game = Game::new(config, make_map()).unwrap();
        let p = game.register_player().unwrap();

        turn(&mut game, p, 0, 3);
        turn(&mut game, p, 1, 1);
        turn(&mut game, p, 2, 0);
        let prev = game.signal().to_vec();
        assert!((prev[0] - 0.75).abs() < 1e-12);
        assert!((prev[1] - 0.25).abs() < 1e-12);

        turn(&mut game, p, 1, 2);
        turn(&mut game, p, 2, 2);
        turn(&mut game, p, 3, 0);

        // Raw colors: [3, 1, 0, ...] * 0.75 + [0, 2, 2, 0, ...]
        let raw = [2.25, 2.75, 2.0];
        let total: f64 = raw.iter().sum();
        let signal = game.signal();
        for (cell, expected) in raw.iter().enumerate() {
            assert!((signal[cell] - expected / total).abs() < 1e-12);
        }
        assert_eq!(signal[3], 0.0);
        assert_probability_vector(signal);
        // The plain rating distribution does not decay
        assert!((game.ratings_distribution()[0] - 3.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_scores_accumulate() {
        let mut game = make_game(2, 2, Rule::value_sum());
        let a = game.register_player().unwrap();
        let b = game.register_player().unwrap();
        turn(&mut game, a, 0, 1);
        turn(&mut game, a, 1, 1);
        turn(&mut game, a, 2, 1);
        assert_eq!(game.score(a), Ok(0), "scores only change when the round ends");
        turn(&mut game, b, 9, 1);
        turn(&mut game, b, 8, 1);
        turn(&mut game, b, 7, 1);

        assert_eq!(game.score(a), Ok(10 + 20 + 30));
        assert_eq!(game.score(b), Ok(100 + 90 + 80));

        turn(&mut game, b, 0, 0);
        turn(&mut game, b, 1, 0);
        turn(&mut game, b, 2, 0);
        turn(&mut game, a, 9, 0);
        turn(&mut game, a, 8, 0);
        turn(&mut game, a, 7, 0);

        assert_eq!(game.scores(), vec![60 + 270, 270 + 60]);
    }

    #[test]
    fn test_history_is_kept() {
        let mut game = make_game(1, 2, Rule::value_sum());
        let p = game.register_player().unwrap();
        turn(&mut game, p, 6, 2);
        turn(&mut game, p, 1, 3);
        turn(&mut game, p, 2, 0);

        let history = game.history(p).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0][0], TurnRecord { cell: 6, value: 70, rating: 2 });
        assert_eq!(history[0][1], TurnRecord { cell: 1, value: 20, rating: 3 });
    }

    #[test]
    fn test_invalid_config() {
        assert!(Game::new(GameConfig::standard(0, 1, Rule::value_sum()), make_map()).is_err());
        assert!(Game::new(GameConfig::standard(1, 0, Rule::value_sum()), make_map()).is_err());

        let tiny = Map::new(vec![1, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            Game::new(GameConfig::standard(1, 1, Rule::value_sum()), tiny).err(),
            Some(ConfigError::MapTooSmall { cells: 5, turns: 3 })
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&[1u32, 3]), vec![0.25, 0.75]);
        assert_eq!(normalize(&[0i32, 0, 0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(normalize::<f64>(&[]), Vec::<f64>::new());
    }
}
