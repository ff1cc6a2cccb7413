//! Error types for the rating game.

use thiserror::Error;

use crate::game::PlayerId;

/// Protocol violations at the game boundary.
///
/// A correct player never triggers one of these; seeing one means the
/// calling strategy is broken and the game must be abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("the game is over")]
    GameOver,

    #[error("player {player} already played {turns} turns this round")]
    TurnsExhausted { player: PlayerId, turns: usize },

    #[error("player {player} must rate the opened cell before opening another one")]
    PendingOpening { player: PlayerId },

    #[error("player {player} must open a cell before rating it")]
    NoPendingOpening { player: PlayerId },

    #[error("cell {cell} does not exist (map has {cells} cells)")]
    InvalidCell { cell: usize, cells: usize },

    #[error("player {player} already opened cell {cell} this round")]
    CellAlreadyOpened { player: PlayerId, cell: usize },

    #[error("player {player} entered an invalid rating ({rating} not in [{min}, {max}])")]
    InvalidRating {
        player: PlayerId,
        rating: i32,
        min: i32,
        max: i32,
    },

    #[error("player {player} rated {rating} but only has {remaining} ratings remaining")]
    BudgetExceeded {
        player: PlayerId,
        rating: i32,
        remaining: i32,
    },

    #[error("player {player} is not part of this game")]
    UnknownPlayer { player: PlayerId },

    #[error("all {players} player slots are already registered")]
    RosterFull { players: usize },
}

/// Invalid configuration, detected when a game or strategy is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid rule number {0}")]
    UnknownRule(u8),

    #[error("the rating model {0:?} does not exist")]
    UnknownRatingModel(String),

    #[error("{model}: {field} needs {expected} coefficients, got {found}")]
    MalformedCoefficients {
        model: &'static str,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("rating {rating} has invalid probability {probability} for value {value}")]
    InvalidProbability {
        rating: usize,
        value: i32,
        probability: f64,
    },

    #[error("the map has no cells")]
    EmptyMap,

    #[error("map of {cells} cells is not a {side}x{side} square")]
    NotSquare { side: usize, cells: usize },

    #[error("a map of {cells} cells is too small for {turns} turns per round")]
    MapTooSmall { cells: usize, turns: usize },

    #[error("expected {expected} replay rules (one per turn), got {found}")]
    ReplaySlots { expected: usize, found: usize },

    #[error("no rating profile for archetype {0}")]
    MissingProfile(&'static str),

    #[error("population has {found} players, the game expects {expected}")]
    PopulationSize { expected: usize, found: usize },

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Failures of weighted sampling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("cannot sample from an empty weight vector")]
    Empty,

    #[error("weight {weight} at index {index} is negative or not finite")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("all weights are zero")]
    ZeroTotalWeight,

    #[error("population has {population} elements but {weights} weights were given")]
    LengthMismatch { population: usize, weights: usize },
}

/// Any failure that aborts a single game.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sample(#[from] SampleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_player() {
        let err = GameError::CellAlreadyOpened {
            player: PlayerId(2),
            cell: 17,
        };
        assert_eq!(err.to_string(), "player 2 already opened cell 17 this round");

        let err = GameError::InvalidRating {
            player: PlayerId(0),
            rating: 6,
            min: 0,
            max: 5,
        };
        assert_eq!(
            err.to_string(),
            "player 0 entered an invalid rating (6 not in [0, 5])"
        );
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: Error = GameError::GameOver.into();
        assert_eq!(err, Error::Game(GameError::GameOver));
        assert_eq!(err.to_string(), "the game is over");

        let err: Error = ConfigError::UnknownRule(9).into();
        assert_eq!(err.to_string(), "invalid rule number 9");
    }

    #[test]
    fn test_parse_error_from_serde() {
        let parse = serde_json::from_str::<u8>("not json").unwrap_err();
        let err: ConfigError = parse.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
