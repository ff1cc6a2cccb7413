//! Rating Game
//!
//! Core engine of a repeated multi-player rating game. Players open cells of
//! a hidden-value map, rate what they find, and the ratings feed a shared
//! signal that steers later exploration.
//! This crate is compiled to:
//! - Native (for batch simulations)
//! - WASM (for in-browser game replay)

mod random;
mod error;
mod rule;
mod map;
mod game;
mod config;
mod opening;
mod rating;
mod player;
mod simulation;

#[cfg(feature = "wasm")]
mod wasm;

pub use random::SeededRng;
pub use error::{ConfigError, Error, GameError, SampleError};
pub use rule::{RatingLimits, Rule, UNUSED_RATING_BONUS};
pub use map::{Cell, Map};
pub use game::{normalize, Game, PlayerId, TurnRecord};
pub use config::{Decay, GameConfig, GameSetup, Population, RatingProfiles, DEFAULT_TURNS};
pub use opening::{OpeningParams, OpeningStrategy, ReplayRule};
pub use rating::{RatingModel, RatingStrategy, RATING_LEVELS};
pub use player::{AgentType, Player};
pub use simulation::{run_batch, run_game, GameResult, PlayerReport, RoundSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    const SETUP_JSON: &str = r#"{
        "game": {"rounds": 4, "players": 3, "rule": 2, "decay": {"tau": 5.0}},
        "map": {"values": [5, 15, 25, 35, 45, 55, 65, 75, 85], "side": 3},
        "opening": {
            "exploration_bias": 0.4,
            "exploration_exponent": 1.0,
            "replay": [
                {"threshold": 40.0, "slope": 1.5},
                {"threshold": 50.0, "slope": 1.5},
                {"threshold": 60.0, "slope": 1.5}
            ]
        },
        "ratings": {
            "def": {"functionType": "constant", "p0": [0.6], "p5": [0.0]},
            "neu": {"functionType": "constant", "p0": [0.2], "p5": [0.2]},
            "col": {"functionType": "mns_linear", "mns": [0.0, 1.0]}
        },
        "population": {"fractions": {"players": 3, "fractions": [0.3, 0.3, 0.4]}}
    }"#;

    #[test]
    fn test_setup_from_json_runs() {
        let setup = GameSetup::from_json(SETUP_JSON).unwrap();
        assert_eq!(setup.game.rule, Rule::value_sum());
        assert_eq!(setup.map.side(), Some(3));

        let result = run_game(&setup, &[11u8; 32], 0).unwrap();
        assert_eq!(result.rounds.len(), 4);
        assert_eq!(result.players.len(), 3);

        // Round trips through JSON unchanged
        let again = GameSetup::from_json(&setup.to_json().unwrap()).unwrap();
        assert_eq!(again, setup);
    }

    #[test]
    fn test_setup_rejects_wrong_replay_count() {
        let json = SETUP_JSON.replace(r#"{"threshold": 60.0, "slope": 1.5}"#, "")
            .replace(r#"{"threshold": 50.0, "slope": 1.5},"#, r#"{"threshold": 50.0, "slope": 1.5}"#);
        assert_eq!(
            GameSetup::from_json(&json),
            Err(ConfigError::ReplaySlots { expected: 3, found: 2 })
        );
    }
}
