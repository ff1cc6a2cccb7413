//! WASM bindings for game replay in the browser

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{run_game, GameSetup, RatingModel, Rule};

fn parse_seed(seed: &[u8]) -> Result<[u8; 32], JsError> {
    seed.try_into()
        .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))
}

/// Replay one game of a batch with every round snapshot
///
/// # Arguments
/// * `setup_json` - JSON serialized GameSetup
/// * `seed` - 32-byte batch seed
/// * `game_index` - Index of the game in its batch
///
/// # Returns
/// Serialized GameResult
#[wasm_bindgen]
pub fn replay_game(setup_json: &str, seed: &[u8], game_index: u32) -> Result<JsValue, JsError> {
    let setup = GameSetup::from_json(setup_json)
        .map_err(|e| JsError::new(&format!("Invalid setup: {}", e)))?;
    let seed = parse_seed(seed)?;

    let result = run_game(&setup, &seed, game_index)
        .map_err(|e| JsError::new(&format!("Game failed: {}", e)))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct RuleInfo {
    id: u8,
    name: &'static str,
    min_rating: i32,
    max_rating: i32,
    max_rating_per_round: i32,
    description: &'static str,
}

/// Get all scoring rules with their rating limits
#[wasm_bindgen]
pub fn get_rule_types() -> Result<JsValue, JsError> {
    let rules = [
        (Rule::no_score(), "No score. Players are rated but never rewarded."),
        (Rule::value_sum(), "Sum of the values of the opened cells."),
        (Rule::weighted(), "Values weighted by the rating given to each cell."),
        (
            Rule::weighted_with_bonus(),
            "Weighted values plus a bonus for every unused rating point.",
        ),
    ];
    let types: Vec<RuleInfo> = rules
        .iter()
        .map(|&(rule, description)| RuleInfo {
            id: rule.id(),
            name: rule.name(),
            min_rating: rule.min_rating(),
            max_rating: rule.max_rating(),
            max_rating_per_round: rule.max_rating_per_round(),
            description,
        })
        .collect();

    serde_wasm_bindgen::to_value(&types)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Get the identifiers of every rating model
#[wasm_bindgen]
pub fn get_rating_models() -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(&RatingModel::NAMES)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Rating distribution a model gives a cell of the given value
#[wasm_bindgen]
pub fn get_rating_probabilities(model_json: &str, value: i32) -> Result<js_sys::Float64Array, JsError> {
    let model: RatingModel = serde_json::from_str(model_json)
        .map_err(|e| JsError::new(&format!("Invalid rating model: {}", e)))?;
    let probabilities = model
        .probabilities(value)
        .map_err(|e| JsError::new(&format!("Invalid rating model: {}", e)))?;

    Ok(js_sys::Float64Array::from(&probabilities[..]))
}

#[derive(serde::Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate a game setup
///
/// Returns `{valid: true}` or `{valid: false, error: "..."}`.
#[wasm_bindgen]
pub fn validate_setup(setup_json: &str) -> JsValue {
    let result = match GameSetup::from_json(setup_json) {
        Ok(_) => ValidationResult { valid: true, error: None },
        Err(e) => ValidationResult { valid: false, error: Some(e.to_string()) },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}
