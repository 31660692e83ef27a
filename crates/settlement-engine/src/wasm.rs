//! WASM bindings for the web front end

#![cfg(feature = "wasm")]

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use crate::{
    aggregate, compute_standings, draw_bracket, evaluate, generate_matchups, owners, rank, settle,
    AccumulationTrigger, DrawRules, Entry, EntryId, EntryTotal, Fixture, GroupId, GroupMatch,
    Prediction, QualifiedTeam, RoundConfig, RoundScope, RuleSet, ScoringTable, TeamId,
};
use crate::random::fresh_seed;

fn parse<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsError> {
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid {}: {}", what, e)))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Empty slice = fresh seed; otherwise exactly 32 bytes.
fn parse_seed(seed: &[u8]) -> Result<[u8; 32], JsError> {
    if seed.is_empty() {
        return Ok(fresh_seed());
    }
    seed.try_into()
        .map_err(|_| JsError::new("Seed must be empty or exactly 32 bytes"))
}

/// Score one prediction against its fixture
///
/// # Returns
/// `{points, tag}`
#[wasm_bindgen]
pub fn evaluate_prediction(
    prediction_json: &str,
    fixture_json: &str,
    scoring_json: &str,
) -> Result<JsValue, JsError> {
    let prediction: Prediction = parse(prediction_json, "prediction")?;
    let fixture: Fixture = parse(fixture_json, "fixture")?;
    let table: ScoringTable = parse(scoring_json, "scoring table")?;

    let eval = evaluate(&prediction, &fixture, &table).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&eval)
}

/// Per-entry totals for one round, as an array sorted by entry id
#[wasm_bindgen]
pub fn entry_totals(predictions_json: &str, fixtures_json: &str, round: u32) -> Result<JsValue, JsError> {
    let predictions: Vec<Prediction> = parse(predictions_json, "predictions")?;
    let fixtures: Vec<Fixture> = parse(fixtures_json, "fixtures")?;

    let totals = aggregate(&predictions, &RoundScope::from_fixtures(round as u64, &fixtures));
    to_js(&totals.into_values().collect::<Vec<_>>())
}

/// Leaderboard with podium and secondary awards
#[wasm_bindgen]
pub fn leaderboard(totals_json: &str, entries_json: &str) -> Result<JsValue, JsError> {
    let totals: Vec<EntryTotal> = parse(totals_json, "entry totals")?;
    let entries: Vec<Entry> = parse(entries_json, "entries")?;

    let totals: std::collections::BTreeMap<EntryId, EntryTotal> =
        totals.into_iter().map(|t| (t.entry, t)).collect();
    let map = owners(&entries);
    to_js(&rank(&totals, |e| map.get(&e).copied()))
}

/// Settle a round's prize pool
///
/// `trigger_json` is one of `"None"`, `"NoWinners"`, `"OutcomeDisallowed"`.
#[wasm_bindgen]
pub fn settle_pool(
    config_json: &str,
    winners_json: &str,
    participant_count: u32,
    trigger_json: &str,
) -> Result<JsValue, JsError> {
    let config = RoundConfig::from_json(config_json).map_err(|e| JsError::new(&e.to_string()))?;
    let winners: Vec<EntryId> = parse(winners_json, "winners")?;
    let trigger: AccumulationTrigger = parse(trigger_json, "accumulation trigger")?;

    let outcome = settle(&config, &winners, participant_count, trigger)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&outcome)
}

/// Group tables from group-stage fixtures
///
/// `groups_json` maps team id to group id: `[[team, group], ...]`.
#[wasm_bindgen]
pub fn group_standings(fixtures_json: &str, groups_json: &str) -> Result<JsValue, JsError> {
    let fixtures: Vec<GroupMatch> = parse(fixtures_json, "group fixtures")?;
    let groups: Vec<(TeamId, GroupId)> = parse(groups_json, "group assignment")?;
    let groups: std::collections::BTreeMap<TeamId, GroupId> = groups.into_iter().collect();

    let tables = compute_standings(&fixtures, |t| groups.get(&t).copied());
    to_js(&tables.into_values().collect::<Vec<_>>())
}

/// Knockout draw straight from group-stage fixtures
///
/// Pass an empty `seed` for a fresh production draw.
#[wasm_bindgen]
pub fn knockout_draw(
    fixtures_json: &str,
    groups_json: &str,
    rules_json: &str,
    seed: &[u8],
) -> Result<JsValue, JsError> {
    let fixtures: Vec<GroupMatch> = parse(fixtures_json, "group fixtures")?;
    let groups: Vec<(TeamId, GroupId)> = parse(groups_json, "group assignment")?;
    let rules: DrawRules = parse(rules_json, "draw rules")?;
    rules.validate().map_err(|e| JsError::new(&e.to_string()))?;
    let seed = parse_seed(seed)?;

    let groups: std::collections::BTreeMap<TeamId, GroupId> = groups.into_iter().collect();
    let tables = compute_standings(&fixtures, |t| groups.get(&t).copied());
    to_js(&draw_bracket(&tables, &rules, &seed))
}

/// Draw directly from a list of qualified teams
#[wasm_bindgen]
pub fn draw_teams(qualified_json: &str, rules_json: &str, seed: &[u8]) -> Result<JsValue, JsError> {
    let qualified: Vec<QualifiedTeam> = parse(qualified_json, "qualified teams")?;
    let rules: DrawRules = parse(rules_json, "draw rules")?;
    rules.validate().map_err(|e| JsError::new(&e.to_string()))?;
    let seed = parse_seed(seed)?;

    to_js(&generate_matchups(&qualified, &rules, &seed))
}

#[derive(serde::Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate a rule set document
///
/// Returns `{valid: true}` or `{valid: false, error: "..."}`.
/// Never throws: validation errors are returned as structured data.
#[wasm_bindgen]
pub fn validate_rule_set(json: &str) -> JsValue {
    let result = match RuleSet::from_json(json) {
        Ok(_) => ValidationResult { valid: true, error: None },
        Err(e) => ValidationResult { valid: false, error: Some(e.to_string()) },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

/// Validate a round prize configuration; same shape as `validate_rule_set`.
#[wasm_bindgen]
pub fn validate_round_config(json: &str) -> JsValue {
    let result = match RoundConfig::from_json(json) {
        Ok(_) => ValidationResult { valid: true, error: None },
        Err(e) => ValidationResult { valid: false, error: Some(e.to_string()) },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}
