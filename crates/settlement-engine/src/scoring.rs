//! Scoring rule evaluation
//!
//! Maps one (guess, final result) pair to a point value and outcome tag.
//! Pure: the only inputs are the guess, the fixture and the rule table.

use serde::{Deserialize, Serialize};
use crate::error::{EngineError, Result};
use crate::model::{Answer, Fixture, Guess, OutcomeTag, Prediction, ResultCategory};
use crate::rules::ScoringTable;

/// Points and tag for one prediction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub points: u32,
    pub tag: OutcomeTag,
}

/// Score a raw guess against a final result.
///
/// Returns `None` when the guess is incomplete or of the wrong kind for the
/// answer; callers turn that into `InvalidPrediction`.
pub fn score(guess: &Guess, actual: &Answer, table: &ScoringTable) -> Option<Evaluation> {
    let tag = match (guess, actual) {
        (Guess::Score { home: Some(h), away: Some(a) }, Answer::Score { home, away }) => {
            if h == home && a == away {
                OutcomeTag::Exact
            } else if ResultCategory::of(*h, *a) == ResultCategory::of(*home, *away) {
                OutcomeTag::CorrectOutcome
            } else {
                OutcomeTag::Wrong
            }
        }
        (Guess::Choice(Some(selected)), Answer::Choice(correct)) => {
            // No partial credit on questions
            if selected == correct {
                return Some(Evaluation { points: table.choice, tag: OutcomeTag::Exact });
            }
            OutcomeTag::Wrong
        }
        _ => return None,
    };

    let points = match tag {
        OutcomeTag::Exact => table.exact,
        OutcomeTag::CorrectOutcome => table.correct_outcome,
        OutcomeTag::Wrong => 0,
    };
    Some(Evaluation { points, tag })
}

fn check_shape(prediction: &Prediction) -> Result<()> {
    let reason = match prediction.guess {
        Guess::Score { home: None, .. } => "missing home score",
        Guess::Score { away: None, .. } => "missing away score",
        Guess::Choice(None) => "no option selected",
        _ => return Ok(()),
    };
    Err(EngineError::InvalidPrediction {
        fixture: prediction.fixture,
        entry: prediction.entry,
        reason,
    })
}

/// Evaluate one prediction against its fixture.
///
/// # Errors
/// * `InvalidConfig` - score tiers out of order
/// * `FixtureMismatch` - prediction targets another fixture
/// * `InvalidPrediction` - guess incomplete or wrong kind for the fixture
/// * `FixtureNotFinished` - no final result yet
pub fn evaluate(
    prediction: &Prediction,
    fixture: &Fixture,
    table: &ScoringTable,
) -> Result<Evaluation> {
    table.validate()?;
    if prediction.fixture != fixture.id {
        return Err(EngineError::FixtureMismatch {
            expected: fixture.id,
            found: prediction.fixture,
        });
    }
    check_shape(prediction)?;

    let actual = fixture
        .final_result()
        .ok_or(EngineError::FixtureNotFinished { fixture: fixture.id })?;

    score(&prediction.guess, &actual, table).ok_or(EngineError::InvalidPrediction {
        fixture: prediction.fixture,
        entry: prediction.entry,
        reason: "guess kind does not match fixture",
    })
}

/// Re-score every prediction tied to `fixture`, overwriting previous points.
///
/// Safe to run again after an admin corrects a result. Predictions for other
/// fixtures are left untouched. If any guess is invalid nothing is written.
///
/// # Returns
/// Number of predictions updated
pub fn rescore_fixture(
    predictions: &mut [Prediction],
    fixture: &Fixture,
    table: &ScoringTable,
) -> Result<usize> {
    table.validate()?;
    let evaluations = predictions
        .iter()
        .filter(|p| p.fixture == fixture.id)
        .map(|p| evaluate(p, fixture, table))
        .collect::<Result<Vec<_>>>()?;

    let updated = evaluations.len();
    let targets = predictions.iter_mut().filter(|p| p.fixture == fixture.id);
    for (prediction, eval) in targets.zip(evaluations) {
        prediction.points = eval.points;
        prediction.tag = Some(eval.tag);
    }

    tracing::debug!(fixture = fixture.id, updated, "rescored fixture");
    Ok(updated)
}
