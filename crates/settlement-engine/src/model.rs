//! Value objects shared by every engine component

use serde::{Deserialize, Serialize};
use crate::error::{EngineError, Result};

pub type FixtureId = u64;
pub type EntryId = u64;
pub type ParticipantId = u64;
pub type RoundId = u64;
pub type TeamId = u32;
pub type GroupId = u32;

/// Final result of a fixture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    /// A match: goals for the home and away side.
    Score { home: u32, away: u32 },
    /// A quiz question: index of the correct option.
    Choice(u32),
}

/// Home win / draw / away win
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCategory {
    HomeWin,
    Draw,
    AwayWin,
}

impl ResultCategory {
    pub fn of(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            core::cmp::Ordering::Greater => ResultCategory::HomeWin,
            core::cmp::Ordering::Equal => ResultCategory::Draw,
            core::cmp::Ordering::Less => ResultCategory::AwayWin,
        }
    }
}

/// One scored event (a match or a quiz question)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    /// Expected outcome; `None` until a result is entered.
    pub result: Option<Answer>,
    pub finished: bool,
}

impl Fixture {
    pub fn pending(id: FixtureId) -> Self {
        Self { id, result: None, finished: false }
    }

    pub fn finished(id: FixtureId, result: Answer) -> Self {
        Self { id, result: Some(result), finished: true }
    }

    /// The final result, if the fixture is finished.
    pub fn final_result(&self) -> Option<Answer> {
        if self.finished {
            self.result
        } else {
            None
        }
    }
}

/// An entry's guess as submitted. Fields are optional so that malformed
/// submissions can be rejected explicitly instead of defaulting to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Guess {
    Score { home: Option<u32>, away: Option<u32> },
    Choice(Option<u32>),
}

impl Guess {
    pub fn score(home: u32, away: u32) -> Self {
        Guess::Score { home: Some(home), away: Some(away) }
    }

    pub fn choice(option: u32) -> Self {
        Guess::Choice(Some(option))
    }
}

/// Outcome tag attached to a scored prediction
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OutcomeTag {
    Wrong,
    CorrectOutcome,
    Exact,
}

/// One entry's guess for one fixture
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub fixture: FixtureId,
    pub entry: EntryId,
    pub guess: Guess,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub tag: Option<OutcomeTag>,
}

impl Prediction {
    pub fn new(fixture: FixtureId, entry: EntryId, guess: Guess) -> Self {
        Self { fixture, entry, guess, points: 0, tag: None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryStatus {
    #[default]
    Active,
    Pending,
    Cancelled,
}

/// One purchased participation slot (ticket)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub participant: ParticipantId,
    pub round: RoundId,
    /// Sequential per participant per round, starting at 1.
    pub number: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub status: EntryStatus,
}

/// Round lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundStatus {
    #[default]
    Open,
    Locked,
    Settled,
    Archived,
}

impl RoundStatus {
    fn next(self) -> Option<RoundStatus> {
        match self {
            RoundStatus::Open => Some(RoundStatus::Locked),
            RoundStatus::Locked => Some(RoundStatus::Settled),
            RoundStatus::Settled => Some(RoundStatus::Archived),
            RoundStatus::Archived => None,
        }
    }

    /// Move one step forward; any other jump is rejected.
    pub fn advance_to(&mut self, to: RoundStatus) -> Result<()> {
        if self.next() != Some(to) {
            return Err(EngineError::InvalidTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}
