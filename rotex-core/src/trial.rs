use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Condition, StageId, Version};

/// Response latencies are never recorded below this value.
pub const MIN_RESPONSE_TIME_MS: u64 = 50;

/// A participant's answer to a stimulus.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Normal,
    Mirror,
    Timeout,
}

impl Response {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Response::Timeout)
    }

    /// True when the response names the version that was shown.
    pub fn matches(&self, version: Version) -> bool {
        match self {
            Response::Normal => version == Version::Normal,
            Response::Mirror => version == Version::Mirror,
            Response::Timeout => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Normal => "normal",
            Response::Mirror => "mirror",
            Response::Timeout => "timeout",
        }
    }
}

impl From<Version> for Response {
    fn from(version: Version) -> Self {
        match version {
            Version::Normal => Response::Normal,
            Version::Mirror => Response::Mirror,
        }
    }
}

/// Outcome fields of a trial, written once when it resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub response: Response,
    pub response_time_ms: u64,
    pub correct: bool,
    pub completed_at: DateTime<Utc>,
}

impl TrialOutcome {
    /// Builds an outcome for `version`, flooring the latency at
    /// [`MIN_RESPONSE_TIME_MS`].
    pub fn new(
        response: Response,
        version: Version,
        latency_ms: u64,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            response,
            response_time_ms: latency_ms.max(MIN_RESPONSE_TIME_MS),
            correct: response.matches(version),
            completed_at,
        }
    }
}

/// One generated trial. Request fields are fixed at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// 1-based position within its stage.
    pub number: usize,
    pub stage: StageId,
    pub character: char,
    pub angle: u16,
    pub version: Version,
    pub condition: Condition,
    outcome: Option<TrialOutcome>,
}

impl Trial {
    pub fn new(
        number: usize,
        stage: StageId,
        character: char,
        angle: u16,
        version: Version,
        condition: Condition,
    ) -> Self {
        Self {
            number,
            stage,
            character,
            angle,
            version,
            condition,
            outcome: None,
        }
    }

    pub fn outcome(&self) -> Option<&TrialOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Stores the outcome. Returns `false` and leaves the trial untouched
    /// if it was already resolved.
    pub fn resolve(&mut self, outcome: TrialOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    /// Orientation cue duration for condition `B`, if the condition
    /// carries one.
    pub fn orientation_ms(&self) -> Option<u64> {
        match self.condition {
            Condition::B { orientation_ms } => orientation_ms,
            _ => None,
        }
    }
}

/// Flattened log entry for a resolved trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: usize,
    pub stage: StageId,
    pub character: char,
    pub angle: u16,
    pub version: Version,
    pub condition: Condition,
    pub response: Response,
    pub correct: bool,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl TrialRecord {
    /// Returns `None` for a trial that has not resolved yet.
    pub fn from_trial(trial: &Trial) -> Option<Self> {
        let outcome = trial.outcome()?;
        Some(Self {
            trial: trial.number,
            stage: trial.stage,
            character: trial.character,
            angle: trial.angle,
            version: trial.version,
            condition: trial.condition,
            response: outcome.response,
            correct: outcome.correct,
            response_time_ms: outcome.response_time_ms,
            timestamp: outcome.completed_at,
        })
    }

    pub fn is_timeout(&self) -> bool {
        self.response.is_timeout()
    }
}
