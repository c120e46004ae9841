//! Experimental conditions.
//!
//! A condition decides which prior information precedes the test stimulus.
//! Condition tokens are parsed once, when a stage's trial list is built;
//! nothing downstream looks at the raw token again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Condition {
    /// No prior information.
    N,
    /// Identity only: the upright character.
    I,
    /// Orientation only: an arrow at the trial's angle.
    O,
    /// Identity, then orientation. `orientation_ms` overrides the fixed
    /// orientation-cue duration when present.
    B { orientation_ms: Option<u64> },
    /// Complete rotated template, followed by a blank field.
    C,
}

impl Condition {
    /// Compound label used in records and exports, e.g. `B-1000`.
    pub fn label(&self) -> String {
        match self {
            Condition::B {
                orientation_ms: Some(ms),
            } => format!("B-{ms}"),
            other => other.tag().to_string(),
        }
    }

    /// Single-letter condition tag without any duration suffix.
    pub fn tag(&self) -> char {
        match self {
            Condition::N => 'N',
            Condition::I => 'I',
            Condition::O => 'O',
            Condition::B { .. } => 'B',
            Condition::C => 'C',
        }
    }
}

impl FromStr for Condition {
    type Err = ConfigError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        match token {
            "N" => return Ok(Condition::N),
            "I" => return Ok(Condition::I),
            "O" => return Ok(Condition::O),
            "C" => return Ok(Condition::C),
            "B" => return Ok(Condition::B { orientation_ms: None }),
            _ => {}
        }

        let Some(suffix) = token.strip_prefix("B-") else {
            return Err(ConfigError::UnknownCondition(token.to_string()));
        };
        match suffix.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Condition::B {
                orientation_ms: Some(ms),
            }),
            _ => Err(ConfigError::MalformedDuration(token.to_string())),
        }
    }
}

impl TryFrom<String> for Condition {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.label()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
