use std::fmt;

use serde::{Deserialize, Serialize};

/// Experiment stages, in the fixed order they run.
#[derive(
    Copy, Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    #[default]
    Practice,
    Stage1,
    Stage2,
}

impl StageId {
    pub const ALL: [StageId; 3] = [StageId::Practice, StageId::Stage1, StageId::Stage2];

    pub fn next(&self) -> Option<Self> {
        use StageId::*;
        Some(match self {
            Practice => Stage1,
            Stage1 => Stage2,
            Stage2 => return None,
        })
    }

    pub fn is_practice(&self) -> bool {
        matches!(self, StageId::Practice)
    }

    /// Stable identifier used in records and exports.
    pub fn key(&self) -> &'static str {
        match self {
            StageId::Practice => "practice",
            StageId::Stage1 => "stage1",
            StageId::Stage2 => "stage2",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
