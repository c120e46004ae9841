use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Condition, StimulusPose, Trial};

/// Phases a single trial moves through.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    Fixation,
    IdentityInfo,
    OrientationInfo,
    CombinedInfo,
    BlankField,
    Stimulus,
    Feedback,
}

/// Timer slots of one trial's schedule. Each slot holds at most one
/// pending wakeup.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    Fixation,
    Identity,
    Orientation,
    Combined,
    Blank,
    Response,
    Feedback,
}

impl TrialPhase {
    /// Phase entered when this phase's timer fires, or `None` once the
    /// trial is over.
    ///
    /// | condition | after fixation                              |
    /// |-----------|---------------------------------------------|
    /// | N         | stimulus                                    |
    /// | I         | identity, stimulus                          |
    /// | O         | orientation, stimulus                       |
    /// | B         | identity, orientation, stimulus             |
    /// | C         | combined, blank, stimulus                   |
    pub fn next(&self, condition: Condition) -> Option<TrialPhase> {
        use TrialPhase::*;
        Some(match (self, condition) {
            (Fixation, Condition::N) => Stimulus,
            (Fixation, Condition::I) => IdentityInfo,
            (Fixation, Condition::O) => OrientationInfo,
            (Fixation, Condition::B { .. }) => IdentityInfo,
            (Fixation, Condition::C) => CombinedInfo,
            (IdentityInfo, Condition::B { .. }) => OrientationInfo,
            (CombinedInfo, _) => BlankField,
            (IdentityInfo, _) | (OrientationInfo, _) | (BlankField, _) => Stimulus,
            (Stimulus, _) => Feedback,
            (Feedback, _) => return None,
        })
    }

    /// Timer slot armed while this phase is showing.
    pub fn slot(&self) -> TimerSlot {
        match self {
            TrialPhase::Fixation => TimerSlot::Fixation,
            TrialPhase::IdentityInfo => TimerSlot::Identity,
            TrialPhase::OrientationInfo => TimerSlot::Orientation,
            TrialPhase::CombinedInfo => TimerSlot::Combined,
            TrialPhase::BlankField => TimerSlot::Blank,
            TrialPhase::Stimulus => TimerSlot::Response,
            TrialPhase::Feedback => TimerSlot::Feedback,
        }
    }

    pub fn allows_input(&self) -> bool {
        matches!(self, TrialPhase::Stimulus)
    }

    /// What this phase puts on screen for `trial`.
    pub fn display(&self, trial: &Trial) -> PhaseDisplay {
        match self {
            TrialPhase::Fixation => PhaseDisplay::Fixation,
            TrialPhase::IdentityInfo => {
                PhaseDisplay::Identity(StimulusPose::upright(trial.character))
            }
            TrialPhase::OrientationInfo => PhaseDisplay::Orientation { angle: trial.angle },
            TrialPhase::CombinedInfo => PhaseDisplay::Combined(StimulusPose {
                character: trial.character,
                angle: trial.angle,
                mirrored: false,
            }),
            TrialPhase::BlankField => PhaseDisplay::Blank,
            TrialPhase::Stimulus => PhaseDisplay::Stimulus(StimulusPose::rotated(
                trial.character,
                trial.angle,
                trial.version,
            )),
            TrialPhase::Feedback => PhaseDisplay::Feedback,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrialPhase::Fixation => "fixation",
            TrialPhase::IdentityInfo => "identity_info",
            TrialPhase::OrientationInfo => "orientation_info",
            TrialPhase::CombinedInfo => "combined_info",
            TrialPhase::BlankField => "blank_field",
            TrialPhase::Stimulus => "stimulus",
            TrialPhase::Feedback => "feedback",
        }
    }
}

impl fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render data for a phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseDisplay {
    Fixation,
    /// Upright, normal character.
    Identity(StimulusPose),
    /// Arrow pointing at the trial's rotation angle.
    Orientation { angle: u16 },
    /// Normal character pre-rotated to the trial's angle.
    Combined(StimulusPose),
    Blank,
    Stimulus(StimulusPose),
    Feedback,
}
