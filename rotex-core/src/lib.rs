pub mod condition;
pub mod error;
pub mod phase;
pub mod stage;
pub mod stimulus;
pub mod trial;

pub use condition::Condition;
pub use error::ConfigError;
pub use phase::{PhaseDisplay, TimerSlot, TrialPhase};
pub use stage::StageId;
pub use stimulus::{StimulusPose, Version};
pub use trial::{Response, Trial, TrialOutcome, TrialRecord, MIN_RESPONSE_TIME_MS};
