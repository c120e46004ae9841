//! Configuration errors.
//!
//! These are the only failures the experiment core can report. They are
//! raised while a stage's trial list is being built, never during a live
//! trial.

use thiserror::Error;

use crate::StageId;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A condition token is not one of `N`, `I`, `O`, `C`, `B` or `B-<ms>`.
    #[error("unrecognized condition tag `{0}`")]
    UnknownCondition(String),

    /// A `B-<ms>` token whose suffix is not a positive integer.
    #[error("malformed duration suffix in condition tag `{0}`")]
    MalformedDuration(String),

    #[error("stage `{0}` lists no conditions")]
    NoConditions(StageId),

    #[error("character alphabet is empty")]
    EmptyAlphabet,

    #[error("angle set is empty")]
    EmptyAngles,

    /// A response is bound to an empty or blank key.
    #[error("response key binding is empty")]
    EmptyKey,

    /// Both responses are bound to the same key.
    #[error("key `{0}` is bound to both responses")]
    KeyConflict(String),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
