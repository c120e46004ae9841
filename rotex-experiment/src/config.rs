use std::path::Path;

use rotex_core::{Condition, ConfigError, StageId, TrialPhase, Version};
use serde::{Deserialize, Serialize};

/// Per-phase durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub fixation_ms: u64,
    pub identity_info_ms: u64,
    pub orientation_info_ms: u64,
    pub combined_info_ms: u64,
    pub blank_field_ms: u64,
    pub max_response_ms: u64,
    pub feedback_ms: u64,
    /// Delay between entering a stage and its first trial.
    pub stage_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fixation_ms: 500,
            identity_info_ms: 2000,
            orientation_info_ms: 1000,
            combined_info_ms: 2000,
            blank_field_ms: 1000,
            max_response_ms: 3000,
            feedback_ms: 500,
            stage_settle_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// How long `phase` stays on screen under `condition`.
    pub fn duration_of(&self, phase: TrialPhase, condition: Condition) -> u64 {
        match phase {
            TrialPhase::Fixation => self.fixation_ms,
            TrialPhase::IdentityInfo => self.identity_info_ms,
            TrialPhase::OrientationInfo => match condition {
                Condition::B {
                    orientation_ms: Some(ms),
                } => ms,
                _ => self.orientation_info_ms,
            },
            TrialPhase::CombinedInfo => self.combined_info_ms,
            TrialPhase::BlankField => self.blank_field_ms,
            TrialPhase::Stimulus => self.max_response_ms,
            TrialPhase::Feedback => self.feedback_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub trials: usize,
    /// Raw condition tokens, e.g. `N` or `B-400`.
    pub conditions: Vec<String>,
    #[serde(default)]
    pub trials_per_condition: Option<usize>,
}

impl StageConfig {
    pub fn new(
        name: &str,
        trials: usize,
        conditions: &[&str],
        per_condition: Option<usize>,
    ) -> Self {
        Self {
            name: name.to_string(),
            trials,
            conditions: conditions.iter().map(|c| c.to_string()).collect(),
            trials_per_condition: per_condition,
        }
    }

    /// Explicit per-condition count, or the target trial count split evenly
    /// across conditions.
    pub fn per_condition(&self) -> usize {
        self.trials_per_condition
            .unwrap_or_else(|| self.trials / self.conditions.len().max(1))
    }

    pub fn parse_conditions(&self, stage: StageId) -> Result<Vec<Condition>, ConfigError> {
        if self.conditions.is_empty() {
            return Err(ConfigError::NoConditions(stage));
        }
        self.conditions.iter().map(|token| token.parse()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub practice: StageConfig,
    pub stage1: StageConfig,
    pub stage2: StageConfig,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            practice: StageConfig::new("Practice", 6, &["N"], None),
            stage1: StageConfig::new(
                "Stage 1: baseline conditions",
                40,
                &["N", "I", "O", "C", "B-1000"],
                Some(8),
            ),
            stage2: StageConfig::new(
                "Stage 2: orientation-cue duration",
                36,
                &["B-100", "B-400", "B-700", "B-1000"],
                Some(9),
            ),
        }
    }
}

impl StagesConfig {
    pub fn get(&self, stage: StageId) -> &StageConfig {
        match stage {
            StageId::Practice => &self.practice,
            StageId::Stage1 => &self.stage1,
            StageId::Stage2 => &self.stage2,
        }
    }
}

/// Keys mapped to the two responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub normal: String,
    pub mirror: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            normal: "f".to_string(),
            mirror: "j".to_string(),
        }
    }
}

impl KeyBindings {
    /// Maps a raw key to a response. Unbound keys map to `None`.
    pub fn map(&self, raw: &str) -> Option<Version> {
        let key = raw.trim();
        if key.is_empty() {
            return None;
        }
        if key.eq_ignore_ascii_case(self.normal.trim()) {
            Some(Version::Normal)
        } else if key.eq_ignore_ascii_case(self.mirror.trim()) {
            Some(Version::Mirror)
        } else {
            None
        }
    }
}

/// Everything fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub characters: Vec<char>,
    pub angles: Vec<u16>,
    pub stages: StagesConfig,
    pub timing: TimingConfig,
    pub keys: KeyBindings,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            characters: vec!['R', 'J', 'G', '2', '5', '7'],
            angles: vec![0, 60, 120, 180, 240, 300],
            stages: StagesConfig::default(),
            timing: TimingConfig::default(),
            keys: KeyBindings::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks everything generation would reject, for every stage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.characters.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if self.angles.is_empty() {
            return Err(ConfigError::EmptyAngles);
        }
        for stage in StageId::ALL {
            self.stages.get(stage).parse_conditions(stage)?;
        }
        if self.keys.normal.trim().is_empty() || self.keys.mirror.trim().is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        if self
            .keys
            .normal
            .trim()
            .eq_ignore_ascii_case(self.keys.mirror.trim())
        {
            return Err(ConfigError::KeyConflict(self.keys.normal.clone()));
        }
        Ok(())
    }

    pub fn stage(&self, stage: StageId) -> &StageConfig {
        self.stages.get(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ExperimentConfig::default().validate().unwrap();
    }

    #[test]
    fn per_condition_falls_back_to_even_split() {
        let cfg = ExperimentConfig::default();
        assert_eq!(cfg.stage(StageId::Practice).per_condition(), 6);
        assert_eq!(cfg.stage(StageId::Stage1).per_condition(), 8);

        let uneven = StageConfig::new("x", 10, &["N", "I", "O"], None);
        assert_eq!(uneven.per_condition(), 3);
    }

    #[test]
    fn b_orientation_duration_overrides_fixed_value() {
        let timing = TimingConfig::default();
        let timed = Condition::B {
            orientation_ms: Some(400),
        };
        let untimed = Condition::B { orientation_ms: None };
        assert_eq!(timing.duration_of(TrialPhase::OrientationInfo, timed), 400);
        assert_eq!(timing.duration_of(TrialPhase::OrientationInfo, untimed), 1000);
        assert_eq!(timing.duration_of(TrialPhase::OrientationInfo, Condition::O), 1000);
        assert_eq!(timing.duration_of(TrialPhase::Stimulus, Condition::N), 3000);
    }

    #[test]
    fn keys_map_case_insensitively() {
        let keys = KeyBindings::default();
        assert_eq!(keys.map("f"), Some(Version::Normal));
        assert_eq!(keys.map("J"), Some(Version::Mirror));
        assert_eq!(keys.map("k"), None);
        assert_eq!(keys.map(""), None);
    }

    #[test]
    fn blank_input_never_maps_to_a_blank_binding() {
        let keys = KeyBindings {
            normal: String::new(),
            mirror: "j".to_string(),
        };
        assert_eq!(keys.map(""), None);
        assert_eq!(keys.map("   "), None);
        assert_eq!(keys.map("j"), Some(Version::Mirror));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ExperimentConfig::from_json_str(
            r#"{ "characters": ["R"], "timing": { "max_response_ms": 1500 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.characters, vec!['R']);
        assert_eq!(cfg.timing.max_response_ms, 1500);
        assert_eq!(cfg.timing.fixation_ms, 500);
        assert_eq!(cfg.angles.len(), 6);
    }

    #[test]
    fn validate_rejects_bad_config() {
        let mut cfg = ExperimentConfig::default();
        cfg.stages.stage2.conditions.push("B-x".to_string());
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MalformedDuration(_))
        ));

        let mut cfg = ExperimentConfig::default();
        cfg.stages.stage1.conditions.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NoConditions(StageId::Stage1))
        ));

        let mut cfg = ExperimentConfig::default();
        cfg.keys.mirror = "F".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::KeyConflict(_))));

        let mut cfg = ExperimentConfig::default();
        cfg.keys.normal = "   ".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyKey)));

        let mut cfg = ExperimentConfig::default();
        cfg.angles.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyAngles)));
    }
}
