//! Balanced, randomized trial lists.

use rand::Rng;
use rand::seq::SliceRandom;
use rotex_core::{Condition, ConfigError, StageId, Trial, Version};
use tracing::debug;

use crate::config::StageConfig;

/// One cell of a condition's combination pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Combination {
    character: char,
    angle: u16,
    version: Version,
    condition: Condition,
}

/// Builds a stage's trial list from the character × angle × version cross
/// product of each of its conditions.
#[derive(Debug, Clone)]
pub struct TrialGenerator<'a> {
    characters: &'a [char],
    angles: &'a [u16],
}

impl<'a> TrialGenerator<'a> {
    pub fn new(characters: &'a [char], angles: &'a [u16]) -> Self {
        Self { characters, angles }
    }

    /// Draws `per_condition` combinations per condition without replacement,
    /// shuffles the whole list and numbers it from 1.
    ///
    /// A condition whose pool is smaller than the requested count
    /// contributes its whole pool. The result depends only on `rng`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        stage: StageId,
        config: &StageConfig,
        rng: &mut R,
    ) -> Result<Vec<Trial>, ConfigError> {
        if self.characters.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if self.angles.is_empty() {
            return Err(ConfigError::EmptyAngles);
        }
        let conditions = config.parse_conditions(stage)?;
        let per_condition = config.per_condition();

        let mut drawn = Vec::with_capacity(per_condition * conditions.len());
        for condition in conditions {
            let mut pool = self.pool(condition);
            pool.shuffle(rng);
            pool.truncate(per_condition);
            drawn.extend(pool);
        }
        drawn.shuffle(rng);

        debug!(
            stage = %stage,
            trials = drawn.len(),
            per_condition,
            "generated trial list"
        );

        Ok(drawn
            .into_iter()
            .enumerate()
            .map(|(i, c)| Trial::new(i + 1, stage, c.character, c.angle, c.version, c.condition))
            .collect())
    }

    fn pool(&self, condition: Condition) -> Vec<Combination> {
        let mut pool =
            Vec::with_capacity(self.characters.len() * self.angles.len() * Version::BOTH.len());
        for &character in self.characters {
            for &angle in self.angles {
                for version in Version::BOTH {
                    pool.push(Combination {
                        character,
                        angle,
                        version,
                        condition,
                    });
                }
            }
        }
        pool
    }
}
