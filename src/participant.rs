//! Simulated participant for virtual-time runs.

use rand::Rng;
use rotex_core::{Trial, Version};

/// Answers with a reaction time that grows linearly with the angular
/// disparity of the stimulus, and picks the right answer with probability
/// `accuracy`.
#[derive(Debug, Clone)]
pub struct SimulatedParticipant<R> {
    rng: R,
    accuracy: f64,
    base_rt_ms: u64,
    ms_per_degree: f64,
    jitter_ms: u64,
}

impl<R: Rng> SimulatedParticipant<R> {
    pub fn new(rng: R, accuracy: f64, base_rt_ms: u64, ms_per_degree: f64) -> Self {
        Self {
            rng,
            accuracy: accuracy.clamp(0.0, 1.0),
            base_rt_ms,
            ms_per_degree: ms_per_degree.max(0.0),
            jitter_ms: 100,
        }
    }

    pub fn with_jitter(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    /// Decides the answer to `trial` and how long it takes.
    pub fn respond(&mut self, trial: &Trial) -> (Version, u64) {
        let version = if self.rng.random_bool(self.accuracy) {
            trial.version
        } else {
            match trial.version {
                Version::Normal => Version::Mirror,
                Version::Mirror => Version::Normal,
            }
        };
        let slope = (f64::from(disparity(trial.angle)) * self.ms_per_degree).round() as u64;
        let jitter = self.rng.random_range(0..=self.jitter_ms);
        (version, self.base_rt_ms + slope + jitter)
    }
}

/// Smallest rotation separating `angle` from upright, in 0..=180.
pub fn disparity(angle: u16) -> u16 {
    let angle = angle % 360;
    angle.min(360 - angle)
}
