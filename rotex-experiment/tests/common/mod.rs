#![allow(dead_code)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use rotex_core::{StageId, Trial, TrialPhase, Version};
use rotex_experiment::{
    ExperimentConfig, ExperimentStatus, ExperimentSummary, Presenter, StageConfig,
    StageController, StageStats, TrialGenerator,
};
use rotex_timing::{Clock, VirtualClock};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Phase { trial: usize, phase: TrialPhase },
    Feedback { correct: bool, response_time_ms: u64 },
    Progress { current: usize, total: usize },
    StageStart { stage: StageId, total: usize },
    StageSummary { stage: StageId, stats: StageStats },
    RunningStats { stage: StageId, stats: StageStats },
    ExperimentSummary(ExperimentSummary),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub events: Vec<Event>,
}

impl RecordingPresenter {
    pub fn running_stats(&self) -> Vec<&StageStats> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::RunningStats { stats, .. } => Some(stats),
                _ => None,
            })
            .collect()
    }

    pub fn phases_of(&self, trial: usize) -> Vec<TrialPhase> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Phase { trial: t, phase } if *t == trial => Some(*phase),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render_phase(&mut self, phase: TrialPhase, trial: &Trial) {
        self.events.push(Event::Phase {
            trial: trial.number,
            phase,
        });
    }

    fn render_feedback(&mut self, correct: bool, response_time_ms: u64) {
        self.events.push(Event::Feedback {
            correct,
            response_time_ms,
        });
    }

    fn render_progress(&mut self, current: usize, total: usize) {
        self.events.push(Event::Progress { current, total });
    }

    fn render_stage_summary(&mut self, stage: StageId, stats: &StageStats) {
        self.events.push(Event::StageSummary {
            stage,
            stats: stats.clone(),
        });
    }

    fn render_running_stats(&mut self, stage: StageId, stats: &StageStats) {
        self.events.push(Event::RunningStats {
            stage,
            stats: stats.clone(),
        });
    }

    fn render_stage_start(&mut self, stage: StageId, _name: &str, total: usize) {
        self.events.push(Event::StageStart { stage, total });
    }

    fn render_experiment_summary(&mut self, summary: &ExperimentSummary) {
        self.events.push(Event::ExperimentSummary(summary.clone()));
    }
}

pub type Controller = StageController<VirtualClock, StdRng, RecordingPresenter>;

pub struct Rig {
    pub clock: VirtualClock,
    pub ctl: Controller,
}

impl Rig {
    pub fn new(config: ExperimentConfig, seed: u64) -> Self {
        let clock = VirtualClock::new();
        let ctl = StageController::new(
            config,
            clock.clone(),
            StdRng::seed_from_u64(seed),
            RecordingPresenter::default(),
        );
        Self { clock, ctl }
    }

    /// Builds a rig whose practice stage starts with a trial matching
    /// `wanted`, by searching for a seed.
    pub fn with_first_trial(config: ExperimentConfig, wanted: impl Fn(&Trial) -> bool) -> Self {
        let generator = TrialGenerator::new(&config.characters, &config.angles);
        let seed = (0..1024)
            .find(|&seed| {
                generator
                    .generate(
                        StageId::Practice,
                        config.stage(StageId::Practice),
                        &mut StdRng::seed_from_u64(seed),
                    )
                    .ok()
                    .and_then(|trials| trials.first().map(&wanted))
                    .unwrap_or(false)
            })
            .expect("no seed produces the wanted first trial");
        Self::new(config, seed)
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Moves the clock forward by `ms`, firing every timer on the way at
    /// its own deadline.
    pub fn advance(&mut self, ms: u64) {
        let target = self.clock.now() + ms;
        while let Some(deadline) = self.ctl.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.set(deadline);
            self.ctl.poll();
        }
        self.clock.set(target);
        self.ctl.poll();
    }

    /// Fires timers until the controller shows `phase`.
    pub fn run_until_phase(&mut self, phase: TrialPhase) {
        for _ in 0..64 {
            if self.ctl.current_phase() == Some(phase) {
                return;
            }
            let deadline = self
                .ctl
                .next_deadline()
                .expect("schedule ran dry before reaching phase");
            self.clock.set(deadline);
            self.ctl.poll();
        }
        panic!("phase {phase} never reached");
    }

    pub fn presenter(&self) -> &RecordingPresenter {
        self.ctl.presenter()
    }

    pub fn status(&self) -> ExperimentStatus {
        self.ctl.status()
    }
}

/// A config whose practice stage is one trial per listed condition, drawn
/// from a single character and angle.
pub fn single_trial_config(condition: &str, character: char, angle: u16) -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.characters = vec![character];
    config.angles = vec![angle];
    config.stages.practice = StageConfig::new("Practice", 1, &[condition], Some(1));
    config
}

pub fn key_for(config: &ExperimentConfig, version: Version) -> String {
    match version {
        Version::Normal => config.keys.normal.clone(),
        Version::Mirror => config.keys.mirror.clone(),
    }
}
