//! Calls from the experiment core to whatever draws it.
//!
//! Implementations must not call back into the experiment from inside these
//! methods; input goes through [`crate::StageController`]'s event methods.

use rotex_core::{StageId, Trial, TrialPhase};
use tracing::info;

use crate::stats::{ExperimentSummary, StageStats};

pub trait Presenter {
    /// Shows `phase` for `trial`. `phase.display(trial)` gives the render data.
    fn render_phase(&mut self, phase: TrialPhase, trial: &Trial);

    fn render_feedback(&mut self, correct: bool, response_time_ms: u64);

    fn render_progress(&mut self, current: usize, total: usize);

    fn render_stage_summary(&mut self, stage: StageId, stats: &StageStats);

    /// Accuracy and mean RT of the current stage so far. Sent after every
    /// recorded response, timeouts included.
    fn render_running_stats(&mut self, _stage: StageId, _stats: &StageStats) {}

    /// A stage's trial list is ready; its first trial follows the settle delay.
    fn render_stage_start(&mut self, _stage: StageId, _name: &str, _total: usize) {}

    fn render_experiment_summary(&mut self, _summary: &ExperimentSummary) {}
}

/// Presenter that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render_phase(&mut self, _phase: TrialPhase, _trial: &Trial) {}
    fn render_feedback(&mut self, _correct: bool, _response_time_ms: u64) {}
    fn render_progress(&mut self, _current: usize, _total: usize) {}
    fn render_stage_summary(&mut self, _stage: StageId, _stats: &StageStats) {}
}

/// Presenter that only emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn render_phase(&mut self, phase: TrialPhase, trial: &Trial) {
        info!(
            trial = trial.number,
            %phase,
            character = %trial.character,
            angle = trial.angle,
            version = %trial.version,
            condition = %trial.condition,
            "phase"
        );
    }

    fn render_feedback(&mut self, correct: bool, response_time_ms: u64) {
        info!(correct, response_time_ms, "feedback");
    }

    fn render_progress(&mut self, current: usize, total: usize) {
        info!(current, total, "progress");
    }

    fn render_stage_summary(&mut self, stage: StageId, stats: &StageStats) {
        info!(
            %stage,
            total = stats.total,
            accuracy_pct = stats.accuracy_pct,
            mean_rt_ms = stats.mean_rt_ms,
            "stage summary"
        );
    }

    fn render_running_stats(&mut self, stage: StageId, stats: &StageStats) {
        info!(
            %stage,
            accuracy_pct = stats.accuracy_pct,
            mean_rt_ms = stats.mean_rt_ms,
            "running stats"
        );
    }

    fn render_stage_start(&mut self, stage: StageId, name: &str, total: usize) {
        info!(%stage, name, total, "stage start");
    }

    fn render_experiment_summary(&mut self, summary: &ExperimentSummary) {
        info!(
            accuracy_pct = summary.overall.accuracy_pct,
            mean_rt_ms = summary.overall.mean_rt_ms,
            duration_secs = summary.duration_secs,
            "experiment complete"
        );
    }
}
