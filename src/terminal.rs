//! Text rendering of the experiment for a terminal session.

use rotex_core::{PhaseDisplay, StageId, StimulusPose, Trial, TrialPhase};
use rotex_experiment::{ExperimentSummary, KeyBindings, Presenter, StageStats};
use tracing::debug;

use crate::output::print_summary;

/// Glyph-space origin of the stimulus on a notional 800×600 canvas.
const CANVAS_CENTRE: (f32, f32) = (400.0, 300.0);

pub struct TerminalPresenter {
    keys: KeyBindings,
}

impl TerminalPresenter {
    pub fn new(keys: KeyBindings) -> Self {
        Self { keys }
    }

    pub fn print_instructions(&self) {
        println!("=== MENTAL ROTATION ===");
        println!("A rotated character will appear. Decide whether it is normal or mirrored.");
        println!(
            "  {} + Enter: normal    {} + Enter: mirrored",
            self.keys.normal, self.keys.mirror
        );
        println!("  p: pause    r: resume    q: quit    s: start over");
        println!("Press Enter to begin.");
    }

    fn describe(pose: &StimulusPose) -> String {
        let version = if pose.mirrored { "mirrored" } else { "normal" };
        format!("'{}' rotated {}° ({version})", pose.character, pose.angle)
    }

    fn trace_pose(pose: &StimulusPose) {
        let t = pose.transform(CANVAS_CENTRE.0, CANVAS_CENTRE.1);
        debug!(
            sx = t.sx,
            kx = t.kx,
            ky = t.ky,
            sy = t.sy,
            tx = t.tx,
            ty = t.ty,
            "stimulus transform"
        );
    }
}

impl Presenter for TerminalPresenter {
    fn render_phase(&mut self, phase: TrialPhase, trial: &Trial) {
        match phase.display(trial) {
            PhaseDisplay::Fixation => println!("        +"),
            PhaseDisplay::Identity(pose) => println!("  next character: '{}'", pose.character),
            PhaseDisplay::Orientation { angle } => println!("  next orientation: {angle}°"),
            PhaseDisplay::Combined(pose) => println!("  template: {}", Self::describe(&pose)),
            PhaseDisplay::Blank => println!(),
            PhaseDisplay::Stimulus(pose) => {
                Self::trace_pose(&pose);
                println!(
                    ">>  {}   [{} / {}]",
                    Self::describe(&pose),
                    self.keys.normal,
                    self.keys.mirror
                );
            }
            // the verdict comes through render_feedback
            PhaseDisplay::Feedback => {}
        }
    }

    fn render_feedback(&mut self, correct: bool, response_time_ms: u64) {
        if correct {
            println!("  correct ({response_time_ms} ms)");
        } else {
            println!("  incorrect");
        }
    }

    fn render_progress(&mut self, current: usize, total: usize) {
        println!("-- trial {current}/{total}");
    }

    fn render_stage_summary(&mut self, stage: StageId, stats: &StageStats) {
        println!(
            "== {stage} finished: {}/{} correct ({}%), mean RT {} ms",
            stats.correct, stats.total, stats.accuracy_pct, stats.mean_rt_ms
        );
        if stage.next().is_some() {
            println!("Continue to the next stage? [y/n]");
        }
    }

    fn render_running_stats(&mut self, _stage: StageId, stats: &StageStats) {
        println!(
            "  stage so far: {}% correct, mean RT {} ms",
            stats.accuracy_pct, stats.mean_rt_ms
        );
    }

    fn render_stage_start(&mut self, stage: StageId, name: &str, total: usize) {
        println!("== {name} ({stage}): {total} trials");
    }

    fn render_experiment_summary(&mut self, summary: &ExperimentSummary) {
        print_summary(summary);
    }
}
