//! Per-trial state machine.
//!
//! A trial runs `fixation → [cue phases] → stimulus → feedback`. Every phase
//! change happens when the timer armed on entering the previous phase
//! fires; the path is [`TrialPhase::next`], the delay
//! [`TimingConfig::duration_of`]. At most one timer per slot is pending and
//! all of them belong to the current trial.

use rotex_core::{Response, TimerSlot, TrialOutcome, TrialPhase, TrialRecord, Version};
use rotex_timing::{Clock, EventQueue, TimerId, TimerSet};
use tracing::{debug, trace};

use crate::config::TimingConfig;
use crate::presenter::Presenter;
use crate::session::Session;
use crate::stats::{Scope, summarize};

/// Payload of every scheduled wakeup.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Wakeup {
    /// A trial phase's timer.
    Phase(TimerSlot),
    /// End of the delay between entering a stage and its first trial.
    Settle,
}

/// Everything a trial transition touches besides the machine itself.
pub struct TrialContext<'a, C, P> {
    pub timing: &'a TimingConfig,
    pub clock: &'a C,
    pub queue: &'a mut EventQueue<Wakeup>,
    pub session: &'a mut Session,
    pub presenter: &'a mut P,
}

#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum TrialStep {
    /// A trial is in progress.
    Continue,
    /// The stage's trial list is used up.
    StageExhausted,
}

#[derive(Debug, Default)]
pub struct TrialStateMachine {
    phase: Option<TrialPhase>,
    timers: TimerSet<TimerSlot>,
    stimulus_onset_ms: Option<u64>,
}

impl TrialStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Option<TrialPhase> {
        self.phase
    }

    pub fn stimulus_onset_ms(&self) -> Option<u64> {
        self.stimulus_onset_ms
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Starts the next trial of the stage, or reports that there is none.
    pub fn start_next<C: Clock, P: Presenter>(
        &mut self,
        cx: &mut TrialContext<'_, C, P>,
    ) -> TrialStep {
        self.reset(cx);
        if cx.session.is_stage_exhausted() {
            return TrialStep::StageExhausted;
        }
        cx.session.cursor += 1;
        self.begin(cx);
        TrialStep::Continue
    }

    /// Runs the current trial again from fixation. A trial that already
    /// has an outcome is not re-run; the next one starts instead.
    pub fn restart_current<C: Clock, P: Presenter>(
        &mut self,
        cx: &mut TrialContext<'_, C, P>,
    ) -> TrialStep {
        let unresolved = cx
            .session
            .current_trial()
            .is_some_and(|trial| !trial.is_resolved());
        if !unresolved {
            return self.start_next(cx);
        }
        self.reset(cx);
        self.begin(cx);
        TrialStep::Continue
    }

    /// Handles a fired timer.
    pub fn on_timer<C: Clock, P: Presenter>(
        &mut self,
        id: TimerId,
        slot: TimerSlot,
        cx: &mut TrialContext<'_, C, P>,
    ) -> TrialStep {
        if !self.timers.fired(slot, id) {
            trace!(?slot, "stale timer ignored");
            return TrialStep::Continue;
        }
        if cx.session.paused || !cx.session.running {
            trace!(?slot, "timer suppressed while not running");
            return TrialStep::Continue;
        }
        let Some(phase) = self.phase else {
            return TrialStep::Continue;
        };
        if phase.slot() != slot {
            trace!(?slot, %phase, "timer does not belong to current phase");
            return TrialStep::Continue;
        }

        match phase {
            TrialPhase::Stimulus => {
                if cx.session.lock.try_acquire() {
                    self.resolve(Response::Timeout, cx);
                } else {
                    trace!("timeout lost to an earlier response");
                }
                TrialStep::Continue
            }
            TrialPhase::Feedback => self.start_next(cx),
            _ => {
                let next = cx
                    .session
                    .current_trial()
                    .and_then(|trial| phase.next(trial.condition));
                if let Some(next) = next {
                    self.enter(next, cx);
                }
                TrialStep::Continue
            }
        }
    }

    /// Handles a mapped key press. Returns `true` if it was recorded.
    pub fn on_response<C: Clock, P: Presenter>(
        &mut self,
        version: Version,
        cx: &mut TrialContext<'_, C, P>,
    ) -> bool {
        if self.phase != Some(TrialPhase::Stimulus) {
            trace!(phase = ?self.phase, "response outside stimulus phase ignored");
            return false;
        }
        if !cx.session.running || cx.session.paused {
            return false;
        }
        if !cx.session.lock.try_acquire() {
            trace!("duplicate response ignored");
            return false;
        }
        self.timers.cancel(cx.queue, TimerSlot::Response);
        self.resolve(Response::from(version), cx);
        true
    }

    /// Cancels every pending timer and keeps the current phase.
    pub fn suspend(&mut self, queue: &mut EventQueue<Wakeup>) {
        self.timers.cancel_all(queue);
    }

    /// Cancels every pending timer and forgets the trial in progress.
    pub fn abort(&mut self, queue: &mut EventQueue<Wakeup>) {
        self.timers.cancel_all(queue);
        self.phase = None;
        self.stimulus_onset_ms = None;
    }

    fn reset<C, P>(&mut self, cx: &mut TrialContext<'_, C, P>) {
        self.abort(cx.queue);
        cx.session.lock.release();
    }

    fn begin<C: Clock, P: Presenter>(&mut self, cx: &mut TrialContext<'_, C, P>) {
        cx.presenter
            .render_progress(cx.session.cursor, cx.session.total_in_stage());
        self.enter(TrialPhase::Fixation, cx);
    }

    fn enter<C: Clock, P: Presenter>(
        &mut self,
        phase: TrialPhase,
        cx: &mut TrialContext<'_, C, P>,
    ) {
        let Some(trial) = cx.session.current_trial() else {
            return;
        };
        let now = cx.clock.now();
        if phase == TrialPhase::Stimulus {
            self.stimulus_onset_ms = Some(now);
        }
        self.phase = Some(phase);
        debug!(trial = trial.number, %phase, at_ms = now, "enter phase");

        cx.presenter.render_phase(phase, trial);
        let deadline = now.saturating_add(cx.timing.duration_of(phase, trial.condition));
        self.timers
            .arm(cx.queue, phase.slot(), deadline, Wakeup::Phase(phase.slot()));
    }

    /// Writes the outcome, logs the record and shows feedback. The caller
    /// holds the response lock.
    fn resolve<C: Clock, P: Presenter>(
        &mut self,
        response: Response,
        cx: &mut TrialContext<'_, C, P>,
    ) {
        let now = cx.clock.now();
        let latency = self
            .stimulus_onset_ms
            .map_or(0, |onset| now.saturating_sub(onset));
        let completed_at = cx.session.wall_time(now);

        let Some(trial) = cx.session.current_trial_mut() else {
            return;
        };
        let outcome = TrialOutcome::new(response, trial.version, latency, completed_at);
        let (correct, response_time_ms) = (outcome.correct, outcome.response_time_ms);
        if !trial.resolve(outcome) {
            return;
        }
        let Some(record) = TrialRecord::from_trial(trial) else {
            return;
        };
        let trial_number = record.trial;
        let stage = record.stage;
        cx.session.record(record);
        debug!(
            trial = trial_number,
            response = response.as_str(),
            correct,
            response_time_ms,
            session_correct = cx.session.correct_count,
            session_rt_ms = cx.session.total_rt_ms,
            "trial resolved"
        );

        self.enter(TrialPhase::Feedback, cx);
        cx.presenter.render_feedback(correct, response_time_ms);
        let running = summarize(&cx.session.log, Scope::Stage(stage));
        cx.presenter.render_running_stats(stage, &running);
    }
}
