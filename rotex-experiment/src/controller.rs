use chrono::Utc;
use rand::Rng;
use rotex_core::{ConfigError, StageId, Trial, TrialPhase, TrialRecord};
use rotex_timing::{Clock, EventQueue, TimerId};
use tracing::{info, trace, warn};

use crate::config::ExperimentConfig;
use crate::generator::TrialGenerator;
use crate::presenter::Presenter;
use crate::session::Session;
use crate::state::{TrialContext, TrialStateMachine, TrialStep, Wakeup};
use crate::stats::{ExperimentSummary, Scope, summarize};

#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum ExperimentStatus {
    /// No session; waiting for `start`.
    Idle,
    /// A stage's trial list is loaded; its first trial is pending.
    Settling,
    Running,
    Paused,
    /// A stage finished; the participant decides whether to go on.
    AwaitingContinuation { next: StageId },
    /// The last stage finished. The session is kept for export.
    Complete,
    /// The run was abandoned and its session discarded.
    Terminated,
}

/// Sequences the stages and owns the session, the schedule and the
/// presenter.
pub struct StageController<C, R, P>
where
    C: Clock,
    R: Rng,
    P: Presenter,
{
    config: ExperimentConfig,
    clock: C,
    rng: R,
    presenter: P,
    queue: EventQueue<Wakeup>,
    machine: TrialStateMachine,
    session: Option<Session>,
    settle: Option<TimerId>,
    status: ExperimentStatus,
    paused_from: Option<ExperimentStatus>,
}

impl<C, R, P> StageController<C, R, P>
where
    C: Clock,
    R: Rng,
    P: Presenter,
{
    pub fn new(config: ExperimentConfig, clock: C, rng: R, presenter: P) -> Self {
        Self {
            config,
            clock,
            rng,
            presenter,
            queue: EventQueue::new(),
            machine: TrialStateMachine::new(),
            session: None,
            settle: None,
            status: ExperimentStatus::Idle,
            paused_from: None,
        }
    }

    /// Starts a fresh run at the practice stage, discarding any previous
    /// session.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        self.config.validate()?;
        self.teardown();
        self.session = Some(Session::new(Utc::now(), self.clock.now()));
        info!("experiment started");
        self.begin_stage(StageId::Practice)
    }

    /// Fires every timer due at the clock's current time.
    pub fn poll(&mut self) -> ExperimentStatus {
        let now = self.clock.now();
        while let Some((id, wake)) = self.queue.pop_due(now) {
            match wake {
                Wakeup::Settle => self.on_settle(id),
                Wakeup::Phase(slot) => {
                    let step = self.with_trial(|machine, cx| machine.on_timer(id, slot, cx));
                    if step == Some(TrialStep::StageExhausted) {
                        self.finish_stage();
                    }
                }
            }
        }
        self.status
    }

    /// Clock reading at which the next timer fires.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.queue.next_deadline()
    }

    /// Maps a raw key through the key bindings and offers it as a response.
    /// Returns `true` if it was recorded.
    pub fn on_key(&mut self, raw: &str) -> bool {
        let Some(version) = self.config.keys.map(raw) else {
            trace!(key = raw, "unmapped key ignored");
            return false;
        };
        if self.status != ExperimentStatus::Running {
            return false;
        }
        self.with_trial(|machine, cx| machine.on_response(version, cx))
            .unwrap_or(false)
    }

    pub fn pause(&mut self) -> bool {
        let from = self.status;
        if !matches!(from, ExperimentStatus::Running | ExperimentStatus::Settling) {
            return false;
        }
        self.machine.suspend(&mut self.queue);
        self.cancel_settle();
        if let Some(session) = self.session.as_mut() {
            session.paused = true;
        }
        self.paused_from = Some(from);
        self.status = ExperimentStatus::Paused;
        info!(phase = ?self.machine.phase(), "paused");
        true
    }

    /// Resumes a paused run. A paused trial starts over at fixation.
    pub fn resume(&mut self) -> bool {
        if self.status != ExperimentStatus::Paused {
            return false;
        }
        if let Some(session) = self.session.as_mut() {
            session.paused = false;
        }
        info!("resumed");
        match self.paused_from.take() {
            Some(ExperimentStatus::Settling) => {
                self.status = ExperimentStatus::Settling;
                self.arm_settle();
            }
            _ => {
                self.status = ExperimentStatus::Running;
                let step = self.with_trial(|machine, cx| machine.restart_current(cx));
                if step == Some(TrialStep::StageExhausted) {
                    self.finish_stage();
                }
            }
        }
        true
    }

    /// Answers the inter-stage prompt. Declining ends the run.
    pub fn confirm_next_stage(&mut self, proceed: bool) -> Result<bool, ConfigError> {
        let ExperimentStatus::AwaitingContinuation { next } = self.status else {
            return Ok(false);
        };
        if !proceed {
            self.quit();
            return Ok(false);
        }
        self.begin_stage(next)?;
        Ok(true)
    }

    /// Abandons the run and discards the session.
    pub fn quit(&mut self) {
        self.teardown();
        self.status = ExperimentStatus::Terminated;
        info!("experiment quit");
    }

    /// Discards the session and returns to `Idle`.
    pub fn restart(&mut self) {
        self.teardown();
        self.status = ExperimentStatus::Idle;
        info!("experiment reset");
    }

    pub fn status(&self) -> ExperimentStatus {
        self.status
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn records(&self) -> &[TrialRecord] {
        self.session
            .as_ref()
            .map(|s| s.log.as_slice())
            .unwrap_or_default()
    }

    pub fn current_phase(&self) -> Option<TrialPhase> {
        self.machine.phase()
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        self.session.as_ref().and_then(Session::current_trial)
    }

    /// `(current, total)` trial position within the stage.
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        self.session
            .as_ref()
            .map(|s| (s.cursor, s.total_in_stage()))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    fn begin_stage(&mut self, stage: StageId) -> Result<(), ConfigError> {
        let generator = TrialGenerator::new(&self.config.characters, &self.config.angles);
        let stage_config = self.config.stage(stage);
        let trials = generator.generate(stage, stage_config, &mut self.rng)?;
        let total = trials.len();

        let Some(session) = self.session.as_mut() else {
            warn!(%stage, "no session to load stage into");
            return Ok(());
        };
        session.load_stage(stage, trials);
        session.paused = false;
        self.machine.abort(&mut self.queue);

        info!(%stage, total, "stage loaded");
        self.presenter
            .render_stage_start(stage, &stage_config.name, total);
        self.status = ExperimentStatus::Settling;
        self.arm_settle();
        Ok(())
    }

    fn arm_settle(&mut self) {
        self.cancel_settle();
        let deadline = self
            .clock
            .now()
            .saturating_add(self.config.timing.stage_settle_ms);
        self.settle = Some(self.queue.schedule(deadline, Wakeup::Settle));
    }

    fn cancel_settle(&mut self) {
        if let Some(id) = self.settle.take() {
            self.queue.cancel(id);
        }
    }

    fn on_settle(&mut self, id: TimerId) {
        if self.settle != Some(id) || self.status != ExperimentStatus::Settling {
            trace!("stale settle timer ignored");
            return;
        }
        self.settle = None;
        if let Some(session) = self.session.as_mut() {
            session.running = true;
        }
        self.status = ExperimentStatus::Running;
        let step = self.with_trial(|machine, cx| machine.start_next(cx));
        if step == Some(TrialStep::StageExhausted) {
            self.finish_stage();
        }
    }

    fn finish_stage(&mut self) {
        self.machine.abort(&mut self.queue);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.running = false;
        session.lock.release();

        let stage = session.stage;
        let stats = summarize(&session.log, Scope::Stage(stage));
        info!(
            %stage,
            accuracy_pct = stats.accuracy_pct,
            mean_rt_ms = stats.mean_rt_ms,
            "stage finished"
        );
        self.presenter.render_stage_summary(stage, &stats);

        match stage.next() {
            Some(next) => self.status = ExperimentStatus::AwaitingContinuation { next },
            None => {
                let elapsed = self.clock.elapsed(session.started_ms);
                let summary = ExperimentSummary::from_log(&session.log, elapsed.as_secs());
                info!(
                    trials = summary.overall.total,
                    accuracy_pct = summary.overall.accuracy_pct,
                    "experiment complete"
                );
                self.presenter.render_experiment_summary(&summary);
                self.status = ExperimentStatus::Complete;
            }
        }
    }

    /// Cancels everything scheduled and drops the session.
    fn teardown(&mut self) {
        self.machine.abort(&mut self.queue);
        self.cancel_settle();
        self.queue.clear();
        self.session = None;
        self.paused_from = None;
    }

    fn with_trial<T>(
        &mut self,
        f: impl FnOnce(&mut TrialStateMachine, &mut TrialContext<'_, C, P>) -> T,
    ) -> Option<T> {
        let session = self.session.as_mut()?;
        let mut cx = TrialContext {
            timing: &self.config.timing,
            clock: &self.clock,
            queue: &mut self.queue,
            session,
            presenter: &mut self.presenter,
        };
        Some(f(&mut self.machine, &mut cx))
    }
}
