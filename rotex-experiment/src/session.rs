use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use rotex_core::{StageId, Trial, TrialRecord};

/// Guard between the two writers of a trial's outcome: a key press and the
/// response timeout. Whoever sets it first records the outcome.
#[derive(Debug, Default)]
pub struct ResponseLock(AtomicBool);

impl ResponseLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lock. Returns `false` if it was already set.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// State of one run of the experiment.
#[derive(Debug)]
pub struct Session {
    pub stage: StageId,
    /// 1-based index of the current trial; 0 before the first one starts.
    pub cursor: usize,
    pub trials: Vec<Trial>,
    pub log: Vec<TrialRecord>,
    /// Correct, non-timeout responses so far.
    pub correct_count: usize,
    /// Summed latency of those responses.
    pub total_rt_ms: u64,
    pub started_at: DateTime<Utc>,
    /// Clock reading at `started_at`.
    pub started_ms: u64,
    pub running: bool,
    pub paused: bool,
    pub lock: ResponseLock,
}

impl Session {
    pub fn new(started_at: DateTime<Utc>, started_ms: u64) -> Self {
        Self {
            stage: StageId::default(),
            cursor: 0,
            trials: Vec::new(),
            log: Vec::new(),
            correct_count: 0,
            total_rt_ms: 0,
            started_at,
            started_ms,
            running: false,
            paused: false,
            lock: ResponseLock::new(),
        }
    }

    /// Replaces the trial list and rewinds the cursor.
    pub fn load_stage(&mut self, stage: StageId, trials: Vec<Trial>) {
        self.stage = stage;
        self.trials = trials;
        self.cursor = 0;
        self.running = false;
        self.lock.release();
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        let index = self.cursor.checked_sub(1)?;
        self.trials.get(index)
    }

    pub fn current_trial_mut(&mut self) -> Option<&mut Trial> {
        let index = self.cursor.checked_sub(1)?;
        self.trials.get_mut(index)
    }

    pub fn total_in_stage(&self) -> usize {
        self.trials.len()
    }

    pub fn is_stage_exhausted(&self) -> bool {
        self.cursor >= self.trials.len()
    }

    /// Wall-clock time of a clock reading.
    pub fn wall_time(&self, now_ms: u64) -> DateTime<Utc> {
        let offset = i64::try_from(now_ms.saturating_sub(self.started_ms)).unwrap_or(i64::MAX);
        Duration::try_milliseconds(offset)
            .and_then(|d| self.started_at.checked_add_signed(d))
            .unwrap_or(self.started_at)
    }

    /// Appends a record and updates the running counters. Timeouts are
    /// logged but never counted.
    pub fn record(&mut self, record: TrialRecord) {
        if record.correct && !record.is_timeout() {
            self.correct_count += 1;
            self.total_rt_ms += record.response_time_ms;
        }
        self.log.push(record);
    }
}
