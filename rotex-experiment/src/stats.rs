//! Accuracy and reaction-time summaries over the record log.
//!
//! Everything here reads the log and never modifies it.

use std::collections::{BTreeMap, BTreeSet};

use rotex_core::{StageId, TrialRecord, Version};
use serde::Serialize;

/// Which records a summary covers.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Stage(StageId),
    /// Every stage except practice.
    Formal,
}

impl Scope {
    pub fn includes(&self, record: &TrialRecord) -> bool {
        match self {
            Scope::All => true,
            Scope::Stage(stage) => record.stage == *stage,
            Scope::Formal => !record.stage.is_practice(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub total: usize,
    pub correct: usize,
    pub timeouts: usize,
    /// `round(correct / total × 100)`, 0 for an empty scope.
    pub accuracy_pct: u32,
    /// Rounded mean latency of correct, non-timeout records; 0 if none.
    pub mean_rt_ms: u64,
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

fn mean_rt<'a>(records: impl IntoIterator<Item = &'a TrialRecord>) -> u64 {
    let (sum, n) = records
        .into_iter()
        .filter(|r| r.correct && !r.is_timeout())
        .fold((0u64, 0u64), |(sum, n), r| (sum + r.response_time_ms, n + 1));
    if n == 0 {
        0
    } else {
        (sum as f64 / n as f64).round() as u64
    }
}

pub fn summarize(log: &[TrialRecord], scope: Scope) -> StageStats {
    let scoped: Vec<&TrialRecord> = log.iter().filter(|r| scope.includes(r)).collect();
    let total = scoped.len();
    let correct = scoped.iter().filter(|r| r.correct).count();
    StageStats {
        total,
        correct,
        timeouts: scoped.iter().filter(|r| r.is_timeout()).count(),
        accuracy_pct: percent(correct, total),
        mean_rt_ms: mean_rt(scoped.iter().copied()),
    }
}

/// Mean correct RT per condition label over the formal stages.
pub fn mean_rt_by_condition(log: &[TrialRecord]) -> BTreeMap<String, u64> {
    let mut groups: BTreeMap<String, Vec<&TrialRecord>> = BTreeMap::new();
    for record in log.iter().filter(|r| Scope::Formal.includes(r)) {
        groups
            .entry(record.condition.label())
            .or_default()
            .push(record);
    }
    groups
        .into_iter()
        .map(|(label, records)| (label, mean_rt(records)))
        .collect()
}

/// Mean correct RT per angle for one condition label over the formal
/// stages. Angles without any record are absent.
pub fn mean_rt_by_angle(log: &[TrialRecord], condition_label: &str) -> BTreeMap<u16, u64> {
    let mut groups: BTreeMap<u16, Vec<&TrialRecord>> = BTreeMap::new();
    for record in log
        .iter()
        .filter(|r| Scope::Formal.includes(r) && r.condition.label() == condition_label)
    {
        groups.entry(record.angle).or_default().push(record);
    }
    groups
        .into_iter()
        .map(|(angle, records)| (angle, mean_rt(records)))
        .collect()
}

/// [`mean_rt_by_angle`] for every condition label seen in the formal stages:
/// one RT-by-angle curve per condition.
pub fn rotation_curves(log: &[TrialRecord]) -> BTreeMap<String, BTreeMap<u16, u64>> {
    let labels: BTreeSet<String> = log
        .iter()
        .filter(|r| Scope::Formal.includes(r))
        .map(|r| r.condition.label())
        .collect();
    labels
        .into_iter()
        .map(|label| {
            let curve = mean_rt_by_angle(log, &label);
            (label, curve)
        })
        .collect()
}

/// Records answered wrongly or not at all, in log order.
pub fn errors(log: &[TrialRecord]) -> impl Iterator<Item = &TrialRecord> {
    log.iter().filter(|r| !r.correct)
}

/// Accuracy of normal and mirror trials over the formal stages.
pub fn accuracy_by_version(log: &[TrialRecord]) -> VersionAccuracy {
    let of = |version: Version| {
        let (correct, total) = log
            .iter()
            .filter(|r| Scope::Formal.includes(r) && r.version == version)
            .fold((0, 0), |(c, t), r| (c + usize::from(r.correct), t + 1));
        percent(correct, total)
    };
    VersionAccuracy {
        normal_pct: of(Version::Normal),
        mirror_pct: of(Version::Mirror),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VersionAccuracy {
    pub normal_pct: u32,
    pub mirror_pct: u32,
}

/// Results shown once the last stage is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentSummary {
    pub overall: StageStats,
    pub formal: StageStats,
    pub by_condition: BTreeMap<String, u64>,
    /// Mean correct RT by angle, per condition label.
    pub by_angle: BTreeMap<String, BTreeMap<u16, u64>>,
    pub by_version: VersionAccuracy,
    pub duration_secs: u64,
}

impl ExperimentSummary {
    pub fn from_log(log: &[TrialRecord], duration_secs: u64) -> Self {
        Self {
            overall: summarize(log, Scope::All),
            formal: summarize(log, Scope::Formal),
            by_condition: mean_rt_by_condition(log),
            by_angle: rotation_curves(log),
            by_version: accuracy_by_version(log),
            duration_secs,
        }
    }
}
