mod common;

use common::{Event, Rig, key_for, single_trial_config};
use rotex_core::{StageId, TrialPhase};
use rotex_experiment::{ExperimentConfig, ExperimentStatus, stats};

/// Answers every stimulus correctly after `rt` ms and accepts every
/// continuation prompt, until the run completes.
fn run_to_completion(rig: &mut Rig, rt: u64) {
    for _ in 0..10_000 {
        match rig.status() {
            ExperimentStatus::Complete => return,
            ExperimentStatus::AwaitingContinuation { .. } => {
                assert!(rig.ctl.confirm_next_stage(true).unwrap());
            }
            _ if rig.ctl.current_phase() == Some(TrialPhase::Stimulus) => {
                let version = rig.ctl.current_trial().unwrap().version;
                let key = key_for(rig.ctl.config(), version);
                rig.advance(rt);
                assert!(rig.ctl.on_key(&key));
            }
            _ => {
                let deadline = rig.ctl.next_deadline().expect("nothing scheduled");
                rig.clock.set(deadline);
                rig.ctl.poll();
            }
        }
    }
    panic!("experiment never completed");
}

#[test]
fn full_protocol_records_every_trial() {
    let mut rig = Rig::new(ExperimentConfig::default(), 2024);
    rig.ctl.start().unwrap();
    run_to_completion(&mut rig, 700);

    let records = rig.ctl.records();
    assert_eq!(records.len(), 6 + 40 + 36);
    assert!(records.iter().all(|r| r.correct && r.response_time_ms == 700));

    let per_stage = |stage: StageId| records.iter().filter(|r| r.stage == stage).count();
    assert_eq!(per_stage(StageId::Practice), 6);
    assert_eq!(per_stage(StageId::Stage1), 40);
    assert_eq!(per_stage(StageId::Stage2), 36);

    // trial numbers restart at 1 in every stage
    for stage in StageId::ALL {
        let numbers: Vec<_> = records
            .iter()
            .filter(|r| r.stage == stage)
            .map(|r| r.trial)
            .collect();
        let expected: Vec<_> = (1..=numbers.len()).collect();
        assert_eq!(numbers, expected);
    }

    let by_condition = stats::mean_rt_by_condition(records);
    // B-1000 runs in both formal stages
    assert_eq!(by_condition.len(), 8);
    assert!(by_condition.values().all(|&rt| rt == 700));

    assert_eq!(stats::errors(records).count(), 0);

    let summaries: Vec<_> = rig
        .presenter()
        .events
        .iter()
        .filter_map(|e| match e {
            Event::StageSummary { stage, stats } => Some((*stage, stats.total)),
            _ => None,
        })
        .collect();
    assert_eq!(
        summaries,
        vec![
            (StageId::Practice, 6),
            (StageId::Stage1, 40),
            (StageId::Stage2, 36),
        ]
    );

    let Some(Event::ExperimentSummary(summary)) = rig.presenter().events.last() else {
        panic!("no experiment summary rendered");
    };
    assert_eq!(summary.overall.total, 82);
    assert_eq!(summary.formal.total, 76);
    assert_eq!(summary.overall.accuracy_pct, 100);
    // one RT-by-angle curve per formal condition label
    assert_eq!(summary.by_angle.len(), 8);
    for curve in summary.by_angle.values() {
        assert!(!curve.is_empty());
        assert!(curve.keys().all(|angle| angle % 60 == 0 && *angle < 360));
        assert!(curve.values().all(|&rt| rt == 700));
    }

    // the queue is empty and the session kept for export
    assert_eq!(rig.ctl.next_deadline(), None);
    assert!(rig.ctl.session().is_some());
}

#[test]
fn stage_waits_for_continuation() {
    let mut rig = Rig::new(single_trial_config("N", 'R', 0), 3);
    rig.ctl.start().unwrap();
    rig.run_until_phase(TrialPhase::Stimulus);
    rig.advance(3000 + 500);

    assert_eq!(
        rig.status(),
        ExperimentStatus::AwaitingContinuation {
            next: StageId::Stage1
        }
    );
    assert_eq!(rig.ctl.next_deadline(), None);
    // keys do nothing at the prompt
    assert!(!rig.ctl.on_key("f"));

    assert!(rig.ctl.confirm_next_stage(true).unwrap());
    assert_eq!(rig.status(), ExperimentStatus::Settling);
    // one character at one angle leaves a pool of 2 for each of the 5 conditions
    assert_eq!(rig.ctl.trial_progress(), Some((0, 10)));
    assert_eq!(rig.ctl.session().unwrap().stage, StageId::Stage1);
    // practice record survives into the next stage
    assert_eq!(rig.ctl.records().len(), 1);
}

#[test]
fn declining_continuation_terminates() {
    let mut rig = Rig::new(single_trial_config("N", 'R', 0), 3);
    rig.ctl.start().unwrap();
    rig.advance(10_000);
    assert!(matches!(
        rig.status(),
        ExperimentStatus::AwaitingContinuation { .. }
    ));

    assert!(!rig.ctl.confirm_next_stage(false).unwrap());
    assert_eq!(rig.status(), ExperimentStatus::Terminated);
    assert!(rig.ctl.session().is_none());
    assert!(rig.ctl.records().is_empty());
}

#[test]
fn confirm_outside_prompt_is_a_no_op() {
    let mut rig = Rig::new(single_trial_config("N", 'R', 0), 3);
    assert!(!rig.ctl.confirm_next_stage(true).unwrap());
    rig.ctl.start().unwrap();
    assert!(!rig.ctl.confirm_next_stage(true).unwrap());
    assert_eq!(rig.status(), ExperimentStatus::Settling);
}

#[test]
fn quit_cancels_everything() {
    let mut rig = Rig::new(single_trial_config("B", 'R', 0), 6);
    rig.ctl.start().unwrap();
    rig.run_until_phase(TrialPhase::IdentityInfo);

    rig.ctl.quit();
    assert_eq!(rig.status(), ExperimentStatus::Terminated);
    assert_eq!(rig.ctl.next_deadline(), None);
    assert_eq!(rig.ctl.current_phase(), None);

    let before = rig.presenter().events.len();
    rig.advance(60_000);
    assert_eq!(rig.presenter().events.len(), before);
}

#[test]
fn restart_returns_to_idle_and_can_start_again() {
    let mut rig = Rig::new(single_trial_config("N", 'R', 0), 6);
    rig.ctl.start().unwrap();
    rig.run_until_phase(TrialPhase::Stimulus);
    rig.ctl.on_key("f");
    assert_eq!(rig.ctl.records().len(), 1);

    rig.ctl.restart();
    assert_eq!(rig.status(), ExperimentStatus::Idle);
    assert!(rig.ctl.session().is_none());
    assert_eq!(rig.ctl.next_deadline(), None);

    rig.ctl.start().unwrap();
    assert_eq!(rig.status(), ExperimentStatus::Settling);
    assert!(rig.ctl.records().is_empty());
    rig.run_until_phase(TrialPhase::Stimulus);
}

#[test]
fn pause_during_settle_delays_first_trial() {
    let mut rig = Rig::new(single_trial_config("N", 'R', 0), 1);
    rig.ctl.start().unwrap();
    rig.advance(600);
    assert!(rig.ctl.pause());
    rig.advance(5_000);
    assert_eq!(rig.ctl.current_phase(), None);

    assert!(rig.ctl.resume());
    assert_eq!(rig.status(), ExperimentStatus::Settling);
    let resumed_at = rig.now();
    rig.run_until_phase(TrialPhase::Fixation);
    assert_eq!(rig.now(), resumed_at + 1000);
    assert_eq!(rig.status(), ExperimentStatus::Running);
}

#[test]
fn pause_and_resume_outside_their_states_are_rejected() {
    let mut rig = Rig::new(single_trial_config("N", 'R', 0), 1);
    assert!(!rig.ctl.pause());
    assert!(!rig.ctl.resume());
    rig.ctl.start().unwrap();
    assert!(!rig.ctl.resume());
    assert!(rig.ctl.pause());
    assert!(!rig.ctl.pause());
}

#[test]
fn invalid_config_fails_to_start() {
    let mut config = single_trial_config("N", 'R', 0);
    config.stages.stage1.conditions = vec!["Q".to_string()];
    let mut rig = Rig::new(config, 1);
    assert!(rig.ctl.start().is_err());
    assert_eq!(rig.status(), ExperimentStatus::Idle);
}

#[test]
fn huge_settle_delay_saturates() {
    let mut config = single_trial_config("N", 'R', 0);
    config.timing.stage_settle_ms = u64::MAX;
    let mut rig = Rig::new(config, 1);
    rig.advance(250);
    rig.ctl.start().unwrap();
    assert_eq!(rig.ctl.next_deadline(), Some(u64::MAX));
    assert_eq!(rig.status(), ExperimentStatus::Settling);
}
