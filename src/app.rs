//! Drivers that own a [`StageController`] and feed it time and input.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rotex_core::{TrialPhase, Version};
use rotex_experiment::{
    ExperimentConfig, ExperimentStatus, ExperimentSummary, LogPresenter, Presenter,
    StageController,
};
use rotex_timing::{Clock, HighPrecisionClock, VirtualClock};
use tracing::{debug, info, warn};

use crate::cli::CommonArgs;
use crate::participant::SimulatedParticipant;
use crate::terminal::TerminalPresenter;

/// Longest the loop blocks on input when nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_millis(250);
/// Deadlines closer than this are slept for on the clock instead of
/// waiting on the input channel.
const SLEEP_THRESHOLD_MS: u64 = 2;
/// Lines the live loop takes as session control: pause, resume, quit and
/// start over. Response keys may not use them.
pub const CONTROL_KEYS: [&str; 4] = ["p", "r", "q", "s"];

pub fn load_config(args: &CommonArgs) -> Result<ExperimentConfig> {
    let config = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    for key in [&config.keys.normal, &config.keys.mirror] {
        if CONTROL_KEYS
            .iter()
            .any(|control| key.trim().eq_ignore_ascii_case(control))
        {
            bail!("response key `{key}` is reserved for session control");
        }
    }
    Ok(config)
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Forwards stdin lines to the experiment loop.
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });
    rx
}

type LiveController = StageController<HighPrecisionClock, StdRng, TerminalPresenter>;

/// Runs a live session on the terminal. Returns the controller once the
/// run has completed or been abandoned.
pub fn run_live(config: ExperimentConfig, seed: Option<u64>) -> Result<LiveController> {
    let presenter = TerminalPresenter::new(config.keys.clone());
    presenter.print_instructions();

    let input = spawn_input_reader();
    let clock = HighPrecisionClock::new();
    let mut ctl = StageController::new(config, clock.clone(), rng_for(seed), presenter);

    if input.recv().is_err() {
        info!("input closed before start");
        return Ok(ctl);
    }
    ctl.start()?;

    loop {
        if matches!(
            ctl.poll(),
            ExperimentStatus::Complete | ExperimentStatus::Terminated
        ) {
            break;
        }

        let wait = match ctl.next_deadline() {
            Some(deadline) => {
                let remaining = deadline.saturating_sub(clock.now());
                if remaining <= SLEEP_THRESHOLD_MS {
                    clock.sleep(Duration::from_millis(remaining));
                    continue;
                }
                Duration::from_millis(remaining - SLEEP_THRESHOLD_MS).min(IDLE_WAIT)
            }
            None => IDLE_WAIT,
        };

        match input.recv_timeout(wait) {
            Ok(line) => handle_line(&mut ctl, &line)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("input closed, quitting");
                ctl.quit();
                break;
            }
        }
    }
    Ok(ctl)
}

fn handle_line(ctl: &mut LiveController, line: &str) -> Result<()> {
    if ctl.status() == ExperimentStatus::Idle {
        ctl.start()?;
        return Ok(());
    }
    if let ExperimentStatus::AwaitingContinuation { .. } = ctl.status() {
        match line.to_ascii_lowercase().as_str() {
            "y" | "yes" => {
                ctl.confirm_next_stage(true)?;
            }
            "n" | "no" => {
                ctl.confirm_next_stage(false)?;
            }
            _ => println!("Continue to the next stage? [y/n]"),
        }
        return Ok(());
    }

    match line.to_ascii_lowercase().as_str() {
        "p" => {
            if ctl.pause() {
                println!("Paused. Press r to resume.");
            }
        }
        "r" => {
            ctl.resume();
        }
        "q" => ctl.quit(),
        "s" => {
            ctl.restart();
            println!("Restarted. Press Enter to begin.");
        }
        _ => {
            if !ctl.on_key(line) {
                debug!(line, "input not taken as a response");
            }
        }
    }
    Ok(())
}

/// Knobs of the simulated participant.
#[derive(Debug, Clone, Copy)]
pub struct Participant {
    pub accuracy: f64,
    pub base_rt_ms: u64,
    pub ms_per_degree: f64,
}

type SimController = StageController<VirtualClock, StdRng, LogPresenter>;

/// Runs the whole protocol in virtual time, accepting every continuation
/// prompt.
pub fn run_simulated(
    config: ExperimentConfig,
    seed: Option<u64>,
    participant: Participant,
) -> Result<SimController> {
    let clock = VirtualClock::new();
    let mut rng = rng_for(seed);
    let mut answers = SimulatedParticipant::new(
        StdRng::seed_from_u64(rng.random()),
        participant.accuracy,
        participant.base_rt_ms,
        participant.ms_per_degree,
    );
    let mut ctl = StageController::new(config, clock.clone(), rng, LogPresenter);
    ctl.start()?;

    // (press time, key) for the stimulus currently shown
    let mut press: Option<(u64, String)> = None;
    loop {
        match ctl.status() {
            ExperimentStatus::Complete | ExperimentStatus::Terminated => break,
            ExperimentStatus::AwaitingContinuation { .. } => {
                ctl.confirm_next_stage(true)?;
                continue;
            }
            _ => {}
        }

        if ctl.current_phase() != Some(TrialPhase::Stimulus) {
            press = None;
        } else if press.is_none() {
            if let Some(trial) = ctl.current_trial() {
                let (version, rt) = answers.respond(trial);
                let key = match version {
                    Version::Normal => ctl.config().keys.normal.clone(),
                    Version::Mirror => ctl.config().keys.mirror.clone(),
                };
                press = Some((clock.now() + rt, key));
            }
        }

        let deadline = ctl.next_deadline();
        match (&press, deadline) {
            (Some((at, key)), Some(deadline)) if *at < deadline => {
                clock.set(*at);
                ctl.on_key(key);
            }
            (_, Some(deadline)) => {
                clock.set(deadline);
                ctl.poll();
            }
            (_, None) => {
                warn!(status = ?ctl.status(), "nothing scheduled, stopping");
                break;
            }
        }
    }
    Ok(ctl)
}

/// Summary of a finished run, if it got that far.
pub fn summary_of<C: Clock, P: Presenter>(
    ctl: &StageController<C, StdRng, P>,
) -> Option<ExperimentSummary> {
    let session = ctl.session()?;
    let elapsed = ctl.clock().elapsed(session.started_ms);
    Some(ExperimentSummary::from_log(&session.log, elapsed.as_secs()))
}

#[cfg(test)]
mod tests {
    use rotex_core::Response;

    use super::*;

    fn participant(accuracy: f64) -> Participant {
        Participant {
            accuracy,
            base_rt_ms: 500,
            ms_per_degree: 2.0,
        }
    }

    #[test]
    fn simulation_runs_every_stage() {
        let ctl = run_simulated(ExperimentConfig::default(), Some(42), participant(1.0)).unwrap();
        assert_eq!(ctl.status(), ExperimentStatus::Complete);
        let records = ctl.records();
        assert_eq!(records.len(), 82);
        assert!(records.iter().all(|r| r.correct));

        let summary = summary_of(&ctl).unwrap();
        assert_eq!(summary.overall.accuracy_pct, 100);
        assert!(summary.overall.mean_rt_ms >= 500);
    }

    #[test]
    fn simulation_is_reproducible() {
        let a = run_simulated(ExperimentConfig::default(), Some(7), participant(0.8)).unwrap();
        let b = run_simulated(ExperimentConfig::default(), Some(7), participant(0.8)).unwrap();
        let strip = |ctl: &SimController| {
            ctl.records()
                .iter()
                .map(|r| (r.character, r.angle, r.version, r.response, r.response_time_ms))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(&a), strip(&b));
    }

    #[test]
    fn slow_participant_times_out() {
        let slow = Participant {
            accuracy: 1.0,
            base_rt_ms: 5_000,
            ms_per_degree: 0.0,
        };
        let ctl = run_simulated(ExperimentConfig::default(), Some(3), slow).unwrap();
        assert!(ctl.records().iter().all(|r| r.response == Response::Timeout));
        assert_eq!(ctl.session().unwrap().correct_count, 0);
    }

    fn live(config: ExperimentConfig) -> LiveController {
        let presenter = TerminalPresenter::new(config.keys.clone());
        StageController::new(
            config,
            HighPrecisionClock::new(),
            StdRng::seed_from_u64(5),
            presenter,
        )
    }

    #[test]
    fn restart_line_returns_to_idle_and_any_line_starts_again() {
        let mut ctl = live(ExperimentConfig::default());
        ctl.start().unwrap();
        handle_line(&mut ctl, "s").unwrap();
        assert_eq!(ctl.status(), ExperimentStatus::Idle);
        assert!(ctl.session().is_none());

        handle_line(&mut ctl, "").unwrap();
        assert_eq!(ctl.status(), ExperimentStatus::Settling);
    }

    #[test]
    fn control_lines_drive_the_session() {
        let mut ctl = live(ExperimentConfig::default());
        ctl.start().unwrap();
        handle_line(&mut ctl, "P").unwrap();
        assert_eq!(ctl.status(), ExperimentStatus::Paused);
        handle_line(&mut ctl, "r").unwrap();
        assert_eq!(ctl.status(), ExperimentStatus::Settling);
        handle_line(&mut ctl, "q").unwrap();
        assert_eq!(ctl.status(), ExperimentStatus::Terminated);
    }

    #[test]
    fn response_keys_may_not_shadow_controls() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("rotex-{}-keys.json", std::process::id()));
        std::fs::write(&path, r#"{ "keys": { "normal": "P", "mirror": "j" } }"#).unwrap();
        let args = CommonArgs {
            config: Some(path.clone()),
            seed: None,
            out: None,
            errors_only: false,
        };
        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("reserved"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn unknown_config_file_is_an_error() {
        let args = CommonArgs {
            config: Some("/nonexistent/rotex.json".into()),
            seed: None,
            out: None,
            errors_only: false,
        };
        assert!(load_config(&args).is_err());
    }
}
