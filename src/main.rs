use anyhow::Result;
use clap::Parser;
use rotex_experiment::ExperimentStatus;
use tracing::info;

mod app;
mod cli;
mod logging;
mod output;
mod participant;
mod terminal;

use app::Participant;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format, cli.verbose);

    match cli.command {
        Commands::Run(args) => {
            let config = app::load_config(&args.common)?;
            let ctl = app::run_live(config, args.common.seed)?;
            if ctl.status() != ExperimentStatus::Complete {
                info!(status = ?ctl.status(), "session ended early, nothing written");
                return Ok(());
            }
            output::save(&args.common, ctl.records())?;
        }
        Commands::Simulate(args) => {
            let config = app::load_config(&args.common)?;
            let participant = Participant {
                accuracy: args.accuracy,
                base_rt_ms: args.base_rt,
                ms_per_degree: args.ms_per_degree,
            };
            let ctl = app::run_simulated(config, args.common.seed, participant)?;
            if let Some(summary) = app::summary_of(&ctl) {
                output::print_summary(&summary);
            }
            output::save(&args.common, ctl.records())?;
        }
    }
    Ok(())
}
