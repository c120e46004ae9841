//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Mental rotation experiment (Cooper & Shepard, 1973).
#[derive(Parser, Debug)]
#[command(name = "mental-rotation", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a session in the terminal with a live participant.
    Run(RunArgs),

    /// Run the whole protocol in virtual time with a simulated participant.
    Simulate(SimulateArgs),
}

/// Arguments shared by every command that runs the experiment.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Experiment configuration (JSON). Built-in defaults when omitted.
    #[arg(short, long, env = "ROTEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seed for trial generation. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the trial records here; `.json` selects JSON, anything else CSV.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Only write records answered wrongly or not at all.
    #[arg(long, requires = "out")]
    pub errors_only: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Probability that the simulated participant answers correctly.
    #[arg(long, default_value_t = 0.9, value_parser = parse_probability)]
    pub accuracy: f64,

    /// Simulated reaction time at 0° disparity, in ms.
    #[arg(long, default_value_t = 600)]
    pub base_rt: u64,

    /// Added reaction time per degree of angular disparity, in ms.
    #[arg(long, default_value_t = 2.5)]
    pub ms_per_degree: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormatArg {
    #[default]
    Human,
    Json,
}

fn parse_probability(raw: &str) -> Result<f64, String> {
    let p: f64 = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{p} is not between 0 and 1"))
    }
}
