use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Drive a Tendermint scenario through the nondeterministic harness and report the outcome.
#[derive(Parser, Debug)]
#[command(name = "csmi", version, about)]
pub struct Args {
    /// Enable debug-level logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario to completion (or a step bound) and report its result.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to a TOML scenario configuration. Falls back to the built-in example configuration
    /// (`F = 1`, `CORRECT = {p1, p2, p3}`, `FAULTY = {p4}`) when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of harness steps to take before stopping.
    #[arg(long, default_value_t = 500)]
    pub max_steps: u32,

    /// Seed for the choice oracle driving the run.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}
