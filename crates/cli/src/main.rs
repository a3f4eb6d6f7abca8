//! Drives a Tendermint scenario through the nondeterministic harness to a step bound or a
//! decision, and reports the outcome: every process's final stage and decision, whether
//! agreement, validity and accountability held, and any structural invariant violation observed
//! along the way.

use std::collections::BTreeSet;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use csmi::tendermint::{initialize, TendermintLogic};
use csmi::{step, SeededOracle, StepOutcome};
use csmi_core_types::{Node, Round};
use csmi_properties::{
    accountability_holds, agreement_holds, state_invariants_hold, validity_holds, StageMonitor,
};
use csmi_scenario::{example_config, ScenarioConfig};

mod args;

use args::{Args, Commands, RunArgs};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.verbose);

    match &args.command {
        Commands::Run(run_args) => run(run_args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .init();
}

fn load_config(run_args: &RunArgs) -> Result<ScenarioConfig> {
    match &run_args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| eyre!("failed to read {}: {err}", path.display()))?;
            ScenarioConfig::from_toml(&text).map_err(|err| eyre!("invalid scenario config: {err}"))
        }
        None => {
            info!("no --config given, falling back to the built-in example scenario");
            Ok(example_config())
        }
    }
}

fn run(run_args: &RunArgs) -> Result<()> {
    let scenario = load_config(run_args)?;
    let (config, correct, faulty) = scenario
        .build()
        .map_err(|err| eyre!("invalid scenario config: {err}"))?;

    let processes: Vec<Node> = correct.iter().chain(faulty.iter()).cloned().collect();
    let observed_rounds: BTreeSet<Round> = config.values.keys().copied().collect();
    let byzantine_messages = csmi_byzantine::generate(&faulty, &config.values, &observed_rounds);

    let logic = TendermintLogic::new(config.clone());
    let mut env = initialize(&logic, processes.clone(), Round::ZERO);
    let mut oracle = SeededOracle::from_seed(run_args.seed);
    let mut monitor = StageMonitor::new();

    let mut steps_taken = 0u32;
    for step_index in 0..run_args.max_steps {
        for process in &processes {
            if let Some(violation) = monitor.observe(env.state(process)) {
                warn!(?violation, "stage monotonicity violated");
            }
            if !state_invariants_hold(env.state(process)) {
                warn!(?process, "structural invariant violated");
            }
        }

        let outcome = step(&mut env, &logic, &byzantine_messages, scenario.timeout_chance, &mut oracle);
        steps_taken = step_index + 1;
        if matches!(outcome, StepOutcome::Blocked) {
            info!(steps_taken, "harness blocked: no enabled branch remains");
            break;
        }
        if processes.iter().all(|p| env.state(p).decision.is_some()) {
            info!(steps_taken, "every process decided");
            break;
        }
    }

    for process in &processes {
        let state = env.state(process);
        info!(
            ?process,
            stage = ?state.stage,
            decision = ?state.decision,
            round = state.round.as_i64(),
            "final state"
        );
    }

    let agreement = agreement_holds(&env, &config);
    let validity = validity_holds(&env, &config);
    let accountability = accountability_holds(&env, &config, &faulty);

    info!(agreement, validity, accountability, steps_taken, "scenario result");

    if !agreement || !validity || !accountability {
        return Err(eyre!(
            "property violated: agreement={agreement} validity={validity} accountability={accountability}"
        ));
    }

    Ok(())
}
