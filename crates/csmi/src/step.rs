//! The primitive step actions: receiving one message, firing one timeout, and the
//! nondeterministic `step`/`step_no_timeout`/`step_accelerated` actions built from them.

use crate::{ChoiceOracle, ConsensusLogic, Environment};

/// What a `step` call actually did, for logging and for tests that want to assert on the
/// branch taken without re-deriving it from the environment diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<P> {
    /// No branch was enabled: every buffer is empty, no timeout is active, and (for [`step`])
    /// there are no Byzantine messages to inject.
    Blocked,
    /// `process` consumed one buffered message.
    Message { process: P },
    /// `process` fired its active timeout.
    Timeout { process: P },
    /// A Byzantine message was delivered directly to `process`.
    Byzantine { process: P },
}

/// Receive exactly one message for `process`.
///
/// Precondition: `msg` is present in `process`'s buffer. Removes it, runs `receive_message`,
/// replaces the process's state, and applies every output it produced, in order.
pub fn receive_one_message<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    process: &L::ProcessId,
    msg: L::Message,
) {
    env.remove_message(process, &msg);
    let state = env.state(process).clone();
    let (next_state, outputs) = logic.receive_message(state, msg);
    env.set_state(process, next_state);
    for output in outputs {
        logic.apply_effect(env, process, output);
    }
}

/// Fire `process`'s active timeout.
///
/// Precondition: `process` has an active timeout. Clears it, runs `fire_timeout_event`,
/// replaces the process's state, and applies every output it produced, in order.
pub fn fire_one_timeout<L: ConsensusLogic>(env: &mut Environment<L>, logic: &L, process: &L::ProcessId) {
    let timeout = env.take_timeout(process);
    let state = env.state(process).clone();
    let (next_state, outputs) = logic.fire_timeout_event(state, timeout);
    env.set_state(process, next_state);
    for output in outputs {
        logic.apply_effect(env, process, output);
    }
}

/// Deliver a Byzantine message directly to `process`, bypassing the normal buffer lifecycle.
pub fn receive_byzantine<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    process: &L::ProcessId,
    msg: L::Message,
) {
    let state = env.state(process).clone();
    let (next_state, outputs) = logic.receive_message(state, msg);
    env.set_state(process, next_state);
    for output in outputs {
        logic.apply_effect(env, process, output);
    }
}

fn processes_with_active_timeout<L: ConsensusLogic>(env: &Environment<L>) -> Vec<L::ProcessId> {
    env.processes()
        .filter(|p| env.active_timeout(p).is_some())
        .cloned()
        .collect()
}

fn processes_with_nonempty_buffer<L: ConsensusLogic>(env: &Environment<L>) -> Vec<L::ProcessId> {
    env.processes()
        .filter(|p| !env.buffer(p).is_empty())
        .cloned()
        .collect()
}

fn pick_buffered_message<L: ConsensusLogic>(
    env: &Environment<L>,
    process: &L::ProcessId,
    oracle: &mut impl ChoiceOracle,
) -> L::Message {
    let buffered: Vec<L::Message> = env.buffer(process).iter().cloned().collect();
    let index = oracle.choose(buffered.len());
    buffered[index].clone()
}

/// `step_no_timeout`: the message branch alone. Enabled iff some process has a nonempty buffer.
pub fn step_no_timeout<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    oracle: &mut impl ChoiceOracle,
) -> StepOutcome<L::ProcessId> {
    let candidates = processes_with_nonempty_buffer(env);
    if candidates.is_empty() {
        return StepOutcome::Blocked;
    }

    let process = candidates[oracle.choose(candidates.len())].clone();
    let msg = pick_buffered_message(env, &process, oracle);
    tracing::trace!(?process, "step_no_timeout: delivering buffered message");
    receive_one_message(env, logic, &process, msg);
    StepOutcome::Message { process }
}

enum Branch {
    Timeout,
    Message,
    Byzantine,
}

fn enabled_branches<L: ConsensusLogic>(
    env: &Environment<L>,
    byzantine_messages: &[L::Message],
    timeout_chance: u8,
    oracle: &mut impl ChoiceOracle,
    include_byzantine: bool,
) -> Vec<Branch> {
    let mut enabled = Vec::new();

    if !processes_with_active_timeout(env).is_empty() && oracle.chance(timeout_chance) {
        enabled.push(Branch::Timeout);
    }
    if !processes_with_nonempty_buffer(env).is_empty() {
        enabled.push(Branch::Message);
    }
    if include_byzantine && !byzantine_messages.is_empty() {
        enabled.push(Branch::Byzantine);
    }

    enabled
}

fn run_branch<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    byzantine_messages: &[L::Message],
    oracle: &mut impl ChoiceOracle,
    branch: Branch,
) -> StepOutcome<L::ProcessId> {
    match branch {
        Branch::Timeout => {
            let candidates = processes_with_active_timeout(env);
            let process = candidates[oracle.choose(candidates.len())].clone();
            tracing::trace!(?process, "step: firing active timeout");
            fire_one_timeout(env, logic, &process);
            StepOutcome::Timeout { process }
        }
        Branch::Message => {
            let candidates = processes_with_nonempty_buffer(env);
            let process = candidates[oracle.choose(candidates.len())].clone();
            let msg = pick_buffered_message(env, &process, oracle);
            tracing::trace!(?process, "step: delivering buffered message");
            receive_one_message(env, logic, &process, msg);
            StepOutcome::Message { process }
        }
        Branch::Byzantine => {
            let msg = byzantine_messages[oracle.choose(byzantine_messages.len())].clone();
            let processes: Vec<L::ProcessId> = env.processes().cloned().collect();
            let process = processes[oracle.choose(processes.len())].clone();
            tracing::trace!(?process, "step: injecting byzantine message");
            receive_byzantine(env, logic, &process, msg);
            StepOutcome::Byzantine { process }
        }
    }
}

/// The full interleaved step: nondeterministically pick exactly one of the timeout, message, or
/// Byzantine-injection branches that is currently enabled, and run it.
pub fn step<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    byzantine_messages: &[L::Message],
    timeout_chance: u8,
    oracle: &mut impl ChoiceOracle,
) -> StepOutcome<L::ProcessId> {
    let enabled = enabled_branches(env, byzantine_messages, timeout_chance, oracle, true);
    if enabled.is_empty() {
        return StepOutcome::Blocked;
    }

    let index = oracle.choose(enabled.len());
    let branch = enabled.into_iter().nth(index).expect("index in bounds");
    run_branch(env, logic, byzantine_messages, oracle, branch)
}

/// `step` without the Byzantine branch: only the timeout and message branches are considered.
pub fn step_accelerated<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    timeout_chance: u8,
    oracle: &mut impl ChoiceOracle,
) -> StepOutcome<L::ProcessId> {
    let enabled = enabled_branches(env, &[], timeout_chance, oracle, false);
    if enabled.is_empty() {
        return StepOutcome::Blocked;
    }

    let index = oracle.choose(enabled.len());
    let branch = enabled.into_iter().nth(index).expect("index in bounds");
    run_branch(env, logic, &[], oracle, branch)
}

/// Nondeterministically choose a non-empty subset of `process`'s buffered messages and deliver
/// them, in sequence, as one atomic action. Returns the number of messages delivered, or `0` if
/// the buffer was empty.
pub fn receive_msg_accelerated<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    process: &L::ProcessId,
    oracle: &mut impl ChoiceOracle,
) -> usize {
    let buffered: Vec<L::Message> = env.buffer(process).iter().cloned().collect();
    if buffered.is_empty() {
        return 0;
    }

    let indices = oracle.choose_subset(buffered.len());
    for index in &indices {
        // Re-read the buffer each time: an earlier delivery in this same batch may have been a
        // proposal whose handling inserted new messages into this same buffer via broadcast.
        if env.buffer(process).contains(&buffered[*index]) {
            receive_one_message(env, logic, process, buffered[*index].clone());
        }
    }

    indices.len()
}

/// Nondeterministically choose a non-empty subset of the processes that currently have an
/// active timeout and fire them all, in sequence, as one atomic action. Returns the number of
/// timeouts fired, or `0` if no process had one active.
pub fn receive_timeout_accelerated<L: ConsensusLogic>(
    env: &mut Environment<L>,
    logic: &L,
    oracle: &mut impl ChoiceOracle,
) -> usize {
    let candidates = processes_with_active_timeout(env);
    if candidates.is_empty() {
        return 0;
    }

    let indices = oracle.choose_subset(candidates.len());
    for index in &indices {
        let process = &candidates[*index];
        if env.active_timeout(process).is_some() {
            fire_one_timeout(env, logic, process);
        }
    }

    indices.len()
}
