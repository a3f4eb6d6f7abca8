//! The concrete instantiation of [`ConsensusLogic`] for the Tendermint state machine, plus the
//! "effect applier" that translates a [`ConsensusOutput`] into an [`Environment`] mutation.
//!
//! This is the one place in the harness crate that knows about a specific consensus algorithm;
//! everything else in `csmi` is generic over [`ConsensusLogic`].

use csmi_core_state_machine::{
    fire_timeout_event, receive_message, Bookkeeping, Config, ConsensusOutput, LocalState, Message,
};
use csmi_core_types::{Node, Round, TimeoutEvent};

use crate::{ConsensusLogic, Environment};

/// The Tendermint consensus logic, parameterized by the fixed configuration constants (`F`,
/// `PROPOSER`, `VALUES`, `CORRECT`).
#[derive(Clone, Debug)]
pub struct TendermintLogic {
    config: Config,
}

impl TendermintLogic {
    /// Build the Tendermint consensus logic from its configuration.
    pub fn new(config: Config) -> Self {
        TendermintLogic { config }
    }

    /// The configuration this logic runs against.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl ConsensusLogic for TendermintLogic {
    type ProcessId = Node;
    type State = LocalState;
    type Message = Message;
    type Timeout = TimeoutEvent;
    type Bookkeeping = Bookkeeping;
    type Output = ConsensusOutput;

    fn initialize_process(&self, process: &Node) -> LocalState {
        LocalState::new(process.clone())
    }

    fn receive_message(&self, state: LocalState, msg: Message) -> (LocalState, Vec<ConsensusOutput>) {
        receive_message(&self.config, state, msg)
    }

    fn fire_timeout_event(
        &self,
        state: LocalState,
        timeout: TimeoutEvent,
    ) -> (LocalState, Vec<ConsensusOutput>) {
        fire_timeout_event(&self.config, state, timeout)
    }

    fn apply_effect(&self, env: &mut Environment<Self>, process: &Node, output: ConsensusOutput) {
        match output {
            ConsensusOutput::Broadcast(msg) => env.broadcast(msg),
            ConsensusOutput::StartTimeout(timeout) => env.start_timeout(self, process, timeout),
            ConsensusOutput::CollectEvidence(msg) => env.bookkeeping.collect(msg),
            ConsensusOutput::Breakpoint => env.bookkeeping.breakpoint = true,
        }
    }

    fn should_replace(&self, old: &TimeoutEvent, new: &TimeoutEvent) -> bool {
        TimeoutEvent::should_replace(old, new)
    }
}

/// Build the initial environment for a Tendermint run: every process (correct and faulty alike)
/// holds the single initial round-0 proposal in its buffer, no active timeouts, and empty
/// bookkeeping. Mirrors the source's fan-out, which places the initial message in every
/// process's buffer *including the proposer's own*, modeling the proposer observing its own
/// proposal through the normal message path.
pub fn initialize(
    logic: &TendermintLogic,
    processes: impl IntoIterator<Item = Node>,
    initial_round: Round,
) -> Environment<TendermintLogic> {
    let proposer = logic
        .config()
        .proposer(initial_round)
        .cloned()
        .expect("initial round must have a configured proposer");
    let proposal = logic
        .config()
        .value_for(initial_round)
        .cloned()
        .expect("initial round must have a configured value");

    let initial_message = Message::Propose {
        src: proposer,
        round: initial_round,
        proposal,
        valid_round: Round::NIL,
    };

    Environment::initialize(logic, processes, [initial_message], Bookkeeping::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csmi_core_state_machine::Stage;
    use csmi_core_types::Value;
    use std::collections::{BTreeMap, BTreeSet};

    fn sample_config() -> Config {
        let mut proposer = BTreeMap::new();
        proposer.insert(Round::ZERO, Node::new("p1"));
        proposer.insert(Round::new(1), Node::new("p2"));

        let mut values = BTreeMap::new();
        values.insert(Round::ZERO, Value::new("v0"));
        values.insert(Round::new(1), Value::new("v1"));

        let mut correct = BTreeSet::new();
        correct.insert(Node::new("p1"));
        correct.insert(Node::new("p2"));
        correct.insert(Node::new("p3"));

        Config::new(1, proposer, values, correct)
    }

    #[test]
    fn initial_environment_seeds_every_buffer_including_the_proposers() {
        let logic = TendermintLogic::new(sample_config());
        let processes = [Node::new("p1"), Node::new("p2"), Node::new("p3"), Node::new("p4")];
        let env = initialize(&logic, processes.clone(), Round::ZERO);

        let expected = Message::Propose {
            src: Node::new("p1"),
            round: Round::ZERO,
            proposal: Value::new("v0"),
            valid_round: Round::NIL,
        };

        for process in &processes {
            assert!(env.buffer(process).contains(&expected));
            assert_eq!(env.state(process).stage, Stage::Propose);
            assert!(env.active_timeout(process).is_none());
        }
    }
}
