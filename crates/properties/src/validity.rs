//! Validity: a correct process never decides a value that isn't valid.

use csmi::tendermint::TendermintLogic;
use csmi::Environment;
use csmi_core_state_machine::Config;

/// Whether every correct process's decision, if any, is a valid value — the configured value
/// of some round whose proposer is correct.
pub fn validity_holds(env: &Environment<TendermintLogic>, config: &Config) -> bool {
    env.processes().filter(|p| config.correct.contains(p)).all(|p| {
        env.state(p)
            .decision
            .as_ref()
            .is_none_or(|value| config.is_valid(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use csmi::tendermint::initialize;
    use csmi_core_types::{Node, Round, Value};
    use std::collections::{BTreeMap, BTreeSet};

    fn config() -> Config {
        let mut proposer = BTreeMap::new();
        proposer.insert(Round::ZERO, Node::new("p1"));
        proposer.insert(Round::new(1), Node::new("p4"));

        let mut values = BTreeMap::new();
        values.insert(Round::ZERO, Value::new("v0"));
        values.insert(Round::new(1), Value::new("v1"));

        let mut correct = BTreeSet::new();
        correct.insert(Node::new("p1"));
        correct.insert(Node::new("p2"));

        Config::new(1, proposer, values, correct)
    }

    #[test]
    fn decision_on_correct_proposer_value_is_valid() {
        let cfg = config();
        let logic = TendermintLogic::new(cfg.clone());
        let mut env = initialize(&logic, [Node::new("p1"), Node::new("p2")], Round::ZERO);

        let mut p1 = env.state(&Node::new("p1")).clone();
        p1.decision = Some(Value::new("v0"));
        env.set_state(&Node::new("p1"), p1);

        assert!(validity_holds(&env, &cfg));
    }

    #[test]
    fn decision_on_faulty_proposer_value_is_invalid() {
        let cfg = config();
        let logic = TendermintLogic::new(cfg.clone());
        let mut env = initialize(&logic, [Node::new("p1"), Node::new("p2")], Round::ZERO);

        let mut p2 = env.state(&Node::new("p2")).clone();
        p2.decision = Some(Value::new("v1"));
        env.set_state(&Node::new("p2"), p2);

        assert!(!validity_holds(&env, &cfg));
    }
}
