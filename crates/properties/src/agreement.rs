//! Agreement: no two correct processes ever decide different values.

use csmi::tendermint::TendermintLogic;
use csmi::Environment;
use csmi_core_state_machine::Config;
use csmi_core_types::Value;

/// Whether every correct process's decision agrees with every other correct process's
/// decision. A `None` decision agrees with anything: agreement is only violated by two
/// *different* `Some` decisions.
pub fn agreement_holds(env: &Environment<TendermintLogic>, config: &Config) -> bool {
    let decisions: Vec<&Value> = env
        .processes()
        .filter(|p| config.correct.contains(p))
        .filter_map(|p| env.state(p).decision.as_ref())
        .collect();

    decisions.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use csmi::tendermint::initialize;
    use csmi_core_types::{Node, Round};
    use std::collections::{BTreeMap, BTreeSet};

    fn config() -> Config {
        let mut proposer = BTreeMap::new();
        proposer.insert(Round::ZERO, Node::new("p1"));

        let mut values = BTreeMap::new();
        values.insert(Round::ZERO, Value::new("v0"));

        let mut correct = BTreeSet::new();
        correct.insert(Node::new("p1"));
        correct.insert(Node::new("p2"));

        Config::new(1, proposer, values, correct)
    }

    #[test]
    fn no_decisions_trivially_agree() {
        let cfg = config();
        let logic = TendermintLogic::new(cfg.clone());
        let env = initialize(&logic, [Node::new("p1"), Node::new("p2")], Round::ZERO);

        assert!(agreement_holds(&env, &cfg));
    }

    #[test]
    fn matching_decisions_agree() {
        let cfg = config();
        let logic = TendermintLogic::new(cfg.clone());
        let mut env = initialize(&logic, [Node::new("p1"), Node::new("p2")], Round::ZERO);

        let mut p1 = env.state(&Node::new("p1")).clone();
        p1.decision = Some(Value::new("v0"));
        env.set_state(&Node::new("p1"), p1);

        let mut p2 = env.state(&Node::new("p2")).clone();
        p2.decision = Some(Value::new("v0"));
        env.set_state(&Node::new("p2"), p2);

        assert!(agreement_holds(&env, &cfg));
    }

    #[test]
    fn conflicting_decisions_violate_agreement() {
        let cfg = config();
        let logic = TendermintLogic::new(cfg.clone());
        let mut env = initialize(&logic, [Node::new("p1"), Node::new("p2")], Round::ZERO);

        let mut p1 = env.state(&Node::new("p1")).clone();
        p1.decision = Some(Value::new("v0"));
        env.set_state(&Node::new("p1"), p1);

        let mut p2 = env.state(&Node::new("p2")).clone();
        p2.decision = Some(Value::new("v1"));
        env.set_state(&Node::new("p2"), p2);

        assert!(!agreement_holds(&env, &cfg));
    }
}
