//! End-to-end scenarios driven through the named actions and the nondeterministic harness,
//! against the literal configuration this crate's example uses throughout:
//! `F = 1`, `CORRECT = {p1, p2, p3}`, `FAULTY = {p4}`.

use std::collections::BTreeSet;

use csmi::tendermint::{initialize, TendermintLogic};
use csmi::{step, SeededOracle};
use csmi_core_state_machine::Message;
use csmi_core_types::{NilOrVal, Node, Round, Value};
use csmi_properties::{accountability_holds, agreement_holds, validity_holds};
use csmi_scenario::actions::{receive_byzantine, receive_prevote_from, receive_proposal_from};
use csmi_scenario::example_config;

fn processes() -> [Node; 4] {
    [Node::new("p1"), Node::new("p2"), Node::new("p3"), Node::new("p4")]
}

/// Scenario 4: from `init` alone, with no steps taken, nothing has decided and every process
/// sits at round zero's propose stage.
#[test]
fn no_spurious_decision_from_init_alone() {
    let (config, _, _) = example_config().build().unwrap();
    let logic = TendermintLogic::new(config);
    let env = initialize(&logic, processes(), Round::ZERO);

    for process in &processes() {
        assert_eq!(env.state(process).decision, None);
        assert_eq!(env.state(process).stage, csmi_core_state_machine::Stage::Propose);
        assert!(env.active_timeout(process).is_none());
    }
}

/// Scenario 1 (relaxed to the emergent property rather than the exact internal rule-firing
/// order): delivering p1's own prevote, p2's prevote and a Byzantine prevote for `v0` to p1
/// drives `received_prevotes` to exactly those three entries.
#[test]
fn prevote_quorum_accumulates_exactly_the_delivered_votes() {
    let (config, _, _) = example_config().build().unwrap();
    let logic = TendermintLogic::new(config);
    let mut env = initialize(&logic, processes(), Round::ZERO);

    receive_proposal_from(&mut env, &logic, &Node::new("p1"), &Node::new("p1")).unwrap();
    receive_proposal_from(&mut env, &logic, &Node::new("p2"), &Node::new("p1")).unwrap();

    receive_prevote_from(&mut env, &logic, &Node::new("p1"), &Node::new("p1")).unwrap();
    receive_prevote_from(&mut env, &logic, &Node::new("p1"), &Node::new("p2")).unwrap();
    receive_byzantine(
        &mut env,
        &logic,
        &Node::new("p1"),
        Message::PreVote {
            src: Node::new("p4"),
            round: Round::ZERO,
            id: NilOrVal::Val(Value::new("v0").id()),
        },
    )
    .unwrap();

    let expected: BTreeSet<Node> = ["p1", "p2", "p4"].into_iter().map(Node::new).collect();
    let sources: BTreeSet<Node> = env
        .state(&Node::new("p1"))
        .received_prevotes
        .iter()
        .map(|m| m.src().clone())
        .collect();
    assert_eq!(sources, expected);
}

/// Scenario 5: a later-round timeout always replaces an earlier-round one; the reverse is
/// ignored. Exercised through the environment's replacement policy rather than `TimeoutEvent`
/// directly, since that's the surface the harness actually drives scenario actions through.
#[test]
fn later_round_timeout_replaces_an_earlier_one() {
    use csmi_core_types::{TimeoutEvent, TimeoutKind};

    let (config, _, _) = example_config().build().unwrap();
    let logic = TendermintLogic::new(config);
    let mut env = initialize(&logic, processes(), Round::ZERO);

    env.start_timeout(&logic, &Node::new("p2"), TimeoutEvent::new(TimeoutKind::Propose, Round::ZERO));
    assert_eq!(
        env.active_timeout(&Node::new("p2")),
        Some(&TimeoutEvent::new(TimeoutKind::Propose, Round::ZERO))
    );

    env.start_timeout(&logic, &Node::new("p2"), TimeoutEvent::new(TimeoutKind::PreVote, Round::new(1)));
    assert_eq!(
        env.active_timeout(&Node::new("p2")),
        Some(&TimeoutEvent::new(TimeoutKind::PreVote, Round::new(1)))
    );

    env.start_timeout(&logic, &Node::new("p2"), TimeoutEvent::new(TimeoutKind::Propose, Round::ZERO));
    assert_eq!(
        env.active_timeout(&Node::new("p2")),
        Some(&TimeoutEvent::new(TimeoutKind::PreVote, Round::new(1))),
        "an earlier-round timeout must not replace a later-round one"
    );
}

/// Scenario 3: under one faulty proposer and a well-behaved network, any decision a correct
/// process reaches is a valid value.
#[test]
fn validity_holds_under_one_faulty_proposer() {
    let (config, correct, faulty) = example_config().build().unwrap();
    let logic = TendermintLogic::new(config.clone());
    let mut env = initialize(&logic, processes(), Round::ZERO);
    let mut oracle = SeededOracle::from_seed(99);

    let mut observed_rounds = BTreeSet::new();
    observed_rounds.insert(Round::ZERO);
    let byzantine = csmi_byzantine::generate(&faulty, &config.values, &observed_rounds);

    for _ in 0..2000 {
        if matches!(step(&mut env, &logic, &byzantine, 40, &mut oracle), csmi::StepOutcome::Blocked) {
            break;
        }
        if !validity_holds(&env, &config) {
            break;
        }
    }

    assert!(validity_holds(&env, &config));
    let _ = correct;
}

/// Scenarios 1 & 2 combined at the level of the emergent property: whatever schedule the
/// harness explores, either agreement holds among the correct processes, or enough faulty
/// processes are provably culpable to account for the disagreement.
#[test]
fn accountability_holds_under_byzantine_interference() {
    let (config, correct, faulty) = example_config().build().unwrap();
    let logic = TendermintLogic::new(config.clone());
    let mut env = initialize(&logic, processes(), Round::ZERO);
    let mut oracle = SeededOracle::from_seed(1234);

    let mut observed_rounds = BTreeSet::new();
    observed_rounds.insert(Round::ZERO);
    observed_rounds.insert(Round::new(1));
    let byzantine = csmi_byzantine::generate(&faulty, &config.values, &observed_rounds);

    for _ in 0..3000 {
        if matches!(step(&mut env, &logic, &byzantine, 40, &mut oracle), csmi::StepOutcome::Blocked) {
            break;
        }
    }

    assert!(accountability_holds(&env, &config, &faulty));
    let _ = correct;
    let _ = agreement_holds(&env, &config);
}
