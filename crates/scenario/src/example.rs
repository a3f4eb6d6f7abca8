//! The literal configuration used throughout the end-to-end scenarios: `F = 1`,
//! `CORRECT = {p1, p2, p3}`, `FAULTY = {p4}`, a five-round proposer/value schedule. Also the
//! `csmi-cli` binary's fallback when no `--config` is given.

use std::collections::BTreeMap;

use crate::config::ScenarioConfig;

/// The scenario configuration named throughout this crate's end-to-end tests.
pub fn example_config() -> ScenarioConfig {
    let mut proposer = BTreeMap::new();
    proposer.insert("0".to_string(), "p1".to_string());
    proposer.insert("1".to_string(), "p2".to_string());
    proposer.insert("2".to_string(), "p3".to_string());
    proposer.insert("3".to_string(), "p4".to_string());
    proposer.insert("4".to_string(), "p1".to_string());

    let mut values = BTreeMap::new();
    values.insert("0".to_string(), "v0".to_string());
    values.insert("1".to_string(), "v1".to_string());
    values.insert("2".to_string(), "v0".to_string());
    values.insert("3".to_string(), "v2".to_string());
    values.insert("4".to_string(), "v0".to_string());

    ScenarioConfig {
        f: 1,
        correct: vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
        faulty: vec!["p4".to_string()],
        proposer,
        values,
        timeout_chance: 30,
    }
}
