//! `ScenarioConfig`: the TOML-loadable surface naming `F`, the node partition, the proposer and
//! value functions, and the timeout-branch coin-flip probability — the same pairing (`serde` +
//! `toml`) the grounding repo's node `config` crate uses for its own `config.toml`.

use std::collections::{BTreeMap, BTreeSet};

use csmi_core_state_machine::Config;
use csmi_core_types::{Node, Round, Value};
use serde::{Deserialize, Serialize};

/// A scenario configuration as it appears on disk. TOML table keys must be strings, so rounds
/// and values are carried as their string forms and parsed in [`ScenarioConfig::build`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// The number of Byzantine processes tolerated.
    pub f: u32,
    /// Names of the processes that follow the protocol faithfully.
    pub correct: Vec<String>,
    /// Names of the processes free to deviate from the protocol.
    pub faulty: Vec<String>,
    /// Round number (as a string) -> proposer name.
    pub proposer: BTreeMap<String, String>,
    /// Round number (as a string) -> the value its proposer would propose.
    pub values: BTreeMap<String, String>,
    /// Probability, out of 100, that the timeout branch is taken when it is enabled.
    pub timeout_chance: u8,
}

/// A parsed error while turning a [`ScenarioConfig`]'s round keys into [`Round`]s.
#[derive(Debug, thiserror::Error)]
#[error("round key {0:?} is not a non-negative integer")]
pub struct InvalidRoundKey(pub String);

impl ScenarioConfig {
    /// Parse a configuration from its TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Render this configuration as TOML text.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The node sets and fixed configuration built from this scenario configuration.
    pub fn build(&self) -> Result<(Config, BTreeSet<Node>, BTreeSet<Node>), InvalidRoundKey> {
        let correct: BTreeSet<Node> = self.correct.iter().map(|n| Node::new(n.clone())).collect();
        let faulty: BTreeSet<Node> = self.faulty.iter().map(|n| Node::new(n.clone())).collect();

        let mut proposer = BTreeMap::new();
        for (round, node) in &self.proposer {
            proposer.insert(parse_round(round)?, Node::new(node.clone()));
        }

        let mut values = BTreeMap::new();
        for (round, value) in &self.values {
            values.insert(parse_round(round)?, Value::new(value.clone()));
        }

        let config = Config::new(self.f, proposer, values, correct.clone());
        Ok((config, correct, faulty))
    }
}

fn parse_round(key: &str) -> Result<Round, InvalidRoundKey> {
    key.parse::<u32>()
        .map(Round::new)
        .map_err(|_| InvalidRoundKey(key.to_string()))
}
