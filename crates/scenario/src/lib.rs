//! Named scenario actions over a Tendermint [`csmi::Environment`], a TOML-loadable
//! [`ScenarioConfig`], and the literal configuration shared by this crate's end-to-end tests.
//!
//! Nothing here participates in the protocol: this crate is the deterministic-trace-construction
//! and configuration layer the test suite and `csmi-cli` binary are built on top of.

pub mod actions;
pub mod config;
pub mod error;
pub mod example;

pub use config::ScenarioConfig;
pub use error::Error;
pub use example::example_config;
