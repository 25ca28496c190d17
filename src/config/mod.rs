//! Configuration management
//!
//! Peer identity, bind address and discovery tunables, layered from an
//! optional TOML file, the environment and command-line flags.

pub mod settings;

pub use settings::{
    local_host, Config, DiscoverySettings, PartialConfig, ADVERTISE_INTERVAL, DISCOVERY_PORT,
};
