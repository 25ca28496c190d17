//! # PeerPay - serverless peer discovery with a networked balance
//!
//! Peers on one broadcast domain find each other without a registry and pay
//! each other by sending plain decimal amounts over UDP.
//!
//! ## Layout
//! - `network/`: broadcast advertiser and collector, the peer table, delivery by name
//! - `ledger/`: the payment receive loop and the running balance
//! - `config/`: peer identity, bind address and discovery tunables
//! - `cli/`: flags and the interactive `balance` / `pay` / `exit` loop
//! - `error/`: the shared error type
//!
//! ## Threads
//! Three loops run for the life of the process, each on its own OS thread:
//! advertise, collect and receive. None of them can be cancelled; each stops
//! only on its first socket error. The peer table and the balance each sit
//! behind their own mutex and no lock is held across network I/O.
//!
//! ## Known limitation
//! The collector drops any datagram that contains the local name as a
//! substring, so "Bob" will never learn about "Bobby".

pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod network;

#[cfg(test)]
pub mod testnet;

pub use cli::{BalanceManager, Command, Keyboard, Opt, PaymentSender};
pub use config::{Config, DiscoverySettings, PartialConfig, DISCOVERY_PORT};
pub use error::{PeerPayError, Result};
pub use ledger::{parse_payment, BalanceLedger};
pub use network::{
    Advertisement, LoopHandle, LoopState, Observation, PeerDirectory, PeerRecord, PeerTable,
};
