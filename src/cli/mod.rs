//! Command-line interface
//!
//! Startup flags and the interactive loop that reads `balance`, `pay` and
//! `exit` commands and drives the ledger and the peer directory.

pub mod commands;
pub mod keyboard;

pub use commands::Opt;
pub use keyboard::{BalanceManager, Command, CommandError, Keyboard, PaymentSender};
