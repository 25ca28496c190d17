//! Balance ledger
//!
//! Listens for payment datagrams on the peer's advertised address and keeps
//! a lock-guarded running total that the front end can read and decrease.

pub mod manager;
pub mod payment;

pub use manager::BalanceLedger;
pub use payment::parse_payment;
