//! Testing utilities
//!
//! Helpers for exercising the discovery and ledger loops over loopback sockets.

pub mod test_utils;
