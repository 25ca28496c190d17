//! Broadcast peer discovery
//!
//! This module handles presence advertisements on the local broadcast
//! domain, the table of peers heard so far, and delivery of payment
//! payloads to a peer by name.

pub mod background;
pub mod discovery;
pub mod peer_table;
pub mod socket;

pub use background::{LoopHandle, LoopState};
pub use discovery::{Observation, PeerDirectory};
pub use peer_table::{Advertisement, PeerRecord, PeerTable};
