use crate::error::{PeerPayError, Result};
use crate::ledger::payment::parse_payment;
use crate::network::background::{LoopHandle, LoopState};
use crate::network::socket::resolve_ipv4;
use log::{debug, error};
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex, MutexGuard};

const READ_BUFFER_SIZE: usize = 1024;

/// Running balance, credited by payments received on the peer's own address
///
/// The receive loop stops for good on its first socket read error;
/// `receiver().state()` then reports `Stopped`.
pub struct BalanceLedger {
    balance: Arc<Mutex<i64>>,
    local_addr: SocketAddr,
    receiver: LoopHandle,
}

impl BalanceLedger {
    /// Bind `addr` (IPv4 `host:port`) and start receiving payments
    ///
    /// An address that does not resolve or cannot be bound is fatal here.
    pub fn new(addr: &str) -> Result<BalanceLedger> {
        let target = resolve_ipv4(addr)?;
        let conn = UdpSocket::bind(target)
            .map_err(|e| PeerPayError::Network(format!("Failed to bind to {target}: {e}")))?;
        Self::start(conn)
    }

    /// Start receiving payments on an already bound socket
    fn start(conn: UdpSocket) -> Result<BalanceLedger> {
        let local_addr = conn.local_addr()?;

        let balance = Arc::new(Mutex::new(0));
        let shared = Arc::clone(&balance);
        let receiver = LoopHandle::spawn("receive", move || keep_updating(conn, &shared))?;

        Ok(BalanceLedger {
            balance,
            local_addr,
            receiver,
        })
    }

    pub fn balance(&self) -> i64 {
        *lock(&self.balance)
    }

    /// Subtract `value`. There is no lower bound.
    pub fn decrease(&self, value: i64) {
        let mut balance = lock(&self.balance);
        *balance = balance.wrapping_sub(value);
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn receiver(&self) -> &LoopHandle {
        &self.receiver
    }

    pub fn is_receiving(&self) -> bool {
        self.receiver.state() == LoopState::Running
    }
}

impl std::fmt::Debug for BalanceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceLedger")
            .field("balance", &self.balance())
            .field("local_addr", &self.local_addr)
            .field("receiver", &self.receiver)
            .finish()
    }
}

fn lock(balance: &Mutex<i64>) -> MutexGuard<'_, i64> {
    balance.lock().unwrap_or_else(|poisoned| {
        error!("Balance lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

fn keep_updating(conn: UdpSocket, balance: &Mutex<i64>) -> Result<()> {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    loop {
        let n = conn.recv(&mut buffer).map_err(|e| {
            PeerPayError::Network(format!("failed to read udp in keep_updating: {e}"))
        })?;

        let payment = match parse_payment(&buffer[..n]) {
            Ok(payment) => payment,
            Err(e) => {
                error!("invalid balance received: {e}");
                continue;
            }
        };

        let mut current = lock(balance);
        debug!("received payment of {payment}, updating balance");
        *current = current.wrapping_add(payment);
    }
}
