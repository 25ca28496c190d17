//! Test utilities for loopback networking

use crate::config::DiscoverySettings;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

/// Ask the OS for a UDP port that is free right now
pub fn free_port() -> u16 {
    UdpSocket::bind("127.0.0.1:0")
        .and_then(|socket| socket.local_addr())
        .map(|addr| addr.port())
        .expect("loopback bind should succeed in tests")
}

/// Discovery settings that neither hit the real broadcast port nor
/// advertise during a test run
pub fn quiet_settings() -> DiscoverySettings {
    DiscoverySettings {
        broadcast_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, free_port())),
        listen_port: free_port(),
        interval: Duration::from_secs(3600),
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
