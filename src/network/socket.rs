use crate::error::{PeerPayError, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};

/// Bind a UDP socket on `0.0.0.0:port` with address and port reuse enabled,
/// so several peers on one host can all receive the same broadcast.
pub fn bind_shared(port: u16) -> Result<UdpSocket> {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| PeerPayError::Network(format!("Failed to create socket: {e}")))?;

    socket
        .set_reuse_address(true)
        .map_err(|e| PeerPayError::Network(format!("Failed to set SO_REUSEADDR: {e}")))?;
    #[cfg(unix)]
    socket
        .set_reuse_port(true)
        .map_err(|e| PeerPayError::Network(format!("Failed to set SO_REUSEPORT: {e}")))?;

    socket.bind(&addr.into()).map_err(|e| {
        PeerPayError::Network(format!("Failed to listen broadcast packet on {addr}: {e}"))
    })?;

    Ok(socket.into())
}

/// Ephemeral socket associated with `target`, so failures surface as write errors
pub fn connect_broadcast(target: SocketAddr) -> Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(|e| {
        PeerPayError::Network(format!("Failed to allocate broadcast address: {e}"))
    })?;
    socket
        .set_broadcast(true)
        .map_err(|e| PeerPayError::Network(format!("Failed to enable broadcast: {e}")))?;
    socket.connect(target).map_err(|e| {
        PeerPayError::Network(format!("Failed to allocate broadcast address {target}: {e}"))
    })?;
    Ok(socket)
}

/// Resolve a `host:port` string to its first IPv4 address
pub fn resolve_ipv4(addr: &str) -> Result<SocketAddr> {
    let mut candidates = addr
        .to_socket_addrs()
        .map_err(|e| PeerPayError::InvalidAddress(format!("{addr}: {e}")))?;
    candidates
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| PeerPayError::InvalidAddress(format!("{addr}: no IPv4 address")))
}

/// Open a one-shot association to `addr`, write `payload`, and drop the socket
pub fn send_once(addr: &str, payload: &[u8]) -> Result<usize> {
    let target = resolve_ipv4(addr).map_err(|e| PeerPayError::DialFailed(e.to_string()))?;
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|e| PeerPayError::DialFailed(e.to_string()))?;
    socket
        .connect(target)
        .map_err(|e| PeerPayError::DialFailed(format!("{target}: {e}")))?;
    socket
        .send(payload)
        .map_err(|e| PeerPayError::WriteFailed(format!("{target}: {e}")))
}
