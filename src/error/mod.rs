//! Error handling for the peer services
//!
//! This module provides the error type shared by discovery, the ledger,
//! configuration loading and the front end.

use std::fmt;

/// Result type alias for peer operations
pub type Result<T> = std::result::Result<T, PeerPayError>;

/// Error types for peer discovery and payments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerPayError {
    /// Payment addressed to a name that was never advertised
    PeerNotConnected(String),
    /// Could not open the outbound association to a peer
    DialFailed(String),
    /// Could not write the payload to a peer
    WriteFailed(String),
    /// Socket setup or read errors
    Network(String),
    /// Bind address could not be parsed or resolved
    InvalidAddress(String),
    /// Payment payload is not a signed decimal integer
    InvalidPayment(String),
    /// Advertisement without the name/address separator
    MalformedAdvertisement(String),
    /// Payment envelope without the recipient/amount separator
    MalformedEnvelope(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for PeerPayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerPayError::PeerNotConnected(name) => write!(f, "peer not connected: {name}"),
            PeerPayError::DialFailed(msg) => write!(f, "failed to dial, {msg}"),
            PeerPayError::WriteFailed(msg) => write!(f, "failed to write, {msg}"),
            PeerPayError::Network(msg) => write!(f, "Network error: {msg}"),
            PeerPayError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            PeerPayError::InvalidPayment(msg) => write!(f, "Invalid payment: {msg}"),
            PeerPayError::MalformedAdvertisement(msg) => {
                write!(f, "Malformed advertisement: {msg}")
            }
            PeerPayError::MalformedEnvelope(msg) => {
                write!(f, "Malformed payment envelope: {msg}")
            }
            PeerPayError::Config(msg) => write!(f, "Configuration error: {msg}"),
            PeerPayError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for PeerPayError {}

impl From<std::io::Error> for PeerPayError {
    fn from(err: std::io::Error) -> Self {
        PeerPayError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for PeerPayError {
    fn from(err: toml::de::Error) -> Self {
        PeerPayError::Config(err.to_string())
    }
}

impl From<PeerPayError> for std::io::Error {
    fn from(err: PeerPayError) -> Self {
        let kind = match err {
            PeerPayError::PeerNotConnected(_) => std::io::ErrorKind::NotConnected,
            PeerPayError::MalformedEnvelope(_) => std::io::ErrorKind::InvalidInput,
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}
