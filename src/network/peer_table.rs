use crate::error::{PeerPayError, Result};
use log::error;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// A peer heard on the broadcast domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    /// Opaque token chosen by the peer, kept byte for byte
    pub name: Vec<u8>,
    /// `host:port` the peer's ledger listens on
    pub address: String,
}

/// Wire form of an advertisement: `<name> <host:port>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advertisement<'a> {
    pub name: &'a [u8],
    pub address: &'a [u8],
}

impl<'a> Advertisement<'a> {
    pub fn encode(name: &str, address: &str) -> Vec<u8> {
        format!("{name} {address}").into_bytes()
    }

    /// Split on the first space. Everything after it is the address.
    pub fn parse(datagram: &'a [u8]) -> Result<Advertisement<'a>> {
        let (name, address) = split_first_space(datagram).ok_or_else(|| {
            PeerPayError::MalformedAdvertisement(String::from_utf8_lossy(datagram).into_owned())
        })?;
        Ok(Advertisement { name, address })
    }
}

pub(crate) fn split_first_space(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let at = bytes.iter().position(|b| *b == b' ')?;
    Some((&bytes[..at], &bytes[at + 1..]))
}

/// Name -> address map. The first address seen for a name is kept for good.
#[derive(Debug, Default)]
pub struct PeerTable {
    inner: Mutex<HashMap<Vec<u8>, String>>,
}

impl PeerTable {
    pub fn new() -> PeerTable {
        PeerTable {
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Vec<u8>, String>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            error!("Peer table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Insert unless `name` is already known. Returns true when inserted.
    pub fn insert_if_absent(&self, name: &[u8], address: &str) -> bool {
        match self.lock().entry(name.to_vec()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(address.to_string());
                true
            }
        }
    }

    pub fn get(&self, name: &[u8]) -> Option<String> {
        self.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn records(&self) -> Vec<PeerRecord> {
        let mut records: Vec<PeerRecord> = self
            .lock()
            .iter()
            .map(|(name, address)| PeerRecord {
                name: name.clone(),
                address: address.clone(),
            })
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}
