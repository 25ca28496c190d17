use crate::config::{local_host, DiscoverySettings};
use crate::error::{PeerPayError, Result};
use crate::network::background::LoopHandle;
use crate::network::peer_table::{split_first_space, Advertisement, PeerRecord, PeerTable};
use crate::network::socket;
use log::{debug, warn};
use std::io;
use std::sync::Arc;
use std::thread;

const READ_BUFFER_SIZE: usize = 1024;

/// What the collector did with one datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Datagram mentions our own name somewhere and was dropped
    OwnAdvertisement,
    /// No separator between name and address
    Malformed,
    NewPeer(PeerRecord),
    /// Name already recorded; the stored address was left untouched
    KnownPeer,
}

/// Broadcast-based peer discovery with point-to-point delivery by name
///
/// Two loops start in the constructor and run until their first socket error:
/// - the advertiser sends `<name> <addr>` to the broadcast address every interval
/// - the collector records every other peer it hears, first-seen-wins
pub struct PeerDirectory {
    name: String,
    local_host: String,
    peers: Arc<PeerTable>,
    advertiser: LoopHandle,
    collector: LoopHandle,
}

impl PeerDirectory {
    /// Start discovery on the well-known port
    pub fn new(name: &str, local_addr: &str) -> Result<PeerDirectory> {
        Self::with_settings(name, local_addr, DiscoverySettings::default())
    }

    pub fn with_settings(
        name: &str,
        local_addr: &str,
        settings: DiscoverySettings,
    ) -> Result<PeerDirectory> {
        if name.is_empty() {
            return Err(PeerPayError::Config("peer name must not be empty".to_string()));
        }

        let peers = Arc::new(PeerTable::new());
        let advertisement = Advertisement::encode(name, local_addr);

        let advertiser =
            LoopHandle::spawn("advertise", move || advertise(advertisement, settings))?;

        let own_name = name.as_bytes().to_vec();
        let table = Arc::clone(&peers);
        let collector = LoopHandle::spawn("collect", move || {
            collect(&own_name, &table, settings.listen_port)
        })?;

        Ok(PeerDirectory {
            name: name.to_string(),
            local_host: local_host(local_addr).to_string(),
            peers,
            advertiser,
            collector,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_host(&self) -> &str {
        &self.local_host
    }

    pub fn peers(&self) -> Vec<PeerRecord> {
        self.peers.records()
    }

    pub fn peer_address(&self, name: &[u8]) -> Option<String> {
        self.peers.get(name)
    }

    pub fn advertiser(&self) -> &LoopHandle {
        &self.advertiser
    }

    pub fn collector(&self) -> &LoopHandle {
        &self.collector
    }

    /// Give up the directory and keep the loop handles, e.g. to join them
    pub fn into_loops(self) -> (LoopHandle, LoopHandle) {
        (self.advertiser, self.collector)
    }

    /// Apply one received datagram to the peer table, exactly as the collector does
    pub fn observe(&self, datagram: &[u8]) -> Observation {
        observe(self.name.as_bytes(), &self.peers, datagram)
    }

    /// Deliver `amount` to the peer recorded under `name`
    ///
    /// Fails with `PeerNotConnected` before any socket is opened when the
    /// name was never advertised. Each call uses its own short-lived socket.
    pub fn send(&self, name: &[u8], amount: &[u8]) -> Result<usize> {
        // lock released here, before any I/O
        let address = self.peers.get(name).ok_or_else(|| {
            PeerPayError::PeerNotConnected(String::from_utf8_lossy(name).into_owned())
        })?;
        socket::send_once(&address, amount)
    }

    /// Route a `<name> <amount>` envelope; only the amount goes on the wire
    pub fn send_envelope(&self, envelope: &[u8]) -> Result<usize> {
        let (name, amount) = split_first_space(envelope).ok_or_else(|| {
            PeerPayError::MalformedEnvelope(String::from_utf8_lossy(envelope).into_owned())
        })?;
        self.send(name, amount)
    }
}

/// Envelope writer. The returned count is the number of amount bytes sent.
impl io::Write for &PeerDirectory {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.send_envelope(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for PeerDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerDirectory")
            .field("name", &self.name)
            .field("local_host", &self.local_host)
            .field("peers", &self.peers.len())
            .finish()
    }
}

fn advertise(advertisement: Vec<u8>, settings: DiscoverySettings) -> Result<()> {
    let broadcast = socket::connect_broadcast(settings.broadcast_addr)?;
    loop {
        thread::sleep(settings.interval);
        broadcast.send(&advertisement).map_err(|e| {
            PeerPayError::WriteFailed(format!("failed to write broadcast message: {e}"))
        })?;
    }
}

fn collect(own_name: &[u8], peers: &PeerTable, port: u16) -> Result<()> {
    let conn = socket::bind_shared(port)?;
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    loop {
        let (n, _) = conn.recv_from(&mut buffer).map_err(|e| {
            PeerPayError::Network(format!(
                "failed to read from broadcast to collect peers: {e}"
            ))
        })?;
        observe(own_name, peers, &buffer[..n]);
    }
}

/// Substring match over the whole datagram, so a peer whose advertisement
/// merely contains our name (e.g. "Bobby" when we are "Bob") is dropped too.
fn is_own_advertisement(own_name: &[u8], datagram: &[u8]) -> bool {
    own_name.is_empty()
        || datagram
            .windows(own_name.len())
            .any(|window| window == own_name)
}

fn observe(own_name: &[u8], peers: &PeerTable, datagram: &[u8]) -> Observation {
    if is_own_advertisement(own_name, datagram) {
        return Observation::OwnAdvertisement;
    }

    let ad = match Advertisement::parse(datagram) {
        Ok(ad) => ad,
        Err(e) => {
            warn!("Dropping advertisement: {e}");
            return Observation::Malformed;
        }
    };

    let record = PeerRecord {
        name: ad.name.to_vec(),
        address: String::from_utf8_lossy(ad.address).into_owned(),
    };
    if peers.insert_if_absent(&record.name, &record.address) {
        debug!(
            "New peer has been collected: {}",
            String::from_utf8_lossy(datagram)
        );
        Observation::NewPeer(record)
    } else {
        Observation::KnownPeer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::background::LoopState;
    use crate::testnet::test_utils::{quiet_settings, wait_until};
    use std::io::Write;
    use std::net::UdpSocket;
    use std::time::Duration;

    fn directory(name: &str) -> PeerDirectory {
        PeerDirectory::with_settings(name, "127.0.0.1:3030", quiet_settings()).unwrap()
    }

    #[test]
    fn test_observe_records_new_peer() {
        let dir = directory("Alice");
        assert_eq!(dir.name(), "Alice");
        assert_eq!(dir.local_host(), "127.0.0.1");

        let seen = dir.observe(b"Bob 127.0.0.1:3031");
        assert_eq!(
            seen,
            Observation::NewPeer(PeerRecord {
                name: b"Bob".to_vec(),
                address: "127.0.0.1:3031".to_string(),
            })
        );
        assert_eq!(dir.peer_address(b"Bob").as_deref(), Some("127.0.0.1:3031"));
    }

    #[test]
    fn test_observe_keeps_first_address() {
        let dir = directory("Alice");
        dir.observe(b"Bob 127.0.0.1:3031");
        assert_eq!(dir.observe(b"Bob 10.9.9.9:1"), Observation::KnownPeer);
        assert_eq!(dir.peer_address(b"Bob").as_deref(), Some("127.0.0.1:3031"));
    }

    #[test]
    fn test_non_utf8_names_are_distinct_peers() {
        let dir = directory("Alice");
        assert!(matches!(
            dir.observe(b"\xff 127.0.0.1:1"),
            Observation::NewPeer(_)
        ));
        assert!(matches!(
            dir.observe(b"\xfe 127.0.0.1:2"),
            Observation::NewPeer(_)
        ));

        assert_eq!(dir.peer_address(b"\xff").as_deref(), Some("127.0.0.1:1"));
        assert_eq!(dir.peer_address(b"\xfe").as_deref(), Some("127.0.0.1:2"));
        assert!(matches!(
            dir.send(b"\xfd", b"5"),
            Err(PeerPayError::PeerNotConnected(_))
        ));
    }

    #[test]
    fn test_observe_drops_own_name_as_substring() {
        let dir = directory("Bob");
        assert_eq!(
            dir.observe(b"BobbyAdvert 1.2.3.4:9"),
            Observation::OwnAdvertisement
        );
        assert_eq!(dir.observe(b"Bob 127.0.0.1:3030"), Observation::OwnAdvertisement);
        assert!(dir.peers().is_empty());
    }

    #[test]
    fn test_observe_drops_malformed() {
        let dir = directory("Alice");
        assert_eq!(dir.observe(b"NoAddress"), Observation::Malformed);
        assert!(dir.peers().is_empty());
    }

    #[test]
    fn test_send_to_unknown_peer_fails() {
        let dir = directory("Alice");
        assert_eq!(
            dir.send(b"Carol", b"5"),
            Err(PeerPayError::PeerNotConnected("Carol".to_string()))
        );
    }

    #[test]
    fn test_send_delivers_amount_only() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let addr = receiver.local_addr().unwrap();

        let dir = directory("Alice");
        dir.observe(format!("Bob {addr}").as_bytes());

        let mut writer = &dir;
        assert_eq!(writer.write(b"Bob 15").unwrap(), 2);

        let mut buffer = [0u8; 64];
        let n = receiver.recv(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"15");
    }

    #[test]
    fn test_envelope_without_amount_is_rejected() {
        let dir = directory("Alice");
        assert_eq!(
            dir.send_envelope(b"Bob"),
            Err(PeerPayError::MalformedEnvelope("Bob".to_string()))
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(PeerDirectory::with_settings("", "127.0.0.1:3030", quiet_settings()).is_err());
    }

    // A connected UDP socket reports the ICMP port-unreachable of one send
    // as ECONNREFUSED on the next one.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_advertiser_stops_on_write_error() {
        let settings = DiscoverySettings {
            interval: Duration::from_millis(20),
            ..quiet_settings()
        };
        let dir = PeerDirectory::with_settings("Alice", "127.0.0.1:3030", settings).unwrap();

        assert!(wait_until(Duration::from_secs(5), || dir
            .advertiser()
            .state()
            == LoopState::Stopped));
        assert_eq!(dir.collector().state(), LoopState::Running);

        let (advertiser, _collector) = dir.into_loops();
        assert_eq!(advertiser.name(), "advertise");
        assert!(matches!(
            advertiser.join(),
            Err(PeerPayError::WriteFailed(_))
        ));
    }
}
