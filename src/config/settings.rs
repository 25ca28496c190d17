use crate::error::{PeerPayError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

/// Well-known UDP port for advertisements
pub const DISCOVERY_PORT: u16 = 8829;
/// Delay between two advertisements
pub const ADVERTISE_INTERVAL: Duration = Duration::from_secs(3);

const NAME_KEY: &str = "PEER_NAME";
const ADDRESS_KEY: &str = "PEER_ADDRESS";
const DEBUG_KEY: &str = "PEER_DEBUG";

/// Identity and bind address of this peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    name: String,
    addr: String,
    debug: bool,
}

impl Config {
    pub fn new(name: impl Into<String>, addr: impl Into<String>, debug: bool) -> Result<Config> {
        let name = name.into();
        let addr = addr.into();
        if name.is_empty() {
            return Err(PeerPayError::Config("-name flag is required to be set".to_string()));
        }
        if addr.is_empty() {
            return Err(PeerPayError::Config("-addr flag is required to be set".to_string()));
        }
        if !addr.contains(':') {
            return Err(PeerPayError::InvalidAddress(format!(
                "{addr} (expected host:port, example 192.168.0.103:3030)"
            )));
        }
        Ok(Config { name, addr, debug })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Host portion of the bind address (e.g., "10.0.0.4:3030" -> "10.0.0.4")
    pub fn local_host(&self) -> &str {
        local_host(&self.addr)
    }
}

/// Text before the first `:` of a `host:port` string
pub fn local_host(addr: &str) -> &str {
    addr.split(':').next().unwrap_or(addr)
}

/// Ports and timing used by the discovery loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoverySettings {
    /// Destination of every advertisement
    pub broadcast_addr: SocketAddr,
    /// Port the collector listens on (wildcard address, reuse enabled)
    pub listen_port: u16,
    pub interval: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            broadcast_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, DISCOVERY_PORT)),
            listen_port: DISCOVERY_PORT,
            interval: ADVERTISE_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiscoveryFile {
    broadcast_addr: Option<String>,
    listen_port: Option<u16>,
    interval_ms: Option<u64>,
}

/// One configuration layer; later layers override earlier ones field by field
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub name: Option<String>,
    pub addr: Option<String>,
    pub debug: Option<bool>,
    #[serde(default)]
    discovery: DiscoveryFile,
}

impl PartialConfig {
    /// Load a layer from a TOML file
    pub fn from_file(path: &Path) -> Result<PartialConfig> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PeerPayError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<PartialConfig> {
        Ok(toml::from_str(raw)?)
    }

    /// Layer built from `PEER_NAME`, `PEER_ADDRESS` and `PEER_DEBUG`
    pub fn from_env() -> PartialConfig {
        Self::from_vars(env::vars())
    }

    pub fn from_vars<I>(vars: I) -> PartialConfig
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = PartialConfig::default();
        for (key, value) in vars {
            match key.as_str() {
                NAME_KEY => layer.name = Some(value),
                ADDRESS_KEY => layer.addr = Some(value),
                DEBUG_KEY => {
                    layer.debug = Some(matches!(value.as_str(), "1" | "true" | "yes"))
                }
                _ => {}
            }
        }
        layer
    }

    /// Layer built from command-line flags
    pub fn from_flags(name: Option<String>, addr: Option<String>, debug: bool) -> PartialConfig {
        PartialConfig {
            name,
            addr,
            // an absent --debug flag must not switch off a file or env toggle
            debug: debug.then_some(true),
            discovery: DiscoveryFile::default(),
        }
    }

    pub fn merge(self, over: PartialConfig) -> PartialConfig {
        PartialConfig {
            name: over.name.or(self.name),
            addr: over.addr.or(self.addr),
            debug: over.debug.or(self.debug),
            discovery: DiscoveryFile {
                broadcast_addr: over.discovery.broadcast_addr.or(self.discovery.broadcast_addr),
                listen_port: over.discovery.listen_port.or(self.discovery.listen_port),
                interval_ms: over.discovery.interval_ms.or(self.discovery.interval_ms),
            },
        }
    }

    pub fn build(self) -> Result<(Config, DiscoverySettings)> {
        let config = Config::new(
            self.name.unwrap_or_default(),
            self.addr.unwrap_or_default(),
            self.debug.unwrap_or(false),
        )?;

        let mut settings = DiscoverySettings::default();
        if let Some(addr) = self.discovery.broadcast_addr {
            let parsed: SocketAddrV4 = addr
                .parse()
                .map_err(|e| PeerPayError::InvalidAddress(format!("{addr}: {e}")))?;
            settings.broadcast_addr = SocketAddr::V4(parsed);
        }
        if let Some(port) = self.discovery.listen_port {
            settings.listen_port = port;
        }
        if let Some(ms) = self.discovery.interval_ms {
            if ms == 0 {
                return Err(PeerPayError::Config("discovery interval must be positive".to_string()));
            }
            settings.interval = Duration::from_millis(ms);
        }

        Ok((config, settings))
    }
}
