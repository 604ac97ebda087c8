//! Configuration for eventring components
//!
//! Values come from an optional TOML file layered with `EVENTRING_*`
//! environment variables (`EVENTRING_RING__REPLICA_FACTOR=5`). Command line
//! flags are applied on top by the binary.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "eventring.toml";

const ENV_PREFIX: &str = "EVENTRING";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub ring: RingConfig,

    #[serde(default)]
    pub nodes: NodesConfig,

    #[serde(default)]
    pub client: ClientConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            ring: RingConfig::default(),
            nodes: NodesConfig::default(),
            client: ClientConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Routing server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Client-facing listen address
    #[serde(default = "default_router_addr")]
    pub bind_addr: SocketAddr,
}

fn default_router_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4000))
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_router_addr(),
        }
    }
}

/// Hash ring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingConfig {
    /// Virtual nodes per physical node
    #[serde(default = "default_replica_factor")]
    pub replica_factor: usize,
}

fn default_replica_factor() -> usize {
    3
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replica_factor: default_replica_factor(),
        }
    }
}

/// Counter node bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesConfig {
    /// Number of nodes to start; the console prompts when unset
    #[serde(default)]
    pub count: Option<usize>,

    /// First port probed for node listeners
    #[serde(default = "default_base_port")]
    pub base_port: u16,

    /// Interface node listeners bind to
    #[serde(default = "default_node_host")]
    pub host: IpAddr,
}

fn default_base_port() -> u16 {
    5000
}

fn default_node_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            count: None,
            base_port: default_base_port(),
            host: default_node_host(),
        }
    }
}

/// Node transport client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Dial timeout; unset waits indefinitely
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load from `eventring.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit file (required) or the default one (optional)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ring.replica_factor == 0 {
            return Err(Error::InvalidConfig(
                "ring.replica_factor must be at least 1".into(),
            ));
        }
        if self.nodes.count == Some(0) {
            return Err(Error::InvalidConfig(
                "nodes.count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
