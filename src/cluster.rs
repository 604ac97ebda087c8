//! Local cluster bootstrap
//!
//! Starts the routing server and any number of counter nodes inside the
//! current process, each on its own listener, and registers the nodes on a
//! shared hash ring.

use crate::common::{Config, Error, NodeHandle, Result, SharedRing};
use crate::node::NodeServer;
use crate::router::{NodeClient, RoutingServer};
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Bind the first free port at or above `start`.
///
/// The bound listener is returned so the port cannot be taken between the
/// probe and the node starting to serve.
pub async fn find_available_port(host: IpAddr, start: u16) -> Option<TcpListener> {
    for port in start..=u16::MAX {
        match TcpListener::bind(SocketAddr::new(host, port)).await {
            Ok(listener) => return Some(listener),
            Err(e) => tracing::trace!("Port {} unavailable: {}", port, e),
        }
    }
    None
}

pub struct Cluster {
    ring: SharedRing,
    client: NodeClient,
    router_addr: SocketAddr,
    nodes: Vec<NodeHandle>,
    host: IpAddr,
    next_id: u32,
    next_port: u16,
    tasks: Vec<JoinHandle<()>>,
}

impl Cluster {
    /// Start the routing server with an empty ring
    pub async fn start(config: &Config) -> Result<Self> {
        config.validate()?;

        let ring = SharedRing::new(config.ring.replica_factor);
        let client = NodeClient::new().with_connect_timeout(config.client.connect_timeout());

        let listener = TcpListener::bind(config.router.bind_addr).await?;
        let router_addr = listener.local_addr()?;
        let router = RoutingServer::new(ring.clone(), client);
        let router_task = tokio::spawn(async move {
            if let Err(e) = router.serve_listener(listener).await {
                tracing::error!("Router stopped: {}", e);
            }
        });

        Ok(Self {
            ring,
            client,
            router_addr,
            nodes: Vec::new(),
            host: config.nodes.host,
            next_id: 0,
            next_port: config.nodes.base_port,
            tasks: vec![router_task],
        })
    }

    /// Start the router and `count` nodes
    pub async fn launch(config: &Config, count: usize) -> Result<Self> {
        let mut cluster = Self::start(config).await?;
        cluster.add_nodes(count).await?;
        Ok(cluster)
    }

    /// Start `count` more nodes and place them on the ring.
    ///
    /// Ids continue from the last node started; ports are probed upward from
    /// the last port used.
    pub async fn add_nodes(&mut self, count: usize) -> Result<Vec<NodeHandle>> {
        let mut added = Vec::with_capacity(count);

        for _ in 0..count {
            let listener = find_available_port(self.host, self.next_port)
                .await
                .ok_or_else(|| {
                    Error::Other(format!(
                        "no available port at or above {} for node {}",
                        self.next_port, self.next_id
                    ))
                })?;
            let addr = listener.local_addr()?;
            let node = NodeHandle::new(self.next_id, addr);

            let server = NodeServer::new(node.id);
            self.tasks.push(tokio::spawn(async move {
                if let Err(e) = server.serve_listener(listener).await {
                    tracing::error!("Node stopped: {}", e);
                }
            }));
            self.ring.add_node(node.clone());
            tracing::info!("Started node {} on port {}", node.id, addr.port());

            self.next_id += 1;
            self.next_port = addr.port().saturating_add(1);
            self.nodes.push(node.clone());
            added.push(node);
        }

        Ok(added)
    }

    pub fn router_addr(&self) -> SocketAddr {
        self.router_addr
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    pub fn ring(&self) -> &SharedRing {
        &self.ring
    }

    /// Client configured like the router's
    pub fn client(&self) -> NodeClient {
        self.client
    }

    /// Stop the router and every node
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        self.shutdown();
    }
}
