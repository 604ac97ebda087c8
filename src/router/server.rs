//! Client-facing routing server
//!
//! Each connection carries one request. `get`/`update` are forwarded to the
//! event's owner on the hash ring; `status` fans out to every node in turn.

use crate::common::protocol::{
    self, EVENT_NOT_FOUND, INVALID_REQUEST, NO_NODES, REQUEST_FAILED, UNKNOWN_COMMAND, UPDATE_OK,
};
use crate::common::{Error, NodeHandle, Request, Result, SharedRing};
use crate::router::client::NodeClient;
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone)]
pub struct RoutingServer {
    ring: SharedRing,
    client: NodeClient,
}

impl RoutingServer {
    pub fn new(ring: SharedRing, client: NodeClient) -> Self {
        Self { ring, client }
    }

    pub fn ring(&self) -> &SharedRing {
        &self.ring
    }

    /// Serve connections from an already bound listener, forever
    pub async fn serve_listener(self, listener: TcpListener) -> Result<()> {
        tracing::info!("Router listening on {}", listener.local_addr()?);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("Router accept error: {}", e);
                    continue;
                }
            };

            let router = self.clone();
            tokio::spawn(async move {
                if let Err(e) = router.handle_connection(stream).await {
                    tracing::warn!(%peer, "Connection error: {}", e);
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> Result<()> {
        let raw = protocol::read_request(&mut stream).await?;
        let response = self.handle_request(&raw).await;
        protocol::write_frame(&mut stream, &response).await
    }

    /// Route one raw request and produce the client-visible reply
    pub async fn handle_request(&self, raw: &str) -> String {
        let request = match Request::parse(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Invalid request {:?}: {}", raw, e);
                return INVALID_REQUEST.to_string();
            }
        };

        match request {
            Request::Update(event) => self.update(&event).await,
            Request::Get(event) => self.get(&event).await,
            Request::Status => self.status().await,
            Request::Unknown(command) => {
                tracing::debug!("Unknown command: {}", command);
                UNKNOWN_COMMAND.to_string()
            }
        }
    }

    fn owner(&self, event: &str) -> Result<NodeHandle> {
        self.ring.resolve(event).ok_or(Error::EmptyRing)
    }

    async fn update(&self, event: &str) -> String {
        let result = match self.owner(event) {
            Ok(node) => match self.client.update(node.addr, event).await {
                Ok(reply) if reply == UPDATE_OK => Ok(node),
                Ok(reply) => Err(Error::Protocol(format!(
                    "unexpected reply from {}: {:?}",
                    node, reply
                ))),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(node) => {
                tracing::debug!(%event, %node, "update routed");
                UPDATE_OK.to_string()
            }
            Err(e) => {
                tracing::warn!(%event, "Error handling update: {}", e);
                REQUEST_FAILED.to_string()
            }
        }
    }

    async fn get(&self, event: &str) -> String {
        let result = match self.owner(event) {
            Ok(node) => self.client.get(node.addr, event).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(%event, "Error handling get: {}", e);
            EVENT_NOT_FOUND.to_string()
        })
    }

    /// Sequential fan-out to every node on the ring
    async fn status(&self) -> String {
        let nodes = self.ring.nodes();
        if nodes.is_empty() {
            return NO_NODES.to_string();
        }

        let mut out = String::new();
        for node in nodes {
            match self.client.status(node.addr).await {
                Ok(text) => {
                    out.push_str(&format!("Node {} on {}:\n", node.id, node.addr));
                    out.push_str(&text);
                }
                Err(e) => {
                    tracing::warn!(%node, "Status failed: {}", e);
                    out.push_str(&format!("Node {} on {}: unreachable\n", node.id, node.addr));
                }
            }
        }
        out
    }
}
