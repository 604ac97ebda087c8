//! Transport client for counter nodes
//!
//! Every call dials a fresh connection, exchanges one request frame and one
//! response frame, then drops the connection. No pooling, no retry.

use crate::common::protocol;
use crate::common::{Error, Request, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeClient {
    connect_timeout: Option<Duration>,
}

impl NodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the dial; without it a hung node stalls the caller indefinitely
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn connect(&self, addr: SocketAddr) -> Result<TcpStream> {
        let dial = TcpStream::connect(addr);
        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, dial)
                .await
                .map_err(|_| Error::Timeout(format!("connect to {}", addr)))?,
            None => dial.await,
        };
        stream.map_err(|e| Error::ConnectionFailed(format!("{}: {}", addr, e)))
    }

    /// Send `request` verbatim and return the node's reply
    pub async fn send(&self, addr: SocketAddr, request: &str) -> Result<String> {
        let mut stream = self.connect(addr).await?;
        protocol::write_frame(&mut stream, request).await?;
        protocol::read_response(&mut stream).await
    }

    pub async fn update(&self, addr: SocketAddr, event: &str) -> Result<String> {
        self.send(addr, &Request::Update(event.to_string()).to_string())
            .await
    }

    pub async fn get(&self, addr: SocketAddr, event: &str) -> Result<String> {
        self.send(addr, &Request::Get(event.to_string()).to_string())
            .await
    }

    pub async fn status(&self, addr: SocketAddr) -> Result<String> {
        self.send(addr, &Request::Status.to_string()).await
    }
}
