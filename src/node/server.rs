//! Counter node server

use crate::common::protocol::{self, INVALID_REQUEST, UNKNOWN_COMMAND, UPDATE_OK};
use crate::common::{Request, Result};
use crate::node::store::CounterStore;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

pub struct NodeServer {
    node_id: u32,
    store: Arc<CounterStore>,
}

impl NodeServer {
    pub fn new(node_id: u32) -> Self {
        Self {
            node_id,
            store: Arc::new(CounterStore::new()),
        }
    }

    /// Handle to this node's counters
    pub fn store(&self) -> Arc<CounterStore> {
        self.store.clone()
    }

    /// Serve connections from an already bound listener, forever
    pub async fn serve_listener(self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        tracing::info!("Node {} listening on {}", self.node_id, local);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("Node {} accept error: {}", self.node_id, e);
                    continue;
                }
            };

            let store = self.store.clone();
            let node_id = self.node_id;
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &store).await {
                    tracing::warn!(node_id, %peer, "Connection error: {}", e);
                }
            });
        }
    }
}

async fn handle_connection(mut stream: TcpStream, store: &CounterStore) -> Result<()> {
    let raw = protocol::read_request(&mut stream).await?;
    let response = respond(store, &raw);
    protocol::write_frame(&mut stream, &response).await
}

/// Apply one raw request to `store` and render the reply
pub fn respond(store: &CounterStore, raw: &str) -> String {
    match Request::parse(raw) {
        Ok(Request::Update(event)) => {
            let count = store.update(&event);
            tracing::debug!(%event, count, "update");
            UPDATE_OK.to_string()
        }
        Ok(Request::Get(event)) => protocol::count_line(&event, store.get(&event)),
        Ok(Request::Status) => store.status(),
        Ok(Request::Unknown(command)) => {
            tracing::warn!("Unknown command: {}", command);
            UNKNOWN_COMMAND.to_string()
        }
        Err(e) => {
            tracing::warn!("Invalid request {:?}: {}", raw, e);
            INVALID_REQUEST.to_string()
        }
    }
}
