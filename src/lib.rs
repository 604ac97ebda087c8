//! # eventring
//!
//! Event counters sharded across local nodes with a consistent hash ring:
//! - FNV-1a hash ring with virtual nodes per counter node
//! - One in-memory counter store per node, served over TCP
//! - A routing server that forwards each event to its owner
//! - Length-prefixed text frames on every hop
//!
//! ## Architecture
//!
//! ```text
//!        client / console
//!              │ "update click"
//!      ┌───────▼────────┐
//!      │ RoutingServer  │── HashRing::resolve("click")
//!      └───────┬────────┘
//!              │ NodeClient (one connection per request)
//!   ┌──────────┼──────────────┐
//! ┌─▼──────┐ ┌─▼──────┐  ┌────▼───┐
//! │ node 0 │ │ node 1 │  │ node 2 │
//! │counters│ │counters│  │counters│
//! └────────┘ └────────┘  └────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start a router on :4000 with three nodes and drop into the console
//! eventring --nodes 3 --replicas 3
//! > update click
//! Update successful
//! > get click
//! Count for click: 1
//! ```

pub mod cluster;
pub mod common;
pub mod node;
pub mod router;

// Re-export commonly used types
pub use cluster::Cluster;
pub use common::{Config, Error, HashRing, NodeHandle, Result, SharedRing};
pub use node::{CounterStore, NodeServer};
pub use router::{NodeClient, RoutingServer};
