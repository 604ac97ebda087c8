//! Routing layer
//!
//! The router is responsible for:
//! - Parsing client requests
//! - Resolving the owning node on the hash ring
//! - Forwarding over the node transport client and relaying the reply

pub mod client;
pub mod server;

pub use client::NodeClient;
pub use server::RoutingServer;
