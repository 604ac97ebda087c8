//! Counter node implementation
//!
//! Each node owns one in-memory counter store and serves framed
//! `update`/`get`/`status` requests over TCP, one task per connection.

pub mod server;
pub mod store;

pub use server::NodeServer;
pub use store::CounterStore;
