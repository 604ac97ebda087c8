//! Common utilities and types shared across eventring

pub mod config;
pub mod error;
pub mod hash;
pub mod protocol;

pub use config::{ClientConfig, Config, NodesConfig, RingConfig, RouterConfig};
pub use error::{Error, Result};
pub use hash::{fnv1a_32, vnode_position, HashRing, NodeHandle, SharedRing};
pub use protocol::{read_request, read_response, write_frame, Request};
