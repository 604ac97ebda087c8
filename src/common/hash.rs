//! Consistent hashing for eventring
//!
//! - FNV-1a (32-bit) for ring positions and event keys
//! - Virtual nodes: each node occupies `replica_factor` positions
//! - Lookup is a binary search for the first position >= hash, wrapping to 0

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Compute the 32-bit FNV-1a hash of `data`
pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Ring position of a node's `replica`-th virtual node
pub fn vnode_position(node_id: u32, replica: usize) -> u32 {
    fnv1a_32(format!("{}-{}", node_id, replica).as_bytes())
}

/// Reference to a counter node, as stored on the ring
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub id: u32,
    pub addr: SocketAddr,
}

impl NodeHandle {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self { id, addr }
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}@{}", self.id, self.addr)
    }
}

/// Consistent hash ring
///
/// Positions are kept sorted; `owners` maps each position to the node that
/// placed it. The ring only grows: there is no removal.
#[derive(Debug, Clone)]
pub struct HashRing {
    positions: Vec<u32>,
    owners: HashMap<u32, NodeHandle>,
    replica_factor: usize,
    node_count: usize,
}

impl HashRing {
    pub fn new(replica_factor: usize) -> Self {
        Self {
            positions: Vec::new(),
            owners: HashMap::new(),
            replica_factor,
            node_count: 0,
        }
    }

    /// Place `replica_factor` virtual nodes for `node` and re-sort the ring.
    ///
    /// Duplicate ids are not checked; a colliding position is taken over by
    /// the most recently added owner.
    pub fn add_node(&mut self, node: NodeHandle) {
        self.node_count += 1;
        for replica in 0..self.replica_factor {
            let position = vnode_position(node.id, replica);
            self.positions.push(position);
            self.owners.insert(position, node.clone());
        }
        self.positions.sort_unstable();

        tracing::debug!(
            node = %node,
            positions = self.positions.len(),
            "Node added to ring"
        );
    }

    /// Index of the first position >= `hash`, wrapping to 0 past the end
    fn search(&self, hash: u32) -> usize {
        let idx = self.positions.partition_point(|&p| p < hash);
        if idx == self.positions.len() {
            0
        } else {
            idx
        }
    }

    /// Owner of `event`, or `None` on an empty ring
    pub fn resolve(&self, event: &str) -> Option<&NodeHandle> {
        if self.positions.is_empty() {
            return None;
        }
        let idx = self.search(fnv1a_32(event.as_bytes()));
        self.owners.get(&self.positions[idx])
    }

    /// Primary owner followed by the owners of the next
    /// `replica_factor - 1` positions clockwise.
    ///
    /// Owners are not deduplicated: a node whose virtual nodes are adjacent
    /// appears more than once.
    pub fn resolve_replicas(&self, event: &str) -> Vec<&NodeHandle> {
        if self.positions.is_empty() {
            return Vec::new();
        }
        let start = self.search(fnv1a_32(event.as_bytes()));
        let len = self.positions.len();
        (0..self.replica_factor.min(len))
            .filter_map(|step| self.owners.get(&self.positions[(start + step) % len]))
            .collect()
    }

    /// Distinct nodes on the ring, ordered by id
    pub fn nodes(&self) -> Vec<NodeHandle> {
        let mut nodes: Vec<NodeHandle> = self.owners.values().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        nodes.dedup_by_key(|n| n.id);
        nodes
    }

    /// Number of `add_node` calls so far
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn replica_factor(&self) -> usize {
        self.replica_factor
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sorted ring positions
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }
}

/// Hash ring shared between the bootstrap and every connection task.
///
/// `add_node` takes the write lock; lookups take the read lock.
#[derive(Debug, Clone)]
pub struct SharedRing {
    inner: Arc<RwLock<HashRing>>,
}

impl SharedRing {
    pub fn new(replica_factor: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashRing::new(replica_factor))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashRing> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashRing> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_node(&self, node: NodeHandle) {
        self.write().add_node(node);
    }

    pub fn resolve(&self, event: &str) -> Option<NodeHandle> {
        self.read().resolve(event).cloned()
    }

    pub fn resolve_replicas(&self, event: &str) -> Vec<NodeHandle> {
        self.read()
            .resolve_replicas(event)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn nodes(&self) -> Vec<NodeHandle> {
        self.read().nodes()
    }

    pub fn node_count(&self) -> usize {
        self.read().node_count()
    }

    pub fn position_count(&self) -> usize {
        self.read().position_count()
    }

    pub fn replica_factor(&self) -> usize {
        self.read().replica_factor()
    }

    /// Copy of the current ring
    pub fn snapshot(&self) -> HashRing {
        self.read().clone()
    }
}
