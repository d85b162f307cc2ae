//! Generic placement router: maps a key to an ordered list of backend
//! adapters by consulting a [`corelib::Ring`].
//!
//! The router owns the ring and the `id -> adapter` map together so the two
//! never drift apart under normal use; [`Router::placement_with_ring`] is the
//! escape hatch rebalancers use to consult a *different* ring snapshot (the
//! pre-change topology) while the router's own ring already reflects the
//! post-change one.

pub mod backend;

use std::collections::HashMap;
use std::sync::Arc;

pub use backend::Backend;
use corelib::node::Node;
use corelib::ring::Ring;

/// A placement router over a single kind of backend adapter.
///
/// `replication` and `multiprobe` are fixed at construction: they are a
/// property of the router kind (e.g. the reference cache router replicates
/// to 2 nodes with multiprobe 2; the artifact router replicates to 2 with
/// multiprobe 3), not something that varies per call.
pub struct Router<A: Backend> {
    ring: Arc<Ring>,
    adapters: HashMap<String, A>,
    replication: usize,
    multiprobe: usize,
}

impl<A: Backend> Router<A> {
    pub fn new(ring: Arc<Ring>, replication: usize, multiprobe: usize) -> Self {
        Self {
            ring,
            adapters: HashMap::new(),
            replication: replication.max(1),
            multiprobe: multiprobe.max(1),
        }
    }

    /// The ring this router places keys against.
    pub fn ring(&self) -> &Arc<Ring> {
        &self.ring
    }

    pub fn replication(&self) -> usize {
        self.replication
    }

    /// Register an adapter and add its node to the ring.
    pub fn attach(&mut self, id: impl Into<String>, adapter: A, weight: u32) -> corelib::Result<()> {
        let id = id.into();
        self.ring.add_node(Node::with_weight(id.clone(), weight))?;
        tracing::debug!(node_id = %id, "attached backend adapter");
        self.adapters.insert(id, adapter);
        Ok(())
    }

    /// Drop an adapter and remove its node from the ring. No-op if unknown.
    pub fn detach(&mut self, id: &str) {
        self.adapters.remove(id);
        self.ring.remove_node(id);
        tracing::debug!(node_id = %id, "detached backend adapter");
    }

    pub fn adapter(&self, id: &str) -> Option<&A> {
        self.adapters.get(id)
    }

    /// Ordered list of adapters responsible for `key` under the router's
    /// own (current) ring.
    pub fn placement(&self, key: &str) -> Vec<&A> {
        self.placement_with_ring(key, &self.ring)
    }

    /// Same projection as [`Router::placement`], but against `ring` instead
    /// of the router's own ring. This is what rebalancers use to read the
    /// *old* placement of a key while the router itself already points at
    /// the new topology.
    pub fn placement_with_ring(&self, key: &str, ring: &Ring) -> Vec<&A> {
        ring.get_nodes_for_key(key, self.replication, self.multiprobe)
            .into_iter()
            .filter_map(|id| self.adapters.get(&id))
            .collect()
    }
}
