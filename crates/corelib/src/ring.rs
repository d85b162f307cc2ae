//! The consistent hash ring itself: a weighted virtual-node ring with
//! O(log N) lookup, multi-replica selection, and safe concurrent mutation.
//!
//! # Invariants
//!
//! - The sorted-token vector and the `(token, node_id)` vector are the same
//!   length and ordered identically.
//! - Every node in the id map contributes exactly `node.vnode_count(vnpw)`
//!   entries to the ring; no node referenced by a ring entry is absent from
//!   the id map.
//! - Token collisions are preserved as distinct entries with a deterministic
//!   tie-break: a newly inserted token lands *before* any existing entry with
//!   the same value (`bisect_left` semantics).
//! - `seed` and `virtual_nodes_per_weight` never change for a ring instance.
//!
//! # Concurrency
//!
//! All state lives behind a single [`parking_lot::Mutex`]. Reads and writes
//! are mutually exclusive; `clone()` holds the lock only for the duration of
//! the copy and returns a [`Ring`] with a brand-new, uncontended lock.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::hash::{hash_key, hash_vnode};
use crate::node::Node;

/// Aggregate counts describing the current ring state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    pub node_count: usize,
    pub token_count: usize,
    pub virtual_nodes_per_weight: u32,
}

/// The mutable, lock-protected interior of a [`Ring`].
struct RingInner {
    nodes: HashMap<String, Node>,
    /// Sorted ascending; `tokens[i]` corresponds to `entries[i]`.
    tokens: Vec<u64>,
    /// Sorted ascending by token; kept parallel to `tokens`.
    entries: Vec<(u64, String)>,
}

impl RingInner {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            tokens: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Insert one `(token, node_id)` pair at the `bisect_left` position so a
    /// new entry with a colliding token lands before any existing equal.
    fn insert_token(&mut self, token: u64, node_id: &str) {
        let pos = self.tokens.partition_point(|&t| t < token);
        self.tokens.insert(pos, token);
        self.entries.insert(pos, (token, node_id.to_string()));
    }
}

/// A weighted virtual-node consistent hash ring.
///
/// `virtual_nodes_per_weight` and `seed` are fixed for the lifetime of the
/// ring: they determine token layout, and therefore which physical node owns
/// any given key. Changing either is equivalent to building a new ring.
pub struct Ring {
    virtual_nodes_per_weight: u32,
    seed: u64,
    inner: Mutex<RingInner>,
}

impl Ring {
    /// Default virtual nodes contributed per unit of weight, matching the
    /// reference implementation.
    pub const DEFAULT_VIRTUAL_NODES_PER_WEIGHT: u32 = 128;

    /// Create an empty ring with the default vnode density and the given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_virtual_nodes_per_weight(Self::DEFAULT_VIRTUAL_NODES_PER_WEIGHT, seed)
    }

    /// Create an empty ring, clamping `virtual_nodes_per_weight` to at least 1.
    pub fn with_virtual_nodes_per_weight(virtual_nodes_per_weight: u32, seed: u64) -> Self {
        Self {
            virtual_nodes_per_weight: virtual_nodes_per_weight.max(1),
            seed,
            inner: Mutex::new(RingInner::new()),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn virtual_nodes_per_weight(&self) -> u32 {
        self.virtual_nodes_per_weight
    }

    /// Add a node and its virtual nodes to the ring.
    ///
    /// Atomic: on [`Error::DuplicateNode`] no vnodes are inserted.
    pub fn add_node(&self, node: Node) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.nodes.contains_key(&node.id) {
            return Err(Error::DuplicateNode(node.id.clone()));
        }
        let vn = node.vnode_count(self.virtual_nodes_per_weight);
        tracing::debug!(node_id = %node.id, vnodes = vn, "adding node to ring");
        for i in 0..vn as usize {
            let token = hash_vnode(&node.id, i, self.seed);
            inner.insert_token(token, &node.id);
        }
        inner.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node and all of its virtual nodes. No-op if the id is unknown.
    ///
    /// Returns `true` if a node was actually removed.
    pub fn remove_node(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.nodes.remove(id).is_none() {
            return false;
        }
        // Filtering a sorted sequence preserves order, so no re-sort needed.
        let entries: Vec<(u64, String)> = std::mem::take(&mut inner.entries)
            .into_iter()
            .filter(|(_, node_id)| node_id != id)
            .collect();
        inner.tokens = entries.iter().map(|(t, _)| *t).collect();
        inner.entries = entries;
        tracing::debug!(node_id = %id, "removed node from ring");
        true
    }

    /// Find the primary owner of `key`, or `None` if the ring is empty.
    pub fn get_node(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock();
        Self::lookup_owner(&inner, key, self.seed)
    }

    fn lookup_owner(inner: &RingInner, key: &str, seed: u64) -> Option<String> {
        let n = inner.tokens.len();
        if n == 0 {
            return None;
        }
        let tok = hash_key(key, seed);
        let idx = inner.tokens.partition_point(|&t| t <= tok) % n;
        Some(inner.entries[idx].1.clone())
    }

    /// Select up to `replicas` distinct node ids for `key`, diversifying the
    /// ring entry point across `multiprobe` independent probes before
    /// walking clockwise.
    ///
    /// Returns fewer than `replicas` ids if the ring has fewer distinct
    /// nodes; never returns more than [`Ring::size`].
    pub fn get_nodes_for_key(&self, key: &str, replicas: usize, multiprobe: usize) -> Vec<String> {
        let inner = self.inner.lock();
        let n = inner.tokens.len();
        if n == 0 || replicas == 0 {
            return Vec::new();
        }
        let multiprobe = multiprobe.max(1);

        let mut starts: Vec<usize> = (0..multiprobe)
            .map(|p| {
                let tok = hash_key(&format!("{key}|{p}"), self.seed);
                inner.tokens.partition_point(|&t| t <= tok) % n
            })
            .collect();
        starts.sort_unstable();

        let mut out: Vec<String> = Vec::with_capacity(replicas);
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for start in starts {
            if out.len() >= replicas {
                break;
            }
            for step in 0..n {
                let idx = (start + step) % n;
                let node_id = inner.entries[idx].1.as_str();
                if seen.insert(node_id) {
                    out.push(node_id.to_string());
                    if out.len() >= replicas {
                        break;
                    }
                }
            }
        }
        out
    }

    /// All node ids currently on the ring, in no particular order.
    pub fn nodes(&self) -> Vec<String> {
        self.inner.lock().nodes.keys().cloned().collect()
    }

    /// Metadata for a single node, if present.
    pub fn get_node_meta(&self, id: &str) -> Option<Node> {
        self.inner.lock().nodes.get(id).cloned()
    }

    /// Number of distinct physical nodes on the ring.
    pub fn size(&self) -> usize {
        self.inner.lock().nodes.len()
    }

    /// Number of vnode entries (tokens) on the ring.
    pub fn token_count(&self) -> usize {
        self.inner.lock().tokens.len()
    }

    /// Snapshot of every `(token, node_id)` entry, sorted by token. Intended
    /// for debugging/introspection, not the hot lookup path.
    pub fn dump_tokens(&self) -> Vec<(u64, String)> {
        self.inner.lock().entries.clone()
    }

    /// Aggregate ring statistics.
    pub fn stats(&self) -> RingStats {
        let inner = self.inner.lock();
        RingStats {
            node_count: inner.nodes.len(),
            token_count: inner.tokens.len(),
            virtual_nodes_per_weight: self.virtual_nodes_per_weight,
        }
    }

    /// Deep-copy the ring: the snapshot shares no structure with `self` and
    /// gets its own fresh, uncontended lock. Subsequent mutation of either
    /// ring never affects the other, which is what makes `ring_before` and
    /// `ring_after` comparisons in the rebalance planner safe under
    /// concurrent live mutation.
    ///
    /// Named `snapshot` rather than implementing `std::clone::Clone`: this
    /// type is routinely held behind an `Arc<Ring>`, and an inherent
    /// `clone(&self) -> Ring` would be shadowed by `Arc`'s own (shallow)
    /// `Clone` impl at every call site that matters, silently handing back a
    /// second handle to the *same* mutable ring instead of an independent
    /// deep copy.
    pub fn snapshot(&self) -> Ring {
        let inner = self.inner.lock();
        Ring {
            virtual_nodes_per_weight: self.virtual_nodes_per_weight,
            seed: self.seed,
            inner: Mutex::new(RingInner {
                nodes: inner.nodes.clone(),
                tokens: inner.tokens.clone(),
                entries: inner.entries.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(seed: u64, vnpw: u32, ids: &[&str]) -> Ring {
        let ring = Ring::with_virtual_nodes_per_weight(vnpw, seed);
        for id in ids {
            ring.add_node(Node::new(*id)).unwrap();
        }
        ring
    }

    #[test]
    fn empty_ring_returns_none() {
        let ring = Ring::new(42);
        assert_eq!(ring.get_node("key1"), None);
        assert_eq!(ring.get_nodes_for_key("key1", 1, 1), Vec::<String>::new());
        assert_eq!(ring.size(), 0);
    }

    #[test]
    fn duplicate_add_is_rejected_atomically() {
        let ring = ring_with(42, 8, &["node-A"]);
        let before = ring.token_count();
        let err = ring.add_node(Node::new("node-A")).unwrap_err();
        assert_eq!(err, Error::DuplicateNode("node-A".to_string()));
        assert_eq!(ring.token_count(), before, "partial insert on error");
    }

    #[test]
    fn single_node_absorbs_every_key() {
        // A lone node owns the whole keyspace.
        let ring = ring_with(42, 128, &["node-A"]);
        for key in ["user-1", "embedding-123", "artifact:lora:en:1"] {
            assert_eq!(ring.get_node(key).as_deref(), Some("node-A"));
        }
    }

    #[test]
    fn three_nodes_spread_across_six_keys() {
        // Several nodes actually split ownership of the keyspace.
        let ring = ring_with(42, 128, &["node-A", "node-B", "node-C"]);
        let owners: std::collections::HashSet<_> = ["k1", "k2", "k3", "k4", "k5", "k6"]
            .iter()
            .map(|k| ring.get_node(k).unwrap())
            .collect();
        assert!(owners.len() >= 2);
        for owner in &owners {
            assert!(["node-A", "node-B", "node-C"].contains(&owner.as_str()));
        }
    }

    #[test]
    fn elasticity_bound_on_add() {
        // Adding a 4th node to 3 should move roughly 1/4 of the keys, not more.
        let ring = ring_with(42, 128, &["node-A", "node-B", "node-C"]);
        let keys: Vec<String> = (0..1000).map(|i| format!("key-{i}")).collect();
        let before: Vec<_> = keys.iter().map(|k| ring.get_node(k)).collect();

        ring.add_node(Node::new("node-D")).unwrap();
        let after: Vec<_> = keys.iter().map(|k| ring.get_node(k)).collect();

        let moved = before.iter().zip(after.iter()).filter(|(b, a)| b != a).count();
        let fraction = moved as f64 / keys.len() as f64;
        assert!(
            (0.15..=0.35).contains(&fraction),
            "moved fraction {fraction} out of expected bound"
        );
    }

    #[test]
    fn replica_selection_is_distinct() {
        // Replica selection never returns the same node twice.
        let ring = ring_with(42, 128, &["node-A", "node-B", "node-C", "node-D"]);
        let replicas = ring.get_nodes_for_key("embedding-999", 2, 2);
        assert_eq!(replicas.len(), 2);
        let unique: std::collections::HashSet<_> = replicas.iter().collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn replica_count_never_exceeds_ring_size() {
        let ring = ring_with(7, 32, &["node-A", "node-B"]);
        let replicas = ring.get_nodes_for_key("some-key", 10, 3);
        assert_eq!(replicas.len(), 2);
    }

    #[test]
    fn clone_is_stable_under_later_mutation() {
        // A snapshot keeps answering from the layout it was taken from, even
        // as the live ring keeps mutating underneath it.
        let ring = ring_with(42, 128, &["node-A", "node-B", "node-C"]);
        let keys: Vec<String> = (0..200).map(|i| format!("key-{i}")).collect();
        let snapshot = ring.snapshot();
        let before: Vec<_> = keys.iter().map(|k| snapshot.get_node(k)).collect();

        ring.add_node(Node::new("node-D")).unwrap();
        ring.remove_node("node-A");

        let still: Vec<_> = keys.iter().map(|k| snapshot.get_node(k)).collect();
        assert_eq!(before, still);
    }

    #[test]
    fn remove_redistributes_among_survivors() {
        // Removing a node redistributes its keys among the survivors only.
        let ring = ring_with(42, 128, &["node-A", "node-B", "node-C"]);
        ring.remove_node("node-B");
        assert_eq!(ring.size(), 2);
        for i in 0..200 {
            let owner = ring.get_node(&format!("key-{i}")).unwrap();
            assert_ne!(owner, "node-B");
        }
    }

    #[test]
    fn lookup_is_deterministic_across_reconstruction() {
        let ids = ["node-A", "node-B", "node-C"];
        let ring1 = ring_with(42, 128, &ids);
        let ring2 = ring_with(42, 128, &ids);
        for i in 0..500 {
            let key = format!("k-{i}");
            assert_eq!(ring1.get_node(&key), ring2.get_node(&key));
        }
    }

    #[test]
    fn token_collisions_tie_break_before_existing_equals() {
        // Exercise RingInner::insert_token directly with a forced collision,
        // since two distinct node ids hashing to the same u64 token can't be
        // arranged through the public API without controlling the hash.
        let mut inner = RingInner::new();
        inner.insert_token(100, "existing");
        inner.insert_token(100, "newcomer");

        assert_eq!(inner.tokens, vec![100, 100]);
        assert_eq!(
            inner.entries,
            vec![(100, "newcomer".to_string()), (100, "existing".to_string())],
            "a newly inserted token must land before any existing entry with the same value"
        );
    }

    #[test]
    fn insert_token_keeps_tokens_and_entries_sorted_around_a_collision() {
        let mut inner = RingInner::new();
        inner.insert_token(50, "a");
        inner.insert_token(150, "b");
        inner.insert_token(100, "c");
        inner.insert_token(100, "d");

        assert_eq!(inner.tokens, vec![50, 100, 100, 150]);
        assert_eq!(
            inner.entries,
            vec![
                (50, "a".to_string()),
                (100, "d".to_string()),
                (100, "c".to_string()),
                (150, "b".to_string()),
            ]
        );
    }
}
