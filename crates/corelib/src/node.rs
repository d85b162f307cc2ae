//! Node abstractions for the consistent hash ring.
//!
//! Nodes represent logical participants in the ring, identified by their
//! `id` string. Weight, zone, and labels are metadata: weight drives how many
//! virtual nodes a physical node contributes; zone and labels are carried for
//! future topology-aware placement but are not consulted by this version's
//! ring or router.

use std::collections::HashMap;

/// Logical node participating in the ring.
///
/// Identity is the `id` string; two `Node`s with the same `id` are the same
/// node as far as the ring is concerned; the ring rejects adding a second one
/// (see [`crate::error::Error::DuplicateNode`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    /// Relative capacity; each node contributes
    /// `virtual_nodes_per_weight * max(1, weight)` tokens to the ring.
    pub weight: u32,
    /// Metadata only, not used for placement in this version.
    pub zone: Option<String>,
    /// Metadata only, not used for placement in this version.
    pub labels: Option<HashMap<String, String>>,
}

impl Node {
    /// Construct a node with the default weight (1) and no metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weight: 1,
            zone: None,
            labels: None,
        }
    }

    /// Construct a node with an explicit weight.
    pub fn with_weight(id: impl Into<String>, weight: u32) -> Self {
        Self {
            id: id.into(),
            weight,
            zone: None,
            labels: None,
        }
    }

    /// Builder-style setter for the zone label.
    pub fn zoned(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Number of virtual nodes this node contributes, given a ring's
    /// `virtual_nodes_per_weight` setting. Weight is floored at 1, since a
    /// zero-or-negative weight would otherwise strand a node off the ring
    /// entirely, which is never the caller's intent.
    #[inline]
    pub fn vnode_count(&self, virtual_nodes_per_weight: u32) -> u32 {
        virtual_nodes_per_weight * self.weight.max(1)
    }
}
