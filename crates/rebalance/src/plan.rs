//! The rebalance plan: a pure diff between two ring snapshots over a key set.

use std::collections::HashMap;

use corelib::ring::Ring;

/// A node id, or absence (ring was empty, or the key had no owner on that
/// side of the diff).
pub type Owner = Option<String>;

/// `key -> (from_owner, to_owner)`, containing only keys whose primary
/// owner differs between `ring_before` and `ring_after`.
pub type Plan = HashMap<String, (Owner, Owner)>;

/// Counts derived from a [`Plan`], broken down by source and destination
/// node, useful for logging and for checking that a topology change moved
/// roughly the expected fraction of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub moved_count: usize,
    pub by_to: HashMap<String, usize>,
    pub by_from: HashMap<String, usize>,
}

/// Computes [`Plan`]s by diffing two ring snapshots, and summary statistics
/// over a computed plan. Stateless: every method is a pure function of its
/// arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Planner {
    /// For every key, compare `ring_before.get_node(key)` to
    /// `ring_after.get_node(key)`; include the key only if they differ.
    pub fn plan_moved<'k, K>(keys: K, ring_before: &Ring, ring_after: &Ring) -> Plan
    where
        K: IntoIterator<Item = &'k str>,
    {
        let mut plan = Plan::new();
        for key in keys {
            let from = ring_before.get_node(key);
            let to = ring_after.get_node(key);
            if from != to {
                plan.insert(key.to_string(), (from, to));
            }
        }
        tracing::debug!(moved = plan.len(), "computed rebalance plan");
        plan
    }

    /// Summarize a plan: total moved, and per-node move counts on each side.
    /// Only non-null owners are counted on each side.
    pub fn stats(plan: &Plan) -> PlanStats {
        let mut stats = PlanStats {
            moved_count: plan.len(),
            ..Default::default()
        };
        for (from, to) in plan.values() {
            if let Some(from) = from {
                *stats.by_from.entry(from.clone()).or_insert(0) += 1;
            }
            if let Some(to) = to {
                *stats.by_to.entry(to.clone()).or_insert(0) += 1;
            }
        }
        stats
    }
}
