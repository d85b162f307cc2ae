//! Read-only introspection over a [`Ring`]: ownership, load distribution,
//! and a human-readable description. Nothing here mutates the ring or
//! affects placement; it exists for debugging, monitoring, and operational
//! tooling layered on top of the core.

use std::collections::HashMap;

use crate::ring::Ring;

/// A lightweight, read-only view over a ring.
///
/// # Performance
///
/// Every operation here is O(n) in the number of vnode tokens: it takes the
/// ring's lock once and walks `dump_tokens()`. None of this runs on the hot
/// lookup path; it is strictly for inspection.
pub struct Topology<'a> {
    ring: &'a Ring,
}

impl<'a> Topology<'a> {
    pub fn new(ring: &'a Ring) -> Self {
        Self { ring }
    }

    /// Group every vnode token by the physical node that owns it.
    pub fn ownership(&self) -> HashMap<String, Vec<u64>> {
        let mut ownership: HashMap<String, Vec<u64>> = HashMap::new();
        for (token, node_id) in self.ring.dump_tokens() {
            ownership.entry(node_id).or_default().push(token);
        }
        for tokens in ownership.values_mut() {
            tokens.sort_unstable();
        }
        ownership
    }

    /// Fraction of ring tokens (0.0-100.0) owned by each node.
    ///
    /// This is a proxy for expected key-share under a uniform key
    /// distribution, not a measurement of live traffic.
    pub fn ownership_percentages(&self) -> HashMap<String, f64> {
        let ownership = self.ownership();
        let total = self.ring.token_count() as f64;
        if total == 0.0 {
            return HashMap::new();
        }
        ownership
            .into_iter()
            .map(|(id, tokens)| (id, (tokens.len() as f64 / total) * 100.0))
            .collect()
    }

    /// Render a human-readable summary, e.g. for a CLI `describe` command.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str("Ring Description:\n");
        out.push_str(&format!("  Nodes: {}\n", self.ring.size()));
        out.push_str(&format!("  Total tokens: {}\n", self.ring.token_count()));
        out.push_str(&format!(
            "  Virtual nodes per weight: {}\n",
            self.ring.virtual_nodes_per_weight()
        ));

        let percentages = self.ownership_percentages();
        let ownership = self.ownership();
        if !percentages.is_empty() {
            out.push_str("\nNode Ownership:\n");
            let mut ids: Vec<_> = percentages.keys().collect();
            ids.sort();
            for id in ids {
                let token_count = ownership.get(id).map(Vec::len).unwrap_or(0);
                out.push_str(&format!(
                    "  {}: {} tokens ({:.2}%)\n",
                    id, token_count, percentages[id]
                ));
            }
        }
        out
    }
}
