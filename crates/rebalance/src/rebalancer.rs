//! Generic rebalance execution: read each planned key from its old
//! placement and write it to its new placement via the router.
//!
//! One [`Rebalancer`] type serves all backend kinds; what differs between
//! the reference `CacheRebalancer`/`VectorRebalancer`/`ArtifactRebalancer` is
//! just (a) the write options passed to `put` (a TTL for the cache, `()` for
//! vector/artifact) and (b) whether a full miss on the old placement falls
//! back to a read against the *current* placement before giving up. Both are
//! builder flags here rather than three near-identical structs.

use corelib::ring::Ring;
use router::{Backend, Router};

use crate::error::{Error, Result};
use crate::plan::Plan;

/// Executes a [`Plan`] against a [`Router`]: for each moved key, read the
/// value from any adapter in the *old* placement (falling back to the
/// current placement if `fallback_to_current` is set and the old placement
/// missed entirely), then write it to every adapter in the *new* placement.
///
/// Execution is not transactional and keys are processed in the order the
/// plan iterates them; a crash mid-execute leaves keys partially migrated,
/// which is fine because re-planning and re-executing converges (the planner
/// is a pure function of the two ring snapshots and the key set).
pub struct Rebalancer<'a, A: Backend> {
    router: &'a Router<A>,
    put_opts: A::PutOpts,
    fallback_to_current: bool,
}

/// Summary of one `execute` call, for logging/metrics at the call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebalanceStats {
    pub migrated: usize,
    pub missed: usize,
}

impl<'a, A: Backend> Rebalancer<'a, A> {
    pub fn new(router: &'a Router<A>) -> Self {
        Self {
            router,
            put_opts: A::PutOpts::default(),
            fallback_to_current: false,
        }
    }

    /// Write options applied to every `put` this rebalancer issues (e.g. a
    /// cache TTL). Defaults to `A::PutOpts::default()`.
    pub fn with_put_opts(mut self, opts: A::PutOpts) -> Self {
        self.put_opts = opts;
        self
    }

    /// If set, a full miss against the old placement falls back to reading
    /// the key through the router's *current* placement before giving up.
    /// The reference cache rebalancer does this; vector and artifact
    /// rebalancers do not (see DESIGN.md).
    pub fn with_fallback_to_current(mut self, fallback: bool) -> Self {
        self.fallback_to_current = fallback;
        self
    }

    /// Execute the plan. Stops and returns the first adapter error; keys
    /// processed before the failure remain migrated.
    pub fn execute(&self, plan: &Plan, ring_before: &Ring) -> Result<RebalanceStats> {
        let mut stats = RebalanceStats::default();

        for (key, (_from, to)) in plan {
            if to.is_none() {
                // Nothing to migrate forward to: the post-change ring has no
                // owner for this key at all (it's empty).
                continue;
            }

            let value = self.read_old_or_fallback(key, ring_before)?;
            let Some(value) = value else {
                stats.missed += 1;
                tracing::debug!(key, "rebalance miss: no value in old or fallback placement");
                continue;
            };

            for adapter in self.router.placement(key) {
                adapter
                    .put(key, value.clone(), self.put_opts.clone())
                    .map_err(|e| Error::Adapter(Box::new(e)))?;
            }
            stats.migrated += 1;
        }

        tracing::debug!(migrated = stats.migrated, missed = stats.missed, "rebalance executed");
        Ok(stats)
    }

    /// Read `key` from any adapter in its old placement (first non-miss
    /// wins); if every old adapter misses and fallback is enabled, retry
    /// against the router's current placement.
    fn read_old_or_fallback(&self, key: &str, ring_before: &Ring) -> Result<Option<A::Value>> {
        for adapter in self.router.placement_with_ring(key, ring_before) {
            if let Some(v) = adapter.get(key).map_err(|e| Error::Adapter(Box::new(e)))? {
                return Ok(Some(v));
            }
        }
        if self.fallback_to_current {
            for adapter in self.router.placement(key) {
                if let Some(v) = adapter.get(key).map_err(|e| Error::Adapter(Box::new(e)))? {
                    return Ok(Some(v));
                }
            }
        }
        Ok(None)
    }
}
