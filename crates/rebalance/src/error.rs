//! Error type surfaced by [`crate::Rebalancer::execute`].

/// Errors a rebalance execution can surface.
///
/// The rebalancer never swallows an adapter error: it propagates the first
/// one it sees and leaves the plan's remaining keys unprocessed. Because the
/// planner is a pure function of two ring snapshots and a key set, re-running
/// the same `(plan, ring_before)` pair after fixing the underlying failure
/// converges correctly; partial progress is never lost or double-applied,
/// assuming the adapter's `put` is idempotent on an identical value.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend adapter's `get` or `put` returned an error.
    #[error("backend adapter failed: {0}")]
    Adapter(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;
