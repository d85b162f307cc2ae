//! Rebalance planning and execution: diff two ring snapshots over a key set,
//! then drive the generic warmup/backfill protocol over a [`router::Router`].
//!
//! [`Planner`] is a pure function of `(keys, ring_before, ring_after)`; the
//! [`Rebalancer`] is the only thing in this crate that performs I/O, and only
//! through the `Backend` adapters a `Router` already owns.

pub mod error;
pub mod plan;
pub mod rebalancer;

pub use error::{Error, Result};
pub use plan::{Owner, Plan, PlanStats, Planner};
pub use rebalancer::{RebalanceStats, Rebalancer};
