//! Demo wiring for the consistent-hashing placement core.
//!
//! This binary is a demonstration, not a service: it builds a cache ring, a
//! vector-shard ring, and optionally a filesystem artifact ring, attaches
//! the matching backend adapters from the `adapters` crate, snapshots each
//! ring, adds one node, plans the resulting rebalance via `rebalance`, and
//! executes it end to end. There is no network listener and no
//! daemonization.

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
