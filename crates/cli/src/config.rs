//! Command-line surface: the only external-facing configuration this
//! workspace has. `seed` and `virtual_nodes_per_weight` are constructor
//! parameters everywhere else in the workspace; here they're exposed as
//! flags so a reader can reproduce a given ring layout from the command
//! line.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::{Command, CommandResult};

/// `consistent-hash-rs` builds a cache ring, a vector-shard ring, and
/// (optionally) a filesystem artifact ring, attaches backend adapters to
/// each, adds one node, plans the resulting rebalance, executes it, and
/// prints what moved.
#[derive(Debug, Parser)]
#[command(name = "consistent-hash-rs", version, about)]
pub struct CliConfig {
    /// Seed for the cache ring's token layout. The vector and artifact
    /// demo rings derive their own seeds from this one so all three runs
    /// stay reproducible from a single flag.
    #[arg(long, default_value_t = 2025)]
    pub seed: u64,

    /// Virtual nodes contributed per unit of node weight.
    #[arg(long, default_value_t = 256)]
    pub virtual_nodes_per_weight: u32,

    /// Number of synthetic keys to populate and rebalance.
    #[arg(long, default_value_t = 200)]
    pub keys: usize,

    /// If set, also runs the filesystem artifact distributor demo, storing
    /// blobs under this directory.
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Install the `tracing` subscriber and run the demo end to end.
    pub fn run(self) -> anyhow::Result<CommandResult> {
        tracing_subscriber::fmt::try_init().ok();
        Command::Demo(self).execute()
    }
}
