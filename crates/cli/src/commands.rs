//! The demo command itself: build a ring per backend kind, attach adapters,
//! snapshot, add a node, plan, and rebalance end to end for each of
//! cache/vector/artifact.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use adapters::{ArtifactDistributor, ArtifactHost, CacheRouter, InMemoryCacheNode, VectorRouter, VectorShard};
use rebalance::{PlanStats, Planner, RebalanceStats, Rebalancer};

use crate::config::CliConfig;

/// The only command this binary runs: the end-to-end placement/rebalance
/// demo. Kept as an enum of one variant rather than a bare function so a
/// future second demo shape (e.g. a `describe`-only command over a saved
/// ring) has somewhere to land.
pub enum Command {
    Demo(CliConfig),
}

/// Plan and rebalance stats for one backend kind, plus a post-hoc check that
/// every moved key is readable from its new placement.
#[derive(Debug, Clone)]
pub struct DomainReport {
    pub label: &'static str,
    pub plan_stats: PlanStats,
    pub rebalance_stats: RebalanceStats,
    pub verified_after_rebalance: usize,
}

impl fmt::Display for DomainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} moved stats: {:?}", self.label, self.plan_stats)?;
        writeln!(
            f,
            "{} rebalanced: {} migrated, {} missed ({}/{} verified readable after)",
            self.label,
            self.rebalance_stats.migrated,
            self.rebalance_stats.missed,
            self.verified_after_rebalance,
            self.plan_stats.moved_count,
        )
    }
}

/// Aggregate result of running [`Command::Demo`].
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub cache: DomainReport,
    pub vector: DomainReport,
    pub artifact: Option<DomainReport>,
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cache)?;
        write!(f, "{}", self.vector)?;
        if let Some(artifact) = &self.artifact {
            write!(f, "{artifact}")?;
        }
        Ok(())
    }
}

impl Command {
    pub fn execute(self) -> anyhow::Result<CommandResult> {
        match self {
            Command::Demo(config) => run_demo(&config),
        }
    }
}

fn run_demo(config: &CliConfig) -> anyhow::Result<CommandResult> {
    let keys: Vec<String> = (0..config.keys).map(|i| format!("key-{i}")).collect();
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();

    let cache = run_cache_demo(config, &key_refs)?;
    let vector = run_vector_demo(config, &key_refs)?;
    let artifact = config
        .artifact_dir
        .as_ref()
        .map(|dir| run_artifact_demo(config, &key_refs, dir))
        .transpose()?;

    Ok(CommandResult { cache, vector, artifact })
}

fn run_cache_demo(config: &CliConfig, keys: &[&str]) -> anyhow::Result<DomainReport> {
    let ring = Arc::new(corelib::Ring::with_virtual_nodes_per_weight(
        config.virtual_nodes_per_weight,
        config.seed,
    ));
    let mut cache: CacheRouter<String> = CacheRouter::new(ring, 2);
    for id in ["cache-a", "cache-b", "cache-c"] {
        cache.attach(id, InMemoryCacheNode::new(id, 5_000), 1)?;
    }
    for key in keys {
        cache.set(key, format!("value-{key}"), Duration::from_secs(600));
    }

    let ring_before = cache.router().ring().snapshot();
    cache.attach("cache-d", InMemoryCacheNode::new("cache-d", 5_000), 1)?;

    let plan = Planner::plan_moved(keys.iter().copied(), &ring_before, cache.router().ring());
    let plan_stats = Planner::stats(&plan);
    tracing::debug!(?plan_stats, "cache rebalance plan computed");

    let rebalancer = Rebalancer::new(cache.router())
        .with_put_opts(adapters::CachePutOpts::with_ttl(Duration::from_secs(1800)))
        .with_fallback_to_current(true);
    let rebalance_stats = rebalancer.execute(&plan, &ring_before)?;

    let verified = plan.keys().filter(|k| cache.get(k).is_some()).count();

    Ok(DomainReport {
        label: "cache",
        plan_stats,
        rebalance_stats,
        verified_after_rebalance: verified,
    })
}

fn run_vector_demo(config: &CliConfig, keys: &[&str]) -> anyhow::Result<DomainReport> {
    let ring = Arc::new(corelib::Ring::with_virtual_nodes_per_weight(128, config.seed.wrapping_add(1)));
    let mut router = VectorRouter::new(ring, 1);
    for id in ["vs-1", "vs-2", "vs-3"] {
        router.attach(id, VectorShard::new(id), 1)?;
    }
    router.upsert("vec-42", vec![0.1, 0.0, 0.9]);

    let ring_before = router.router().ring().snapshot();
    router.attach("vs-4", VectorShard::new("vs-4"), 1)?;

    let ids: Vec<String> = (0..keys.len()).map(|i| format!("vec-{i}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    for id in id_refs.iter().copied() {
        router.upsert(id, vec![0.0, 1.0, 0.0]);
    }

    let plan = Planner::plan_moved(id_refs.iter().copied(), &ring_before, router.router().ring());
    let plan_stats = Planner::stats(&plan);
    tracing::debug!(?plan_stats, "vector rebalance plan computed");

    // The vector rebalancer never falls back to the current placement on a
    // full miss: a miss is just a miss.
    let rebalancer = Rebalancer::new(router.router());
    let rebalance_stats = rebalancer.execute(&plan, &ring_before)?;

    let verified = plan.keys().filter(|k| router.get(k).is_some()).count();

    Ok(DomainReport {
        label: "vector",
        plan_stats,
        rebalance_stats,
        verified_after_rebalance: verified,
    })
}

fn run_artifact_demo(config: &CliConfig, keys: &[&str], base_dir: &std::path::Path) -> anyhow::Result<DomainReport> {
    let ring = Arc::new(corelib::Ring::with_virtual_nodes_per_weight(64, config.seed.wrapping_add(2)));
    let mut dist = ArtifactDistributor::new(ring, 2);
    for id in ["host-a", "host-b", "host-c"] {
        let host = ArtifactHost::new(id, base_dir.join(id))?;
        dist.attach(id, host, 1)?;
    }

    let artifact_keys: Vec<String> = keys.iter().map(|k| format!("artifact:{k}")).collect();
    for key in &artifact_keys {
        dist.distribute(key, b"placeholder-weights")?;
    }

    let ring_before = dist.router().ring().snapshot();
    let host_d = ArtifactHost::new("host-d", base_dir.join("host-d"))?;
    dist.attach("host-d", host_d, 1)?;

    let key_refs: Vec<&str> = artifact_keys.iter().map(String::as_str).collect();
    let plan = Planner::plan_moved(key_refs.iter().copied(), &ring_before, dist.router().ring());
    let plan_stats = Planner::stats(&plan);
    tracing::debug!(?plan_stats, "artifact rebalance plan computed");

    // Artifact rebalancing skips the fallback-to-current read, same as vector.
    let rebalancer = Rebalancer::new(dist.router());
    let rebalance_stats = rebalancer.execute(&plan, &ring_before)?;

    let verified = plan
        .keys()
        .filter(|k| matches!(dist.fetch(k), Ok(Some(_))))
        .count();

    Ok(DomainReport {
        label: "artifact",
        plan_stats,
        rebalance_stats,
        verified_after_rebalance: verified,
    })
}
