//! In-memory vector shard backend: the reference `Backend` behind the
//! vector placement router. A real deployment swaps this for a proper vector
//! database; placement and rebalance logic is unaware of the difference.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use parking_lot::Mutex;

use router::{Backend, Router};

/// A single vector shard: `vec_id -> embedding`, with a brute-force
/// cosine-similarity scan for local search.
pub struct VectorShard {
    id: String,
    vecs: Mutex<HashMap<String, Vec<f32>>>,
}

impl VectorShard {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vecs: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cosine similarity of every locally-held vector against `query`,
    /// highest score first, truncated to `top_k`.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(String, f32)> {
        let vecs = self.vecs.lock();
        let mut scored: Vec<(String, f32)> = vecs
            .iter()
            .map(|(id, v)| (id.clone(), cosine_similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt() + 1e-12;
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt() + 1e-12;
    dot / (norm_a * norm_b)
}

impl Backend for VectorShard {
    type Value = Vec<f32>;
    type PutOpts = ();
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<Vec<f32>>, Infallible> {
        Ok(self.vecs.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<f32>, _opts: ()) -> Result<(), Infallible> {
        self.vecs.lock().insert(key.to_string(), value);
        tracing::debug!(shard_id = %self.id, key, "vector upserted");
        Ok(())
    }
}

/// Convenience wrapper over [`Router`] exposing the vector-specific
/// read/write/search shape.
pub struct VectorRouter {
    router: Router<VectorShard>,
}

impl VectorRouter {
    /// `multiprobe = 2`, matching the reference.
    pub fn new(ring: Arc<corelib::Ring>, replication: usize) -> Self {
        Self {
            router: Router::new(ring, replication, 2),
        }
    }

    pub fn router(&self) -> &Router<VectorShard> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router<VectorShard> {
        &mut self.router
    }

    pub fn attach(&mut self, id: impl Into<String>, shard: VectorShard, weight: u32) -> corelib::Result<()> {
        self.router.attach(id, shard, weight)
    }

    pub fn detach(&mut self, id: &str) {
        self.router.detach(id);
    }

    /// Write `vec` to every shard in `vec_id`'s current placement.
    pub fn upsert(&self, vec_id: &str, vec: Vec<f32>) {
        for shard in self.router.placement(vec_id) {
            let _ = shard.put(vec_id, vec.clone(), ());
        }
    }

    /// First non-empty vector across `vec_id`'s current placement.
    pub fn get(&self, vec_id: &str) -> Option<Vec<f32>> {
        for shard in self.router.placement(vec_id) {
            if let Ok(Some(v)) = shard.get(vec_id) {
                return Some(v);
            }
        }
        tracing::debug!(vec_id, "vector router read missed on every replica");
        None
    }

    /// Scatter-gather search: query every currently attached shard, merge
    /// and re-rank the results, and return the overall top `top_k`. Unlike
    /// `get`/`upsert`, search has no single owning shard to consult, so it
    /// necessarily fans out to all of them rather than following placement.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(String, f32)> {
        let shard_ids: Vec<String> = self.router.ring().nodes();
        let mut merged: Vec<(String, f32)> = shard_ids
            .iter()
            .filter_map(|id| self.router.adapter(id))
            .flat_map(|shard| shard.search(query, top_k))
            .collect();
        merged.sort_by(|a, b| b.1.total_cmp(&a.1));
        merged.truncate(top_k);
        tracing::debug!(shards_queried = shard_ids.len(), results = merged.len(), "vector scatter-gather search");
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_get_round_trips() {
        let ring = Arc::new(corelib::Ring::with_virtual_nodes_per_weight(32, 7));
        let mut router = VectorRouter::new(ring, 1);
        router.attach("vs-1", VectorShard::new("vs-1"), 1).unwrap();
        router.attach("vs-2", VectorShard::new("vs-2"), 1).unwrap();

        router.upsert("vec-42", vec![0.1, 0.0, 0.9]);
        assert_eq!(router.get("vec-42"), Some(vec![0.1, 0.0, 0.9]));
    }

    #[test]
    fn search_ranks_by_cosine_similarity() {
        let shard = VectorShard::new("vs-1");
        shard.put("a", vec![1.0, 0.0], ()).unwrap();
        shard.put("b", vec![0.0, 1.0], ()).unwrap();

        let results = shard.search(&[1.0, 0.0], 2);
        assert_eq!(results[0].0, "a");
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn scatter_gather_search_spans_all_shards() {
        let ring = Arc::new(corelib::Ring::with_virtual_nodes_per_weight(32, 7));
        let mut router = VectorRouter::new(ring, 1);
        router.attach("vs-1", VectorShard::new("vs-1"), 1).unwrap();
        router.attach("vs-2", VectorShard::new("vs-2"), 1).unwrap();

        router.upsert("near", vec![1.0, 0.0]);
        router.upsert("far", vec![0.0, 1.0]);

        let results = router.search(&[1.0, 0.0], 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "near");
    }
}
