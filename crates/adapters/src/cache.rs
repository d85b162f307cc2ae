//! In-memory LRU-with-TTL cache backend: the reference `Backend` behind the
//! distributed cache router. Swappable with Redis/Memcached in production,
//! since nothing in the ring, router, or rebalancer depends on this being
//! in-process.

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use router::{Backend, Router};

/// Write options for [`InMemoryCacheNode::put`]: how long the entry lives.
/// `Duration::ZERO` (the default) means "never expires", matching the
/// reference's `ttl_sec=0` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePutOpts {
    pub ttl: Duration,
}

impl Default for CachePutOpts {
    fn default() -> Self {
        Self { ttl: Duration::ZERO }
    }
}

impl CachePutOpts {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

struct CacheInner<V> {
    store: HashMap<String, CacheEntry<V>>,
    /// Least-recently-used at the front, most-recently-used at the back.
    order: VecDeque<String>,
}

/// A single in-memory cache node: LRU eviction on `capacity_items`, lazy
/// expiry on read.
pub struct InMemoryCacheNode<V> {
    id: String,
    capacity: usize,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> InMemoryCacheNode<V> {
    pub fn new(id: impl Into<String>, capacity_items: usize) -> Self {
        Self {
            id: id.into(),
            capacity: capacity_items.max(1),
            inner: Mutex::new(CacheInner {
                store: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn touch(inner: &mut CacheInner<V>, key: &str) {
        if let Some(pos) = inner.order.iter().position(|k| k == key) {
            inner.order.remove(pos);
        }
        inner.order.push_back(key.to_string());
    }

    fn evict_if_needed(id: &str, inner: &mut CacheInner<V>, capacity: usize) {
        while inner.store.len() > capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.store.remove(&oldest);
                tracing::debug!(node_id = id, key = %oldest, "evicted LRU entry");
            } else {
                break;
            }
        }
    }
}

impl<V: Clone + Send + Sync> Backend for InMemoryCacheNode<V> {
    type Value = V;
    type PutOpts = CachePutOpts;
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<V>, Infallible> {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.store.get(key) else {
            tracing::debug!(node_id = %self.id, key, "cache miss");
            return Ok(None);
        };
        if let Some(expires_at) = entry.expires_at {
            if expires_at < Instant::now() {
                inner.store.remove(key);
                if let Some(pos) = inner.order.iter().position(|k| k == key) {
                    inner.order.remove(pos);
                }
                tracing::debug!(node_id = %self.id, key, "cache entry expired");
                return Ok(None);
            }
        }
        let value = entry.value.clone();
        Self::touch(&mut inner, key);
        Ok(Some(value))
    }

    fn put(&self, key: &str, value: V, opts: CachePutOpts) -> Result<(), Infallible> {
        let mut inner = self.inner.lock();
        let expires_at = if opts.ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + opts.ttl)
        };
        inner.store.insert(key.to_string(), CacheEntry { value, expires_at });
        Self::touch(&mut inner, key);
        Self::evict_if_needed(&self.id, &mut inner, self.capacity);
        tracing::debug!(node_id = %self.id, key, ttl_secs = opts.ttl.as_secs(), "cache entry written");
        Ok(())
    }
}

/// Convenience wrapper over [`Router`] exposing the cache-specific
/// read/write shape: reads fan out across the key's placement and return the
/// first non-empty hit; writes fan out to every replica with a shared TTL.
pub struct CacheRouter<V> {
    router: Router<InMemoryCacheNode<V>>,
}

impl<V: Clone + Send + Sync> CacheRouter<V> {
    /// `multiprobe = 2`, matching the reference `DistributedCache`.
    pub fn new(ring: Arc<corelib::Ring>, replication: usize) -> Self {
        Self {
            router: Router::new(ring, replication, 2),
        }
    }

    pub fn router(&self) -> &Router<InMemoryCacheNode<V>> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router<InMemoryCacheNode<V>> {
        &mut self.router
    }

    pub fn attach(&mut self, id: impl Into<String>, node: InMemoryCacheNode<V>, weight: u32) -> corelib::Result<()> {
        self.router.attach(id, node, weight)
    }

    pub fn detach(&mut self, id: &str) {
        self.router.detach(id);
    }

    /// First non-empty value across `key`'s current placement.
    pub fn get(&self, key: &str) -> Option<V> {
        for node in self.router.placement(key) {
            if let Ok(Some(v)) = node.get(key) {
                return Some(v);
            }
        }
        tracing::debug!(key, "cache router read missed on every replica");
        None
    }

    /// Write `value` to every node in `key`'s current placement.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let mut replicas = 0;
        for node in self.router.placement(key) {
            let _ = node.put(key, value.clone(), CachePutOpts::with_ttl(ttl));
            replicas += 1;
        }
        tracing::debug!(key, replicas, "cache router fanned out write");
    }
}
