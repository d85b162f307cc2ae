//! The backend adapter contract every [`crate::Router`] consumes.
//!
//! A backend is any object exposing a `get`/`put` pair over an opaque value
//! type; the ring and the rebalance planner never see or care what that
//! value type is. Three concrete backends (in-memory cache, vector shard,
//! filesystem artifact host) live in the sibling `adapters` crate; they are
//! demonstrations, interchangeable with Redis, S3, or a real vector database.

/// A backend store placed on the ring, referenced by a string id matching
/// the node id it's attached under.
///
/// `get` must be side-effect-free on miss. `put` stores a value under
/// adapter-specific options (e.g. a TTL for a cache backend, `()` for
/// backends with no notion of expiry).
pub trait Backend: Send + Sync {
    /// Opaque value type this backend stores.
    type Value: Clone;
    /// Adapter-specific write options.
    type PutOpts: Default + Clone;
    /// Adapter-specific error type (I/O failure, connection error, ...).
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self, key: &str) -> Result<Option<Self::Value>, Self::Error>;
    fn put(&self, key: &str, value: Self::Value, opts: Self::PutOpts) -> Result<(), Self::Error>;
}
