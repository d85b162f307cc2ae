//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// The ring treats only [`Error::DuplicateNode`] as a hard error; every other
/// condition (empty ring, unknown node on removal, missing value) is total
/// and expressed as `None` / a no-op at the call site instead of an `Err`.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// `add_node` was called with an id already present on the ring.
    #[error("node `{0}` already exists on the ring")]
    DuplicateNode(String),
}
