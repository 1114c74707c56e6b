//! Store adapter: the only seam between the keyspace logic and a live key-value store.

pub mod types;
pub mod memory_store;
pub mod redis_store;

pub use types::*;
pub use memory_store::MemoryStore;
pub use redis_store::{open_connection, RedisStore};

use async_trait::async_trait;

use crate::error::StoreResult;

/// Read-only capability over a key-value store.
///
/// Implementations must be cheap to share across requests (`Send + Sync`) and
/// hold no per-request state.
#[async_trait]
pub trait KeyspaceStore: Send + Sync {
    /// Every key name currently visible. No ordering guarantee.
    async fn list_all_keys(&self) -> StoreResult<Vec<String>>;

    /// One metadata triple per input key, in input order, fetched in a single
    /// round trip. Keys that vanished report `ttl_seconds == TTL_ABSENT` and no size
    /// instead of failing the batch.
    async fn batch_metadata(&self, keys: &[String]) -> StoreResult<Vec<KeyMetadata>>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Reads the full value of `key` as `key_type`.
    ///
    /// Returns `StoreError::NotFound` if the key no longer exists.
    async fn fetch_value(&self, key: &str, key_type: &KeyType) -> StoreResult<KeyValue>;

    async fn ping(&self) -> StoreResult<()>;
}
