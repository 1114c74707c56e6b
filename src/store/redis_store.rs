//! Redis-backed `KeyspaceStore`.
//!
//! All I/O goes through one multiplexed `ConnectionManager`, opened once per
//! process and cloned per call. Metadata for a whole key set is fetched in a
//! single pipeline (`TTL`, `MEMORY USAGE`, `TYPE` per key).

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hashlink::LinkedHashMap;
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, ConnectionAddr, ConnectionInfo, ErrorKind, RedisConnectionInfo, RedisError, RedisResult, Value,
};
use tokio::time::timeout;

use crate::config::RedisConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{KeyMetadata, KeyType, KeyValue, KeyspaceStore};

/// Replies per key in the metadata pipeline.
const REPLIES_PER_KEY: usize = 3;

/// Opens the process-wide connection described by `config`.
pub async fn open_connection(config: &RedisConfig) -> StoreResult<ConnectionManager> {
    let info = ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
        redis: RedisConnectionInfo {
            db: config.db,
            username: config.username.clone(),
            password: config.password.clone(),
            ..Default::default()
        },
    };
    let client = redis::Client::open(info).map_err(store_error)?;

    within(config.connect_timeout(), ConnectionManager::new(client)).await
}

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    scan_count: usize,
    batch_timeout: Duration,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, config: &RedisConfig) -> Self {
        Self {
            conn,
            scan_count: config.scan_count.max(1),
            batch_timeout: config.batch_timeout(),
        }
    }
}

#[async_trait]
impl KeyspaceStore for RedisStore {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut conn)
                .await
                .map_err(store_error)?;

            // SCAN may hand back the same key twice across iterations
            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }

    async fn batch_metadata(&self, keys: &[String]) -> StoreResult<Vec<KeyMetadata>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.cmd("TTL").arg(key)
                .cmd("MEMORY").arg("USAGE").arg(key)
                .cmd("TYPE").arg(key);
        }

        let mut conn = self.conn.clone();
        let replies: Vec<Value> = within(self.batch_timeout, pipe.query_async(&mut conn))
            .await
            .inspect_err(|err| {
                if matches!(err, StoreError::Timeout) {
                    tracing::warn!(keys = keys.len(), timeout = ?self.batch_timeout, "Metadata batch timed out");
                }
            })?;

        if replies.len() != keys.len() * REPLIES_PER_KEY {
            return Err(StoreError::malformed(format!(
                "expected {} replies for {} keys, got {}",
                keys.len() * REPLIES_PER_KEY,
                keys.len(),
                replies.len()
            )));
        }

        replies.chunks_exact(REPLIES_PER_KEY).map(parse_metadata).collect()
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await.map_err(store_error)?;
        Ok(exists)
    }

    async fn fetch_value(&self, key: &str, key_type: &KeyType) -> StoreResult<KeyValue> {
        let mut conn = self.conn.clone();

        let value = match key_type {
            KeyType::String => {
                let value: Option<String> = conn.get(key).await.map_err(|e| value_error(key, e))?;
                KeyValue::String(value.ok_or_else(|| StoreError::not_found(key))?)
            }
            KeyType::List => {
                let items: Vec<String> = conn.lrange(key, 0, -1).await.map_err(|e| value_error(key, e))?;
                KeyValue::List(non_empty(key, items)?)
            }
            KeyType::Set => {
                let members: Vec<String> = conn.smembers(key).await.map_err(|e| value_error(key, e))?;
                KeyValue::Set(non_empty(key, members)?)
            }
            KeyType::SortedSet => {
                let members: Vec<(String, f64)> = conn
                    .zrange_withscores(key, 0, -1)
                    .await
                    .map_err(|e| value_error(key, e))?;
                KeyValue::SortedSet(non_empty(key, members)?)
            }
            KeyType::Hash => {
                let fields: Vec<(String, String)> = conn.hgetall(key).await.map_err(|e| value_error(key, e))?;
                KeyValue::Hash(non_empty(key, fields)?.into_iter().collect::<LinkedHashMap<_, _>>())
            }
            KeyType::JsonDoc => {
                let doc: Option<String> = redis::cmd("JSON.GET")
                    .arg(key)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| value_error(key, e))?;
                KeyValue::Json(doc.ok_or_else(|| StoreError::not_found(key))?)
            }
            KeyType::Other(tag) => KeyValue::unsupported(tag),
        };

        Ok(value)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(store_error)?;
        Ok(())
    }
}

// --- PRIVATE HELPERS ---

/// Runs one round trip, giving up with `StoreError::Timeout` after `limit`.
async fn within<T>(limit: Duration, request: impl Future<Output = RedisResult<T>>) -> StoreResult<T> {
    match timeout(limit, request).await {
        Ok(result) => result.map_err(store_error),
        Err(_) => Err(StoreError::Timeout),
    }
}

fn parse_metadata(reply: &[Value]) -> StoreResult<KeyMetadata> {
    let [ttl, size, tag] = reply else {
        return Err(StoreError::malformed(format!("expected {} replies per key", REPLIES_PER_KEY)));
    };

    let ttl_seconds: i64 = redis::from_redis_value(ttl)
        .map_err(|e| StoreError::malformed(format!("TTL reply: {}", e)))?;
    let size_bytes: Option<u64> = redis::from_redis_value(size)
        .map_err(|e| StoreError::malformed(format!("MEMORY USAGE reply: {}", e)))?;
    let tag: String = redis::from_redis_value(tag)
        .map_err(|e| StoreError::malformed(format!("TYPE reply: {}", e)))?;

    Ok(KeyMetadata {
        ttl_seconds,
        size_bytes,
        key_type: KeyType::from_tag(&tag),
    })
}

/// Redis drops empty collections, so an empty read means the key is gone.
fn non_empty<T>(key: &str, items: Vec<T>) -> StoreResult<Vec<T>> {
    if items.is_empty() {
        Err(StoreError::not_found(key))
    } else {
        Ok(items)
    }
}

fn store_error(err: RedisError) -> StoreError {
    if err.is_timeout() {
        return StoreError::Timeout;
    }
    // a reply that cannot convert (e.g. a non UTF-8 key from SCAN) fails the same way on retry
    if err.kind() == ErrorKind::TypeError {
        return StoreError::malformed(err.to_string());
    }
    StoreError::Transient {
        message: err.to_string(),
        source: Some(Arc::new(err)),
    }
}

fn value_error(key: &str, err: RedisError) -> StoreError {
    if err.kind() == ErrorKind::TypeError {
        return StoreError::ValueDecode {
            key: key.to_string(),
            message: err.to_string(),
        };
    }
    store_error(err)
}
