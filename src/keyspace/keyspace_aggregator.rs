//! Keyspace Aggregator: turns raw per-key store answers into namespace views.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use crate::dashboard::models::key_detail::{DetailMetadata, KeyDetail};
use crate::dashboard::models::keyspace::{KeyRecord, KeyspaceSummary, NamespaceBucket, SummaryMetadata};
use crate::error::{StoreError, StoreResult};
use crate::keyspace::namespace_of;
use crate::store::{KeyType, KeyValue, KeyspaceStore};

pub struct KeyspaceAggregator {
    store: Arc<dyn KeyspaceStore>,
}

impl KeyspaceAggregator {
    pub fn new(store: Arc<dyn KeyspaceStore>) -> Self {
        Self { store }
    }

    // ========================================
    // AGGREGATE VIEW
    // ========================================

    /// Snapshot of every key, grouped by namespace.
    ///
    /// One enumeration and one batched metadata call per invocation. Any
    /// failure of either fails the whole snapshot: a partial grouping would
    /// misreport the totals.
    pub async fn summarize(&self) -> StoreResult<KeyspaceSummary> {
        let keys = self.store.list_all_keys().await?;
        if keys.is_empty() {
            return Ok(KeyspaceSummary::empty(Utc::now()));
        }

        let metadata = self.store.batch_metadata(&keys).await?;
        if metadata.len() != keys.len() {
            return Err(StoreError::malformed(format!(
                "metadata batch returned {} entries for {} keys",
                metadata.len(),
                keys.len()
            )));
        }

        let total_keys = keys.len();
        let mut keyspaces: BTreeMap<String, NamespaceBucket> = BTreeMap::new();

        for (name, meta) in keys.into_iter().zip(metadata) {
            let bucket = keyspaces.entry(namespace_of(&name).to_string()).or_default();
            bucket.push(KeyRecord {
                name,
                key_type: meta.key_type,
                ttl_seconds: meta.ttl_seconds,
                size_bytes: meta.size_bytes.unwrap_or(0),
            });
        }

        tracing::debug!(total_keys, namespaces = keyspaces.len(), "Keyspace summarized");

        Ok(KeyspaceSummary {
            keyspaces,
            metadata: SummaryMetadata {
                total_keys,
                timestamp: Utc::now(),
            },
        })
    }

    /// Key count per namespace, projected from [`summarize`](Self::summarize).
    pub async fn counts_by_namespace(&self) -> StoreResult<BTreeMap<String, usize>> {
        let summary = self.summarize().await?;
        Ok(summary
            .keyspaces
            .iter()
            .map(|(namespace, bucket)| (namespace.clone(), bucket.total_count()))
            .collect())
    }

    // ========================================
    // SINGLE KEY VIEW
    // ========================================

    /// Metadata and decoded value of one key.
    ///
    /// Fails with `NotFound` if the key is absent. Once the key is known to
    /// exist, a value that cannot be read is reported inside `value` instead
    /// of failing the call.
    pub async fn describe(&self, key: &str) -> StoreResult<KeyDetail> {
        if !self.store.exists(key).await? {
            return Err(StoreError::not_found(key));
        }

        let meta = self
            .store
            .batch_metadata(&[key.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::malformed("metadata batch returned no entry"))?;

        // expired between the existence check and the metadata read
        if meta.is_absent() {
            return Err(StoreError::not_found(key));
        }

        let value = self.decode_value(key, &meta.key_type).await?;

        Ok(KeyDetail {
            name: key.to_string(),
            key_type: meta.key_type,
            ttl_seconds: meta.ttl_seconds,
            size_bytes: meta.size_bytes.unwrap_or(0),
            value,
            metadata: DetailMetadata { timestamp: Utc::now() },
        })
    }

    /// JSON reads depend on a server module, so any failure there is contained.
    /// Other types only contain a value that would not decode; outages propagate.
    async fn decode_value(&self, key: &str, key_type: &KeyType) -> StoreResult<KeyValue> {
        let err = match self.store.fetch_value(key, key_type).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let contained = match key_type {
            KeyType::JsonDoc => !err.is_not_found(),
            _ => matches!(err, StoreError::ValueDecode { .. }),
        };
        if !contained {
            return Err(err);
        }

        let diagnostic = match key_type {
            KeyType::JsonDoc => format!("Error reading JSON: {}", err),
            other => format!("Error reading {} value: {}", other, err),
        };

        tracing::warn!(key = %key, key_type = %key_type, error = %err, "Value read failed, returning diagnostic");
        Ok(KeyValue::Diagnostic(diagnostic))
    }
}
