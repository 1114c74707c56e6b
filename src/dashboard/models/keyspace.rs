use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::utils::iso_timestamp;
use crate::store::KeyType;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct KeyRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    #[serde(rename = "ttl")]
    pub ttl_seconds: i64,
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

impl KeyRecord {
    /// Keys without expiry (-1) and absent keys (-2) are never expiring.
    pub fn is_expiring(&self) -> bool {
        self.ttl_seconds >= 0
    }
}

/// All keys sharing a namespace, with running totals.
///
/// Totals are only ever updated together with `keys` through [`push`](Self::push).
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct NamespaceBucket {
    keys: Vec<KeyRecord>,
    total_count: usize,
    total_size: u64,
    expiring_count: usize,
}

impl NamespaceBucket {
    pub fn push(&mut self, record: KeyRecord) {
        self.total_count += 1;
        self.total_size += record.size_bytes;
        if record.is_expiring() {
            self.expiring_count += 1;
        }
        self.keys.push(record);
    }

    pub fn keys(&self) -> &[KeyRecord] {
        &self.keys
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn expiring_count(&self) -> usize {
        self.expiring_count
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SummaryMetadata {
    pub total_keys: usize,
    #[serde(serialize_with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time view of the whole keyspace.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct KeyspaceSummary {
    pub keyspaces: BTreeMap<String, NamespaceBucket>,
    pub metadata: SummaryMetadata,
}

impl KeyspaceSummary {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            keyspaces: BTreeMap::new(),
            metadata: SummaryMetadata { total_keys: 0, timestamp },
        }
    }

    pub fn total_keys(&self) -> usize {
        self.metadata.total_keys
    }

    pub fn bucket(&self, namespace: &str) -> Option<&NamespaceBucket> {
        self.keyspaces.get(namespace)
    }
}
