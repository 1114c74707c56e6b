//! In-memory `KeyspaceStore` for tests and local development.
//!
//! Entries live in a `DashMap` with an optional deadline. Expiry is lazy: an
//! entry past its deadline is invisible to every read, exactly as if the
//! store had already evicted it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use hashlink::LinkedHashMap;

use crate::error::{StoreError, StoreResult};
use crate::store::{KeyMetadata, KeyType, KeyValue, KeyspaceStore, TTL_ABSENT, TTL_PERSISTENT};

/// Rough fixed cost of one entry (dict slot, object header, expiry slot).
const ENTRY_OVERHEAD_BYTES: u64 = 56;

// ========================================
// STORED VALUES
// ========================================

#[derive(Clone, Debug)]
enum StoredValue {
    String(String),
    List(Vec<String>),
    Set(HashSet<String>),
    SortedSet(HashMap<String, f64>),
    Hash(LinkedHashMap<String, String>),
    Json(serde_json::Value),
    /// A value of a type this store only knows by tag (e.g. `stream`).
    Opaque(String),
}

impl StoredValue {
    fn key_type(&self) -> KeyType {
        match self {
            StoredValue::String(_) => KeyType::String,
            StoredValue::List(_) => KeyType::List,
            StoredValue::Set(_) => KeyType::Set,
            StoredValue::SortedSet(_) => KeyType::SortedSet,
            StoredValue::Hash(_) => KeyType::Hash,
            StoredValue::Json(_) => KeyType::JsonDoc,
            StoredValue::Opaque(tag) => KeyType::Other(tag.clone()),
        }
    }

    fn payload_bytes(&self) -> u64 {
        let bytes = match self {
            StoredValue::String(s) => s.len(),
            StoredValue::List(items) => items.iter().map(String::len).sum(),
            StoredValue::Set(members) => members.iter().map(String::len).sum(),
            StoredValue::SortedSet(members) => members.keys().map(|m| m.len() + 8).sum(),
            StoredValue::Hash(fields) => fields.iter().map(|(f, v)| f.len() + v.len()).sum(),
            StoredValue::Json(doc) => doc.to_string().len(),
            StoredValue::Opaque(_) => 0,
        };
        bytes as u64
    }
}

#[derive(Clone, Debug)]
struct Entry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

// ========================================
// MEMORY STORE
// ========================================

/// Cheap to clone; clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key.into(), StoredValue::String(value.into()));
    }

    /// Appends to the tail of a list, creating it if needed.
    pub fn rpush<I, V>(&self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.upsert(key.into(), StoredValue::List(Vec::new()), |stored| {
            if let StoredValue::List(items) = stored {
                items.extend(values);
            }
        });
    }

    pub fn sadd<I, V>(&self, key: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        self.upsert(key.into(), StoredValue::Set(HashSet::new()), |stored| {
            if let StoredValue::Set(set) = stored {
                set.extend(members);
            }
        });
    }

    pub fn zadd<I, M>(&self, key: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = (M, f64)>,
        M: Into<String>,
    {
        let members: Vec<(String, f64)> = members.into_iter().map(|(m, s)| (m.into(), s)).collect();
        self.upsert(key.into(), StoredValue::SortedSet(HashMap::new()), |stored| {
            if let StoredValue::SortedSet(scores) = stored {
                scores.extend(members);
            }
        });
    }

    pub fn hset<I, F, V>(&self, key: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        let fields: Vec<(String, String)> = fields.into_iter().map(|(f, v)| (f.into(), v.into())).collect();
        self.upsert(key.into(), StoredValue::Hash(LinkedHashMap::new()), |stored| {
            if let StoredValue::Hash(map) = stored {
                map.extend(fields);
            }
        });
    }

    pub fn set_json(&self, key: impl Into<String>, doc: serde_json::Value) {
        self.put(key.into(), StoredValue::Json(doc));
    }

    /// Stores a key whose type is known only by its tag.
    pub fn set_opaque(&self, key: impl Into<String>, tag: impl Into<String>) {
        self.put(key.into(), StoredValue::Opaque(tag.into()));
    }

    /// Sets a deadline on a live key. Returns false if the key does not exist.
    pub fn expire_in(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        match self.inner.get_mut(key) {
            Some(mut entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                true
            }
            _ => false,
        }
    }

    pub fn del(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    fn put(&self, key: String, value: StoredValue) {
        self.inner.insert(key, Entry { value, expires_at: None });
    }

    /// Mutates a collection in place; a missing, expired or differently-typed
    /// entry is replaced by `empty` first.
    fn upsert(&self, key: String, empty: StoredValue, apply: impl FnOnce(&mut StoredValue)) {
        let now = Instant::now();
        let mut entry = self.inner.entry(key).or_insert_with(|| Entry {
            value: empty.clone(),
            expires_at: None,
        });
        if !entry.is_live(now) || entry.value.key_type() != empty.key_type() {
            *entry = Entry { value: empty, expires_at: None };
        }
        apply(&mut entry.value);
    }

    /// Clone of a live entry.
    fn live(&self, key: &str) -> Option<Entry> {
        let entry = self.inner.get(key)?;
        if entry.is_live(Instant::now()) {
            Some(entry.value().clone())
        } else {
            None
        }
    }

    fn metadata_of(&self, key: &str, now: Instant) -> KeyMetadata {
        let Some(entry) = self.inner.get(key).filter(|e| e.is_live(now)) else {
            return KeyMetadata {
                ttl_seconds: TTL_ABSENT,
                size_bytes: None,
                key_type: KeyType::Other("none".to_string()),
            };
        };

        let ttl_seconds = match entry.expires_at {
            None => TTL_PERSISTENT,
            // rounded like the real store: (ms + 500) / 1000
            Some(expiry) => ((expiry - now).as_millis() as i64 + 500) / 1000,
        };

        KeyMetadata {
            ttl_seconds,
            size_bytes: Some(key.len() as u64 + entry.value.payload_bytes() + ENTRY_OVERHEAD_BYTES),
            key_type: entry.value.key_type(),
        }
    }
}

#[async_trait]
impl KeyspaceStore for MemoryStore {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        Ok(self
            .inner
            .iter()
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn batch_metadata(&self, keys: &[String]) -> StoreResult<Vec<KeyMetadata>> {
        let now = Instant::now();
        Ok(keys.iter().map(|key| self.metadata_of(key, now)).collect())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.live(key).is_some())
    }

    async fn fetch_value(&self, key: &str, key_type: &KeyType) -> StoreResult<KeyValue> {
        if let KeyType::Other(tag) = key_type {
            return Ok(KeyValue::unsupported(tag));
        }

        let entry = self.live(key).ok_or_else(|| StoreError::not_found(key))?;
        if &entry.value.key_type() != key_type {
            return Err(StoreError::ValueDecode {
                key: key.to_string(),
                message: format!("stored as {}, requested as {}", entry.value.key_type(), key_type),
            });
        }

        let value = match entry.value {
            StoredValue::String(s) => KeyValue::String(s),
            StoredValue::List(items) => KeyValue::List(items),
            StoredValue::Set(members) => {
                let mut members: Vec<String> = members.into_iter().collect();
                members.sort();
                KeyValue::Set(members)
            }
            StoredValue::SortedSet(scores) => {
                let mut members: Vec<(String, f64)> = scores.into_iter().collect();
                members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                KeyValue::SortedSet(members)
            }
            StoredValue::Hash(fields) => KeyValue::Hash(fields),
            StoredValue::Json(doc) => KeyValue::Json(doc.to_string()),
            StoredValue::Opaque(tag) => KeyValue::unsupported(&tag),
        };

        Ok(value)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
