#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use keyscope::error::{StoreError, StoreResult};
use keyscope::keyspace::KeyspaceAggregator;
use keyscope::store::{KeyMetadata, KeyType, KeyValue, KeyspaceStore, MemoryStore};
use keyscope::KeyscopeEngine;

// ========================================
// FIXTURES
// ========================================

/// A small bike shop: orders, customers, rankings, sessions and one stray key.
pub fn seed_bike_shop() -> MemoryStore {
    let store = MemoryStore::new();

    store.hset("orders:order_00001", [("status", "shipped"), ("total_amount", "450")]);
    store.hset("orders:order_00002", [("status", "pending"), ("total_amount", "1200")]);
    store.expire_in("orders:order_00002", Duration::from_secs(3600));

    store.rpush("customers:cust_001:history", ["Trek Pro", "Helmet"]);
    store.sadd("customers:cust_001:prefs", ["road", "carbon"]);

    store.zadd("analytics:popular_models", [("Trek Pro", 120.0), ("Giant Elite", 95.0)]);

    store.set_json(
        "sessions:sess_01",
        serde_json::json!({ "user": "cust_001", "cart": ["Trek Pro"] }),
    );
    store.expire_in("sessions:sess_01", Duration::from_secs(1800));

    store.set_string("standalone", "hello");
    store
}

pub fn setup_engine(store: impl KeyspaceStore + 'static) -> KeyscopeEngine {
    KeyscopeEngine::new(Arc::new(store))
}

pub fn setup_aggregator(store: impl KeyspaceStore + 'static) -> KeyspaceAggregator {
    KeyspaceAggregator::new(Arc::new(store))
}

// ========================================
// INSTRUMENTED STORES
// ========================================

/// Counts calls per primitive before delegating.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub list_calls: Arc<AtomicUsize>,
    pub batch_calls: Arc<AtomicUsize>,
    pub fetch_calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner, ..Default::default() }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyspaceStore for CountingStore {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_all_keys().await
    }

    async fn batch_metadata(&self, keys: &[String]) -> StoreResult<Vec<KeyMetadata>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.batch_metadata(keys).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.inner.exists(key).await
    }

    async fn fetch_value(&self, key: &str, key_type: &KeyType) -> StoreResult<KeyValue> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_value(key, key_type).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

/// Which primitive should fail, and how.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Failure {
    List,
    Batch,
    BatchTimeout,
    ShortBatch,
    JsonFetch,
    HashFetch,
    HashDecode,
    Ping,
}

/// Injects one failure into an otherwise healthy store.
#[derive(Clone)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub failure: Failure,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, failure: Failure) -> Self {
        Self { inner, failure }
    }
}

#[async_trait]
impl KeyspaceStore for FailingStore {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        if self.failure == Failure::List {
            return Err(StoreError::transient("connection reset by peer"));
        }
        self.inner.list_all_keys().await
    }

    async fn batch_metadata(&self, keys: &[String]) -> StoreResult<Vec<KeyMetadata>> {
        match self.failure {
            Failure::Batch => Err(StoreError::transient("broken pipe")),
            Failure::BatchTimeout => Err(StoreError::Timeout),
            Failure::ShortBatch => {
                let mut meta = self.inner.batch_metadata(keys).await?;
                meta.pop();
                Ok(meta)
            }
            _ => self.inner.batch_metadata(keys).await,
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.inner.exists(key).await
    }

    async fn fetch_value(&self, key: &str, key_type: &KeyType) -> StoreResult<KeyValue> {
        match (self.failure, key_type) {
            (Failure::JsonFetch, KeyType::JsonDoc) => Err(StoreError::transient("unknown command 'JSON.GET'")),
            (Failure::HashFetch, KeyType::Hash) => Err(StoreError::transient("connection reset by peer")),
            (Failure::HashDecode, KeyType::Hash) => Err(StoreError::ValueDecode {
                key: key.to_string(),
                message: "invalid UTF-8 in field value".to_string(),
            }),
            _ => self.inner.fetch_value(key, key_type).await,
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.failure == Failure::Ping {
            return Err(StoreError::transient("connection refused"));
        }
        self.inner.ping().await
    }
}

/// Deletes `victim` right after enumeration, reproducing an expiry race.
#[derive(Clone)]
pub struct VanishingStore {
    pub inner: MemoryStore,
    pub victim: String,
}

#[async_trait]
impl KeyspaceStore for VanishingStore {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        let keys = self.inner.list_all_keys().await?;
        self.inner.del(&self.victim);
        Ok(keys)
    }

    async fn batch_metadata(&self, keys: &[String]) -> StoreResult<Vec<KeyMetadata>> {
        self.inner.batch_metadata(keys).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let exists = self.inner.exists(key).await?;
        if key == self.victim {
            self.inner.del(&self.victim);
        }
        Ok(exists)
    }

    async fn fetch_value(&self, key: &str, key_type: &KeyType) -> StoreResult<KeyValue> {
        self.inner.fetch_value(key, key_type).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

// ========================================
// BENCHMARK
// ========================================

/// Times full keyspace passes; throughput is counted in keys, latency per pass.
pub struct KeyspaceBenchmark {
    pub label: String,
    pub keys_per_pass: usize,
    pub start: Instant,
    pub passes: Vec<Duration>,
}

impl KeyspaceBenchmark {
    pub fn start(label: &str, keys_per_pass: usize) -> Self {
        Self {
            label: label.to_string(),
            keys_per_pass,
            start: Instant::now(),
            passes: Vec::new(),
        }
    }

    pub fn record_pass(&mut self, elapsed: Duration) {
        self.passes.push(elapsed);
    }

    fn percentile(&self, pct: usize) -> Duration {
        let idx = (self.passes.len() * pct / 100).min(self.passes.len().saturating_sub(1));
        self.passes.get(idx).copied().unwrap_or(Duration::ZERO)
    }

    pub fn stop(mut self) {
        let wall = self.start.elapsed();
        let keys = self.keys_per_pass * self.passes.len();
        let keys_sec = keys as f64 / wall.as_secs_f64();

        self.passes.sort();
        let p50 = self.percentile(50);
        let per_key_ns = p50.as_nanos() / self.keys_per_pass.max(1) as u128;

        println!("\n{}", self.label);
        println!(" 🔑 Keyspace:    {} keys x {} passes", self.keys_per_pass, self.passes.len());
        println!(" 🚀 Throughput:  {:.0} keys/sec", keys_sec);
        println!(
            " 📊 Pass (ms):   p50: {} | p95: {} | p99: {} | MAX: {}",
            p50.as_millis(),
            self.percentile(95).as_millis(),
            self.percentile(99).as_millis(),
            self.passes.last().copied().unwrap_or(Duration::ZERO).as_millis()
        );
        println!(" ⏱️  Per key:     {} ns (p50)\n", per_key_ns);
    }
}
