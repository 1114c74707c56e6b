pub mod config;
pub mod dashboard;
pub mod error;
pub mod keyspace;
pub mod store;

use std::sync::Arc;
use std::time::Instant;

use crate::keyspace::KeyspaceAggregator;
use crate::store::KeyspaceStore;

// ========================================
// ENGINE
// ========================================

/// Shared handle behind every request.
/// Cheap to clone (all fields are Arcs or Copy).
#[derive(Clone)]
pub struct KeyscopeEngine {
    pub store: Arc<dyn KeyspaceStore>,
    pub keyspace: Arc<KeyspaceAggregator>,
    pub start_time: Instant,
}

impl KeyscopeEngine {
    pub fn new(store: Arc<dyn KeyspaceStore>) -> Self {
        Self {
            keyspace: Arc::new(KeyspaceAggregator::new(store.clone())),
            store,
            start_time: Instant::now(),
        }
    }
}
