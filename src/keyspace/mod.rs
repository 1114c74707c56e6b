pub mod keyspace_aggregator;
pub mod namespace;

pub use keyspace_aggregator::KeyspaceAggregator;
pub use namespace::*;
