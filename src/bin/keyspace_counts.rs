//! Prints the key count of every namespace once and exits.

use std::sync::Arc;

use keyscope::config::Config;
use keyscope::keyspace::KeyspaceAggregator;
use keyscope::store::{open_connection, RedisStore};

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.server.log_filter())
        .init();

    let counts = match open_connection(&config.redis).await {
        Ok(conn) => {
            let aggregator = KeyspaceAggregator::new(Arc::new(RedisStore::new(conn, &config.redis)));
            aggregator.counts_by_namespace().await
        }
        Err(e) => Err(e),
    };

    match counts {
        Ok(counts) => {
            println!("Keyspace Counts:");
            for (namespace, count) in counts {
                println!("{}: {} keys", namespace, count);
            }
        }
        Err(e) => {
            tracing::error!("Failed to count keyspace: {}", e);
            std::process::exit(1);
        }
    }
}
