use std::sync::Arc;

use keyscope::config::Config;
use keyscope::dashboard::server::start_dashboard_server;
use keyscope::store::{open_connection, KeyspaceStore, RedisStore};
use keyscope::KeyscopeEngine;

// ========================================
// MAIN ENTRY POINT
// ========================================

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

    tracing::info!("🚀 Keyscope v{} starting...", env!("CARGO_PKG_VERSION"));

    let conn = match open_connection(&config.redis).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("FATAL: Failed to connect to Redis at {}:{}: {}", config.redis.host, config.redis.port, e);
            std::process::exit(1);
        }
    };
    let store = RedisStore::new(conn, &config.redis);

    match store.ping().await {
        Ok(()) => tracing::info!("📦 Connected to Redis at {}:{}", config.redis.host, config.redis.port),
        Err(e) => tracing::warn!("Redis did not answer PING: {}", e),
    }

    let engine = KeyscopeEngine::new(Arc::new(store));
    let addr = config.server.bind_addr();

    if let Err(e) = start_dashboard_server(engine, &addr).await {
        tracing::error!("FATAL: Keyspace API on {} stopped: {}", addr, e);
        std::process::exit(1);
    }
}
