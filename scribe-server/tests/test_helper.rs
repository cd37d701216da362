//! Test helper utilities for spawning a Scribe server

#![allow(dead_code)]

use scribe_server::{
    AppState, EntityStore, IdGenerator, MemoryEntityStore, MetricsRegistry, WriteBehindCache,
    create_router,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

/// Predictable ids: "1", "2", ...
#[derive(Default)]
pub struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        (self.0.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

pub struct TestServer {
    pub base_url: String,
    pub cache: Arc<WriteBehindCache>,
    pub metrics: MetricsRegistry,
}

/// Spawn a server over an in-memory store, without a flush timer
pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with(Arc::new(MemoryEntityStore::new())).await
}

/// Spawn a server over `store`; tests drive flushes by hand
pub async fn spawn_test_server_with(store: Arc<dyn EntityStore>) -> TestServer {
    let cache = Arc::new(WriteBehindCache::new(store));
    let metrics = MetricsRegistry::new();
    cache.register_metrics(&metrics).unwrap();

    let state = AppState {
        cache: Arc::clone(&cache),
        ids: Arc::new(SequentialIds::default()),
        metrics: metrics.clone(),
        default_user: "createUser".to_string(),
    };
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        base_url,
        cache,
        metrics,
    }
}

/// Flush the cache on the blocking pool, as the scheduler would
pub async fn flush(cache: &Arc<WriteBehindCache>) {
    let cache = Arc::clone(cache);
    tokio::task::spawn_blocking(move || cache.flush())
        .await
        .unwrap();
}
