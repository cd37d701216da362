//! Persistence module for entity storage
//!
//! Provides the durable side of the service through:
//! - The `EntityStore` contract consumed by the write-behind cache
//! - A SQLite implementation for production use
//! - An in-process implementation for tests and ephemeral deployments

pub mod memory;
pub mod sqlite;
pub mod types;

pub use memory::MemoryEntityStore;
pub use sqlite::SqliteEntityStore;
pub use types::{EntityStore, Result, StorageBackend, StorageConfig, StoreError};

use std::sync::Arc;

/// Open the store selected by the configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn EntityStore>> {
    let store: Arc<dyn EntityStore> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteEntityStore::open(&config.sqlite_path)?),
        StorageBackend::Memory => Arc::new(MemoryEntityStore::new()),
    };
    Ok(store)
}
