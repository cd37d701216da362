use crate::core::Entity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Persistence error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Entity already exists: {0}")]
    DuplicateId(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Store is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable storage for entities.
///
/// All calls are synchronous and may block on I/O; async callers should
/// run them on the blocking pool.
pub trait EntityStore: Send + Sync {
    /// Durably insert one record; the store assigns its creation date
    fn create(&self, entity: &Entity) -> Result<()>;

    /// Durably insert every record of the batch
    fn create_batch(&self, entities: &[Entity]) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<Entity>>;

    /// List every stored record, in no particular order
    fn get_all(&self) -> Result<Vec<Entity>>;

    /// Remove a record; removing an absent id is not an error
    fn delete(&self, id: &str) -> Result<()>;

    /// Release the underlying resources
    fn close(&self) -> Result<()>;

    /// Cheap liveness check used by the health endpoint
    fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Which store backs the service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Configuration for the persistent store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            sqlite_path: PathBuf::from("./data/scribe.db"),
        }
    }
}
