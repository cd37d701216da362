pub mod config;
pub mod core;
pub mod metrics;
pub mod persistence;
pub mod scheduler;
pub mod server;

// Re-export commonly used types
pub use config::ServerConfig;
pub use core::{
    Entity, EntityRequest, IdGenerator, ScribeError, UuidGenerator, WriteBehindCache,
};
pub use metrics::MetricsRegistry;
pub use persistence::{
    EntityStore, MemoryEntityStore, SqliteEntityStore, StorageBackend, StorageConfig, StoreError,
};
pub use scheduler::{ScheduledTask, Scheduler};
pub use server::{AppState, create_router, init_metrics, start_expirer};
