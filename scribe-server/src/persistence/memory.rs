use super::types::{EntityStore, Result, StoreError};
use crate::core::Entity;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// In-process entity store.
///
/// Mirrors the relational store's contract: ids are unique, batches are
/// all-or-nothing and the store stamps `create_date` on insert.
#[derive(Default)]
pub struct MemoryEntityStore {
    data: RwLock<HashMap<String, Entity>>,
    closed: AtomicBool,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl EntityStore for MemoryEntityStore {
    fn create(&self, entity: &Entity) -> Result<()> {
        self.create_batch(std::slice::from_ref(entity))
    }

    fn create_batch(&self, entities: &[Entity]) -> Result<()> {
        self.ensure_open()?;

        let mut data = self.data.write();
        let mut seen = std::collections::HashSet::with_capacity(entities.len());
        for entity in entities {
            if data.contains_key(entity.id()) || !seen.insert(entity.id()) {
                return Err(StoreError::DuplicateId(entity.id().to_string()));
            }
        }

        let now = Utc::now();
        for entity in entities {
            data.insert(
                entity.id().to_string(),
                entity.clone().with_create_date(now),
            );
        }

        debug!("Memory store inserted {} entities", entities.len());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Entity>> {
        self.ensure_open()?;
        Ok(self.data.read().get(id).cloned())
    }

    fn get_all(&self) -> Result<Vec<Entity>> {
        self.ensure_open()?;
        Ok(self.data.read().values().cloned().collect())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.ensure_open()?;
        self.data.write().remove(id);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn health_check(&self) -> Result<()> {
        self.ensure_open()
    }
}
