//! Write-behind cache in front of an [`EntityStore`]
//!
//! New entities land in an in-memory *active* set and are acknowledged
//! immediately. A periodic flush swaps the active set out as the *draining*
//! set, writes it to the store in one batch, then drops it. Reads look at the
//! active set, then the draining set, then the store, so an entity is visible
//! from the moment it is created.
//!
//! Known limitations, kept on purpose:
//! - A failed batch is not retried. Its entities are dropped from memory and
//!   only reported through logs and the flush metrics. Creation means
//!   "accepted", not "durable".
//! - `delete` only retracts entities still in the active set. An entity that
//!   has already moved to the draining set is still written by the running
//!   flush, and the outcome depends on how the store orders the two calls.
//!   A store-side delete applied after the batch commits removes the row (the
//!   usual case on SQLite, whose writer waits for the batch), while one that
//!   lands before the batch is overtaken by the insert and the entity stays.
//! - `get_all` does not list draining entities while their batch is in flight.

use crate::metrics::{self, MetricsError, MetricsRegistry};
use crate::persistence::{EntityStore, Result};
use crate::scheduler::{ScheduledTask, Scheduler};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::Entity;

/// Name of the pending-entities gauge
pub const PENDING_GAUGE: &str = "entity_cache_size";

/// Default flush period
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

type PendingSet = HashMap<String, Entity>;

/// Active and draining sets. Both live behind one lock so the swap is a
/// single step for every reader.
#[derive(Default)]
struct PendingSlots {
    active: PendingSet,
    draining: Option<Arc<PendingSet>>,
}

/// Buffers created entities and persists them in periodic batches
pub struct WriteBehindCache {
    store: Arc<dyn EntityStore>,
    slots: RwLock<PendingSlots>,
    /// Size of the active set; only written while `slots` is write-locked
    pending: Arc<AtomicUsize>,
    /// Serializes flush cycles so at most one set drains at a time
    flush_lock: Mutex<()>,
}

impl WriteBehindCache {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            slots: RwLock::new(PendingSlots::default()),
            pending: Arc::new(AtomicUsize::new(0)),
            flush_lock: Mutex::new(()),
        }
    }

    /// Number of entities in the active set
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Number of entities currently being persisted
    pub fn draining_count(&self) -> usize {
        self.slots.read().draining.as_ref().map_or(0, |set| set.len())
    }

    /// Expose the pending count as a pollable gauge.
    ///
    /// The gauge reads the counter directly and never waits on the cache
    /// locks or a running flush.
    pub fn register_metrics(&self, registry: &MetricsRegistry) -> std::result::Result<(), MetricsError> {
        let pending = Arc::clone(&self.pending);
        registry.register_gauge(
            PENDING_GAUGE,
            "Entities accepted by the write-behind cache and not yet flushed",
            move || pending.load(Ordering::SeqCst) as i64,
        )
    }

    /// Drive the flush cycle from `scheduler`, starting now
    pub fn start(self: &Arc<Self>, scheduler: &Scheduler, period: Duration) -> ScheduledTask {
        info!("Starting write-behind flush task (interval={:?})", period);

        let cache = Arc::clone(self);
        scheduler.schedule_periodic("entity-cache-flush", period, move || cache.flush())
    }

    /// Run one flush cycle: swap, persist, release.
    ///
    /// Store failures are logged and counted, never returned; the entities
    /// of a failed batch are lost.
    pub fn flush(&self) {
        let _cycle = self.flush_lock.lock();

        let draining = {
            let mut slots = self.slots.write();
            let draining = Arc::new(mem::take(&mut slots.active));
            slots.draining = Some(Arc::clone(&draining));
            self.pending.store(0, Ordering::SeqCst);
            draining
        };

        let batch: Vec<Entity> = draining.values().cloned().collect();
        let started = Instant::now();
        let result = self.store.create_batch(&batch);
        let elapsed = started.elapsed();

        match result {
            Ok(()) => {
                if batch.is_empty() {
                    debug!("Flush cycle: nothing to persist");
                } else {
                    debug!("Flush cycle: {} entities persisted in {:?}", batch.len(), elapsed);
                }
                metrics::record_cache_flush("success", batch.len(), elapsed.as_secs_f64());
            }
            Err(e) => {
                error!(
                    "Flush cycle failed, dropping {} entities: {}",
                    batch.len(),
                    e
                );
                metrics::record_cache_flush("error", batch.len(), elapsed.as_secs_f64());
            }
        }

        let mut slots = self.slots.write();
        if slots
            .draining
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &draining))
        {
            slots.draining = None;
        }
    }
}

impl EntityStore for WriteBehindCache {
    /// Accept an entity without touching the store. A pending entity with the
    /// same id is replaced.
    fn create(&self, entity: &Entity) -> Result<()> {
        let mut slots = self.slots.write();
        slots.active.insert(entity.id().to_string(), entity.clone());
        self.pending.store(slots.active.len(), Ordering::SeqCst);
        debug!("Cached entity id={}", entity.id());
        Ok(())
    }

    /// Batches from callers bypass the cache
    fn create_batch(&self, entities: &[Entity]) -> Result<()> {
        self.store.create_batch(entities)
    }

    fn get(&self, id: &str) -> Result<Option<Entity>> {
        {
            let slots = self.slots.read();
            let cached = slots
                .active
                .get(id)
                .or_else(|| slots.draining.as_ref().and_then(|set| set.get(id)));
            if let Some(entity) = cached {
                return Ok(Some(entity.clone()));
            }
        }

        self.store.get(id)
    }

    fn get_all(&self) -> Result<Vec<Entity>> {
        let mut entities = self.store.get_all()?;
        entities.extend(self.slots.read().active.values().cloned());
        Ok(entities)
    }

    fn delete(&self, id: &str) -> Result<()> {
        {
            let mut slots = self.slots.write();
            if slots.active.remove(id).is_some() {
                self.pending.store(slots.active.len(), Ordering::SeqCst);
                debug!("Removed pending entity id={}", id);
            }
        }

        self.store.delete(id)
    }

    fn close(&self) -> Result<()> {
        self.store.close()
    }

    fn health_check(&self) -> Result<()> {
        self.store.health_check()
    }
}
