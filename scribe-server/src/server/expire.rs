//! Periodic expiry hook of the entity API.
//!
//! Runs on its own timer, separate from the cache flush. It currently has
//! nothing to expire; deployments that need retention plug in here.

use crate::scheduler::{ScheduledTask, Scheduler};
use std::time::Duration;
use tracing::debug;

/// Default period of the expiry hook
pub const DEFAULT_EXPIRE_INTERVAL: Duration = Duration::from_secs(3600);

/// Register the expiry hook against `scheduler`, first run immediately
pub fn start_expirer(scheduler: &Scheduler, period: Duration) -> ScheduledTask {
    scheduler.schedule_periodic("entity-expirer", period, expire)
}

fn expire() {
    debug!("Entity expiry hook ran");
}
