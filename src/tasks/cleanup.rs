//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from the
//! in-memory store. Reads already ignore expired entries; the sweep only
//! reclaims their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs until aborted, sleeping for `cleanup_interval_secs` between
/// sweeps, independent of request traffic.
///
/// # Returns
/// A JoinHandle for the spawned task, used to abort it during shutdown.
///
/// # Example
/// ```ignore
/// let memory = Arc::new(MemoryStore::new());
/// let sweep = spawn_cleanup_task(memory.clone(), 60);
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
