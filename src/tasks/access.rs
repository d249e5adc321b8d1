//! Access Count Worker
//!
//! Background task that bumps the `access_count` of distributed cache
//! records after a hit. Updates are best effort: a full queue drops them and
//! store failures are only logged.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::distributed::{CacheRecord, KvStore};
use crate::error::StoreResult;

/// Queue feeding the worker. Cloned into every facade handle.
#[derive(Debug, Clone)]
pub(crate) struct AccessTracker {
    tx: mpsc::Sender<String>,
}

impl AccessTracker {
    /// Queues a key without waiting. Returns false if the update was dropped.
    pub(crate) fn track(&self, key: String) -> bool {
        match self.tx.try_send(key) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(key)) => {
                debug!(key = %key, "Access update queue full, dropping update");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Spawns the worker. It exits once every [`AccessTracker`] is dropped.
pub(crate) fn spawn_access_worker(
    store: Arc<dyn KvStore>,
    capacity: usize,
) -> (AccessTracker, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(key) = rx.recv().await {
            if let Err(err) = bump_access_count(store.as_ref(), &key).await {
                debug!(key = %key, error = %err, "Access count update failed");
            }
        }
        trace!("Access count worker stopped");
    });

    (AccessTracker { tx }, handle)
}

/// Rewrites the record with `access_count + 1`, keeping its remaining TTL.
///
/// The write only lands if the record is byte-for-byte what was read, so a
/// `set` racing the update always wins. Records without expiry keep none.
/// Returns whether the count was bumped.
async fn bump_access_count(store: &dyn KvStore, key: &str) -> StoreResult<bool> {
    let Some(bytes) = store.get(key).await? else {
        return Ok(false);
    };
    let mut record = CacheRecord::decode(&bytes)?;

    // None means no expiry here; a key that vanished fails the swap anyway.
    let ttl = match store.ttl(key).await? {
        Some(remaining) if remaining.is_zero() => return Ok(false),
        Some(remaining) => remaining,
        None => Duration::ZERO,
    };

    record.access_count += 1;
    let swapped = store
        .compare_and_set(key, &bytes, record.encode()?, ttl)
        .await?;
    if !swapped {
        trace!(key, "Record changed during access update, skipping");
    }
    Ok(swapped)
}
