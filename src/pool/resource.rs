//! Pooled Resource Module
//!
//! Handles and metadata for resources owned by a pool. Resources are tracked
//! by an explicit [`ResourceId`], never by their own identity.

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::Serialize;
use tokio::time::Instant;

use crate::pool::manager::SlotGuard;

// == Resource Id ==
/// Pool-local handle of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// == Resource Meta ==
/// Lifecycle bookkeeping kept for every live resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceMeta {
    pub created_at: Instant,
    pub last_acquired: Option<Instant>,
    pub last_released: Option<Instant>,
    pub acquire_count: u64,
}

impl ResourceMeta {
    pub(crate) fn new() -> Self {
        Self {
            created_at: Instant::now(),
            last_acquired: None,
            last_released: None,
            acquire_count: 0,
        }
    }

    pub(crate) fn mark_acquired(&mut self) {
        self.acquire_count += 1;
        self.last_acquired = Some(Instant::now());
    }

    pub(crate) fn mark_released(&mut self) {
        self.last_released = Some(Instant::now());
    }

    /// Instant the resource last became idle; creation for never-leased ones.
    pub(crate) fn idle_since(&self) -> Instant {
        self.last_released.unwrap_or(self.created_at)
    }
}

/// A resource sitting in the available set.
pub(crate) struct IdleResource<R> {
    pub(crate) id: ResourceId,
    pub(crate) resource: R,
    pub(crate) meta: ResourceMeta,
}

// == Lease ==
/// A resource checked out of a pool.
///
/// Hand it back with `ResourcePool::release`. A lease that is dropped
/// instead (early return, panic) frees its slot; the resource is dropped
/// without going through the factory's teardown.
#[must_use = "leased resources should be released back to their pool"]
pub struct Lease<R> {
    pub(crate) id: ResourceId,
    pub(crate) resource: R,
    pub(crate) acquire_count: u64,
    pub(crate) slot: SlotGuard<R>,
}

impl<R> Lease<R> {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// How many times this resource has been handed out, this lease included.
    pub fn acquire_count(&self) -> u64 {
        self.acquire_count
    }
}

impl<R> Deref for Lease<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R> DerefMut for Lease<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.resource
    }
}

impl<R: fmt::Debug> fmt::Debug for Lease<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("id", &self.id)
            .field("resource", &self.resource)
            .finish()
    }
}

// == Pool Stats ==
/// Read-only snapshot of pool occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub available_count: usize,
    pub in_use_count: usize,
    pub max_size: usize,
    pub min_size: usize,
    /// Creations currently running outside the lock
    pub pending_count: usize,
    pub total_created: u64,
    pub total_destroyed: u64,
}

impl PoolStats {
    pub fn total(&self) -> usize {
        self.available_count + self.in_use_count
    }
}
