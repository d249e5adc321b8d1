//! Resource Pool Module
//!
//! Bounded pool of factory-built resources with idle reaping and
//! health-checked recycling. One lock guards all bookkeeping; factory calls
//! and resource teardown always run outside it.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::pool::{IdleResource, Lease, PoolStats, ResourceFactory, ResourceId, ResourceMeta};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

struct PoolState<R> {
    /// Idle resources, most recently released at the back
    available: VecDeque<IdleResource<R>>,
    in_use: HashMap<ResourceId, ResourceMeta>,
    /// Slots reserved by creations running outside the lock
    pending: usize,
    next_id: u64,
    closed: bool,
    total_created: u64,
    total_destroyed: u64,
}

impl<R> PoolState<R> {
    fn total(&self) -> usize {
        self.available.len() + self.in_use.len() + self.pending
    }

    fn register(&mut self) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.total_created += 1;
        id
    }
}

/// Bookkeeping shared between a pool and the guards it hands out.
pub(crate) struct PoolShared<R> {
    state: Mutex<PoolState<R>>,
    released: Notify,
}

// == Slot Guards ==
/// Frees a lease's slot when the lease is dropped instead of released.
///
/// The resource itself is dropped with the lease, without factory teardown.
pub(crate) struct SlotGuard<R> {
    shared: Arc<PoolShared<R>>,
    id: ResourceId,
    armed: bool,
}

impl<R> SlotGuard<R> {
    fn disarm(mut self) {
        self.armed = false;
    }

    fn belongs_to(&self, shared: &Arc<PoolShared<R>>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }
}

impl<R> Drop for SlotGuard<R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let freed = {
            let mut state = self.shared.state.lock();
            let freed = state.in_use.remove(&self.id).is_some();
            if freed {
                state.total_destroyed += 1;
            }
            freed
        };
        if freed {
            warn!(resource = %self.id, "Lease dropped without release, slot reclaimed");
            self.shared.released.notify_one();
        }
    }
}

/// A `pending` slot held while the factory runs outside the lock.
///
/// Dropping it unsettled (the acquiring future was cancelled mid-create)
/// gives the slot back.
struct Reservation<R> {
    shared: Arc<PoolShared<R>>,
    active: bool,
}

impl<R> Reservation<R> {
    fn settle(&mut self, state: &mut PoolState<R>) {
        state.pending -= 1;
        self.active = false;
    }
}

impl<R> Drop for Reservation<R> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        self.shared.state.lock().pending -= 1;
        debug!("Abandoned resource creation, slot freed");
        self.shared.released.notify_one();
    }
}

enum Step<R> {
    Ready(Lease<R>),
    Create(Reservation<R>),
    Wait,
}

// == Resource Pool ==
/// Generic pool handing out [`Lease`]s over factory-built resources.
///
/// Share it behind an `Arc`. Leases should come back through
/// [`release`](Self::release); a dropped lease only frees its slot.
pub struct ResourcePool<F: ResourceFactory> {
    id: u64,
    factory: F,
    config: PoolConfig,
    shared: Arc<PoolShared<F::Resource>>,
}

impl<F: ResourceFactory> ResourcePool<F> {
    // == Constructor ==
    /// Validates the bounds and eagerly builds `min_size` resources.
    ///
    /// If any of those creations fails, the ones already built are destroyed
    /// before the error is returned.
    pub async fn new(factory: F, config: PoolConfig) -> PoolResult<Self> {
        if config.max_size == 0 {
            return Err(PoolError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if config.min_size > config.max_size {
            return Err(PoolError::InvalidConfig(format!(
                "min_size {} exceeds max_size {}",
                config.min_size, config.max_size
            )));
        }

        let pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            factory,
            config,
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    available: VecDeque::new(),
                    in_use: HashMap::new(),
                    pending: 0,
                    next_id: 1,
                    closed: false,
                    total_created: 0,
                    total_destroyed: 0,
                }),
                released: Notify::new(),
            }),
        };

        for _ in 0..pool.config.min_size {
            let resource = match pool.factory.create().await {
                Ok(resource) => resource,
                Err(err) => {
                    let built: Vec<_> = pool
                        .shared
                        .state
                        .lock()
                        .available
                        .drain(..)
                        .map(|idle| idle.resource)
                        .collect();
                    warn!(pool = pool.id, built = built.len(), error = %err, "Pool prebuild failed");
                    pool.destroy_all(built).await;
                    return Err(PoolError::Creation(err));
                }
            };
            let mut state = pool.shared.state.lock();
            let id = state.register();
            state.available.push_back(IdleResource {
                id,
                resource,
                meta: ResourceMeta::new(),
            });
        }

        info!(
            pool = pool.id,
            min_size = pool.config.min_size,
            max_size = pool.config.max_size,
            "Resource pool created"
        );
        Ok(pool)
    }

    // == Acquire ==
    /// Checks a resource out, waiting up to `timeout` for one to free up.
    ///
    /// Each round prunes unhealthy and idle-expired resources, then reuses an
    /// available resource, builds a new one if under `max_size`, or waits for
    /// a release (bounded by the configured poll interval) and retries.
    /// Cancelling the returned future never leaks a slot.
    pub async fn acquire(&self, timeout: Duration) -> PoolResult<Lease<F::Resource>> {
        let deadline = Instant::now() + timeout;

        loop {
            let (step, pruned) = {
                let mut state = self.shared.state.lock();
                if state.closed {
                    return Err(PoolError::Closed);
                }
                let pruned = self.prune(&mut state);
                self.check_invariants(&state);
                let step = self.next_step(&mut state);
                (step, pruned)
            };
            self.destroy_all(pruned).await;

            match step {
                Step::Ready(lease) => {
                    debug!(pool = self.id, resource = %lease.id, "Reused pooled resource");
                    return Ok(lease);
                }
                Step::Create(reservation) => return self.create_leased(reservation).await,
                Step::Wait => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(pool = self.id, ?timeout, "Resource pool exhausted");
                        return Err(PoolError::Exhausted(timeout));
                    }
                    let wait = self.config.poll_interval.min(deadline - now);
                    let _ = tokio::time::timeout(wait, self.shared.released.notified()).await;
                }
            }
        }
    }

    /// [`acquire`](Self::acquire) with the configured default timeout.
    pub async fn acquire_default(&self) -> PoolResult<Lease<F::Resource>> {
        self.acquire(self.config.acquire_timeout).await
    }

    // == Release ==
    /// Returns a lease to the pool.
    ///
    /// Healthy resources go back to the available set. Unhealthy ones, and
    /// any lease handed back after [`close_all`](Self::close_all), are
    /// destroyed; the free slot is refilled lazily by a later `acquire`.
    pub async fn release(&self, lease: Lease<F::Resource>) {
        let Lease {
            id, resource, slot, ..
        } = lease;

        if !slot.belongs_to(&self.shared) {
            // Dropping the guard frees the slot in the owning pool.
            warn!(pool = self.id, resource = %id, "Released lease belongs to another pool");
            drop(slot);
            self.factory.destroy(resource).await;
            return;
        }
        slot.disarm();

        let healthy = self.factory.is_healthy(&resource);

        let (discard, pruned) = {
            let mut state = self.shared.state.lock();
            match state.in_use.remove(&id) {
                Some(mut meta) if healthy && !state.closed => {
                    meta.mark_released();
                    state.available.push_back(IdleResource { id, resource, meta });
                    let pruned = self.prune(&mut state);
                    self.check_invariants(&state);
                    (None, pruned)
                }
                Some(_) => {
                    state.total_destroyed += 1;
                    let pruned = self.prune(&mut state);
                    (Some(resource), pruned)
                }
                // Bookkeeping was cleared by close_all.
                None => (Some(resource), Vec::new()),
            }
        };

        if let Some(resource) = discard {
            debug!(pool = self.id, resource = %id, healthy, "Destroying released resource");
            self.factory.destroy(resource).await;
        }
        self.destroy_all(pruned).await;
        self.shared.released.notify_one();
    }

    // == Close All ==
    /// Destroys every available resource and forgets every lease.
    ///
    /// Outstanding leases are destroyed when they are released. Waiting and
    /// future `acquire` calls fail with [`PoolError::Closed`].
    pub async fn close_all(&self) {
        let (drained, abandoned) = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            let drained: Vec<_> = state.available.drain(..).map(|idle| idle.resource).collect();
            let abandoned = state.in_use.len();
            state.in_use.clear();
            state.total_destroyed += (drained.len() + abandoned) as u64;
            (drained, abandoned)
        };

        info!(
            pool = self.id,
            destroyed = drained.len(),
            outstanding = abandoned,
            "Closing resource pool"
        );
        self.destroy_all(drained).await;
        self.shared.released.notify_waiters();
    }

    // == Stats ==
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats {
            available_count: state.available.len(),
            in_use_count: state.in_use.len(),
            max_size: self.config.max_size,
            min_size: self.config.min_size,
            pending_count: state.pending,
            total_created: state.total_created,
            total_destroyed: state.total_destroyed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // == Internals ==

    fn lease(&self, id: ResourceId, resource: F::Resource, acquire_count: u64) -> Lease<F::Resource> {
        Lease {
            id,
            resource,
            acquire_count,
            slot: SlotGuard {
                shared: Arc::clone(&self.shared),
                id,
                armed: true,
            },
        }
    }

    /// Picks the next action while holding the lock.
    fn next_step(&self, state: &mut PoolState<F::Resource>) -> Step<F::Resource> {
        if let Some(mut idle) = state.available.pop_back() {
            idle.meta.mark_acquired();
            state.in_use.insert(idle.id, idle.meta);
            return Step::Ready(self.lease(idle.id, idle.resource, idle.meta.acquire_count));
        }

        if state.total() < self.config.max_size {
            state.pending += 1;
            return Step::Create(Reservation {
                shared: Arc::clone(&self.shared),
                active: true,
            });
        }

        Step::Wait
    }

    /// Runs the factory for a reserved slot.
    async fn create_leased(
        &self,
        mut reservation: Reservation<F::Resource>,
    ) -> PoolResult<Lease<F::Resource>> {
        let created = self.factory.create().await;

        let registered = {
            let mut state = self.shared.state.lock();
            reservation.settle(&mut state);
            match &created {
                Ok(_) if !state.closed => {
                    let id = state.register();
                    let mut meta = ResourceMeta::new();
                    meta.mark_acquired();
                    state.in_use.insert(id, meta);
                    self.check_invariants(&state);
                    Some(id)
                }
                _ => None,
            }
        };

        match (created, registered) {
            (Ok(resource), Some(id)) => {
                debug!(pool = self.id, resource = %id, "Created pooled resource");
                Ok(self.lease(id, resource, 1))
            }
            (Ok(resource), None) => {
                self.factory.destroy(resource).await;
                Err(PoolError::Closed)
            }
            (Err(err), _) => {
                warn!(pool = self.id, error = %err, "Resource factory failed");
                // The reserved slot is free again.
                self.shared.released.notify_one();
                Err(PoolError::Creation(err))
            }
        }
    }

    /// Removes unhealthy resources and idle-expired ones above `min_size`.
    fn prune(&self, state: &mut PoolState<F::Resource>) -> Vec<F::Resource> {
        let now = Instant::now();
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(state.available.len());

        // Front holds the longest-idle resources, so they are reaped first.
        while let Some(idle) = state.available.pop_front() {
            let live = kept.len() + state.available.len() + state.in_use.len() + state.pending;
            let expired = now.saturating_duration_since(idle.meta.idle_since())
                > self.config.max_idle_time;

            if !self.factory.is_healthy(&idle.resource) {
                debug!(pool = self.id, resource = %idle.id, "Pruning unhealthy resource");
                removed.push(idle.resource);
            } else if expired && live >= self.config.min_size {
                debug!(pool = self.id, resource = %idle.id, "Reaping idle resource");
                removed.push(idle.resource);
            } else {
                kept.push_back(idle);
            }
        }

        state.available = kept;
        state.total_destroyed += removed.len() as u64;
        removed
    }

    async fn destroy_all(&self, resources: Vec<F::Resource>) {
        for resource in resources {
            self.factory.destroy(resource).await;
        }
    }

    fn check_invariants(&self, state: &PoolState<F::Resource>) {
        debug_assert!(
            state.total() <= self.config.max_size,
            "pool holds {} resources, max is {}",
            state.total(),
            self.config.max_size
        );
        debug_assert!(
            state
                .available
                .iter()
                .all(|idle| !state.in_use.contains_key(&idle.id)),
            "resource present in both available and in-use sets"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::FnFactory;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn counting_factory() -> (FnFactory<usize>, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let factory = FnFactory::new(move || Ok(c.fetch_add(1, Ordering::SeqCst)));
        (factory, counter)
    }

    #[tokio::test]
    async fn test_new_builds_min_size() {
        let (factory, counter) = counting_factory();
        let pool = assert_ok!(ResourcePool::new(factory, PoolConfig::new(2, 4)).await);

        let stats = pool.stats();
        assert_eq!(stats.available_count, 2);
        assert_eq!(stats.in_use_count, 0);
        assert_eq!(stats.total_created, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_bounds_rejected() {
        let (factory, _) = counting_factory();
        let result = ResourcePool::new(factory, PoolConfig::new(3, 2)).await;
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));

        let (factory, _) = counting_factory();
        let result = ResourcePool::new(factory, PoolConfig::new(0, 0)).await;
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_acquire_reuses_released_resource() {
        let (factory, counter) = counting_factory();
        let pool = ResourcePool::new(factory, PoolConfig::new(1, 3)).await.unwrap();

        let lease = pool.acquire(Duration::from_millis(100)).await.unwrap();
        let first = *lease;
        assert_eq!(lease.acquire_count(), 1);
        pool.release(lease).await;

        let lease = pool.acquire(Duration::from_millis(100)).await.unwrap();
        assert_eq!(*lease, first);
        assert_eq!(lease.acquire_count(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        pool.release(lease).await;
    }

    #[tokio::test]
    async fn test_acquire_grows_to_max() {
        let (factory, _) = counting_factory();
        let pool = ResourcePool::new(factory, PoolConfig::new(0, 2)).await.unwrap();

        let a = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let b = pool.acquire(Duration::from_millis(50)).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(pool.stats().in_use_count, 2);

        pool.release(a).await;
        pool.release(b).await;
        assert_eq!(pool.stats().available_count, 2);
    }

    #[tokio::test]
    async fn test_exhaustion_times_out() {
        let (factory, _) = counting_factory();
        let pool = ResourcePool::new(factory, PoolConfig::new(0, 1)).await.unwrap();

        let held = pool.acquire(Duration::from_millis(50)).await.unwrap();

        let started = std::time::Instant::now();
        let result = pool.acquire(Duration::from_millis(200)).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(PoolError::Exhausted(_))));
        assert!(elapsed >= Duration::from_millis(190), "returned early: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(600), "returned late: {:?}", elapsed);

        pool.release(held).await;
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_release() {
        let (factory, _) = counting_factory();
        let pool = Arc::new(
            ResourcePool::new(factory, PoolConfig::new(0, 1)).await.unwrap(),
        );

        let held = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let held_id = held.id();

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire(Duration::from_secs(2)).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        pool.release(held).await;

        let lease = waiter.await.unwrap().unwrap();
        assert_eq!(lease.id(), held_id);
        pool.release(lease).await;
    }

    #[tokio::test]
    async fn test_unhealthy_release_destroys() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        // Odd-numbered resources fail the health check.
        let factory = FnFactory::new(move || Ok(c.fetch_add(1, Ordering::SeqCst)))
            .with_health_check(|n: &usize| n % 2 == 0);
        let pool = ResourcePool::new(factory, PoolConfig::new(0, 2)).await.unwrap();

        let a = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let b = pool.acquire(Duration::from_millis(50)).await.unwrap();
        assert_eq!((*a, *b), (0, 1));

        pool.release(a).await;
        pool.release(b).await;

        let stats = pool.stats();
        assert_eq!(stats.available_count, 1);
        assert_eq!(stats.in_use_count, 0);
        assert_eq!(stats.total_destroyed, 1);

        // The freed slot is refilled lazily.
        let a = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let c = pool.acquire(Duration::from_millis(50)).await.unwrap();
        assert_eq!(*a, 0);
        assert_eq!(*c, 2);
        pool.release(a).await;
        pool.release(c).await;
    }

    #[tokio::test]
    async fn test_creation_failure_keeps_bookkeeping() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&attempts);
        let factory = FnFactory::new(move || {
            if a.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("connection refused")
            }
            Ok(7u32)
        });
        let pool = ResourcePool::new(factory, PoolConfig::new(0, 1)).await.unwrap();

        let err = assert_err!(pool.acquire(Duration::from_millis(50)).await);
        assert!(matches!(err, PoolError::Creation(_)));
        assert_eq!(pool.stats().pending_count, 0);

        // The failed attempt did not consume the only slot.
        let lease = pool.acquire(Duration::from_millis(50)).await.unwrap();
        assert_eq!(*lease, 7);
        pool.release(lease).await;
    }

    #[tokio::test]
    async fn test_idle_reaping_respects_min_size() {
        let (factory, _) = counting_factory();
        let config = PoolConfig::new(1, 3).with_max_idle_time(Duration::from_millis(50));
        let pool = ResourcePool::new(factory, config).await.unwrap();

        let a = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let b = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let c = pool.acquire(Duration::from_millis(50)).await.unwrap();
        pool.release(a).await;
        pool.release(b).await;
        pool.release(c).await;
        assert_eq!(pool.stats().available_count, 3);

        tokio::time::sleep(Duration::from_millis(120)).await;

        // The next acquire reaps down to min_size before handing one out.
        let lease = pool.acquire(Duration::from_millis(50)).await.unwrap();
        let stats = pool.stats();
        assert_eq!(stats.available_count + stats.in_use_count, 1);
        assert_eq!(stats.total_destroyed, 2);
        pool.release(lease).await;
    }

    #[tokio::test]
    async fn test_close_all() {
        let (factory, _) = counting_factory();
        let pool = ResourcePool::new(factory, PoolConfig::new(2, 3)).await.unwrap();

        let outstanding = pool.acquire(Duration::from_millis(50)).await.unwrap();
        pool.close_all().await;

        let stats = pool.stats();
        assert_eq!(stats.available_count, 0);
        assert_eq!(stats.in_use_count, 0);
        assert!(pool.is_closed());
        assert!(matches!(
            pool.acquire(Duration::from_millis(50)).await,
            Err(PoolError::Closed)
        ));

        // Late release is destroyed, not pooled.
        pool.release(outstanding).await;
        assert_eq!(pool.stats().available_count, 0);
    }

    #[tokio::test]
    async fn test_foreign_lease_not_pooled() {
        let (f1, _) = counting_factory();
        let (f2, _) = counting_factory();
        let first = ResourcePool::new(f1, PoolConfig::new(0, 1)).await.unwrap();
        let second = ResourcePool::new(f2, PoolConfig::new(0, 1)).await.unwrap();

        let lease = first.acquire(Duration::from_millis(50)).await.unwrap();
        second.release(lease).await;

        assert_eq!(second.stats().available_count, 0);
        // The owning pool gets its slot back.
        assert_eq!(first.stats().in_use_count, 0);
        let lease = assert_ok!(first.acquire(Duration::from_millis(50)).await);
        first.release(lease).await;
    }

    #[tokio::test]
    async fn test_acquire_default_uses_configured_timeout() {
        let (factory, _) = counting_factory();
        let config = PoolConfig::new(0, 1).with_acquire_timeout(Duration::from_millis(100));
        let pool = ResourcePool::new(factory, config).await.unwrap();

        let held = assert_ok!(pool.acquire_default().await);

        let started = std::time::Instant::now();
        let result = pool.acquire_default().await;
        assert!(matches!(result, Err(PoolError::Exhausted(t)) if t == Duration::from_millis(100)));
        assert!(started.elapsed() >= Duration::from_millis(90));

        pool.release(held).await;
    }

    #[tokio::test]
    async fn test_dropped_lease_frees_its_slot() {
        let (factory, _) = counting_factory();
        let pool = ResourcePool::new(factory, PoolConfig::new(0, 1)).await.unwrap();

        {
            let _lease = pool.acquire(Duration::from_millis(50)).await.unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.in_use_count, 0);
        assert_eq!(stats.total_destroyed, 1);

        let lease = assert_ok!(pool.acquire(Duration::from_millis(200)).await);
        pool.release(lease).await;
    }

    #[tokio::test]
    async fn test_dropped_lease_wakes_waiter() {
        let (factory, _) = counting_factory();
        let pool = Arc::new(ResourcePool::new(factory, PoolConfig::new(0, 1)).await.unwrap());
        let held = pool.acquire(Duration::from_millis(50)).await.unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire(Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(held);

        let lease = assert_ok!(waiter.await.unwrap());
        pool.release(lease).await;
    }

    /// Factory whose `create` sleeps, and which can be told to fail once
    /// `fail_after` resources exist. Counts teardowns.
    struct SlowFactory {
        delay: Duration,
        fail_after: Option<usize>,
        created: AtomicUsize,
        destroyed: Arc<AtomicUsize>,
    }

    impl SlowFactory {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                fail_after: None,
                created: AtomicUsize::new(0),
                destroyed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl ResourceFactory for SlowFactory {
        type Resource = usize;

        async fn create(&self) -> anyhow::Result<usize> {
            tokio::time::sleep(self.delay).await;
            let n = self.created.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                anyhow::bail!("backend refused connection {}", n);
            }
            Ok(n)
        }

        async fn destroy(&self, _resource: usize) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_cancelled_acquire_releases_reservation() {
        let factory = SlowFactory::new(Duration::from_millis(100));
        let pool = ResourcePool::new(factory, PoolConfig::new(0, 1)).await.unwrap();

        // Caller gives up while the factory is still running.
        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), pool.acquire(Duration::from_secs(1)))
                .await;
        assert!(abandoned.is_err());

        let stats = pool.stats();
        assert_eq!(stats.pending_count, 0);
        assert_eq!(stats.total_created, 0);

        let lease = assert_ok!(pool.acquire(Duration::from_millis(300)).await);
        pool.release(lease).await;
    }

    #[tokio::test]
    async fn test_failed_prebuild_destroys_built_resources() {
        let mut factory = SlowFactory::new(Duration::ZERO);
        factory.fail_after = Some(2);
        let destroyed = Arc::clone(&factory.destroyed);

        let result = ResourcePool::new(factory, PoolConfig::new(3, 4)).await;
        assert!(matches!(result, Err(PoolError::Creation(_))));
        assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    }
}
