//! Resource Factory Module
//!
//! The seam through which the embedding application builds, checks and
//! tears down pooled resources.

use async_trait::async_trait;

// == Resource Factory ==
/// Builds resources for a [`ResourcePool`](crate::pool::ResourcePool).
#[async_trait]
pub trait ResourceFactory: Send + Sync + 'static {
    type Resource: Send + 'static;

    /// Constructs a new resource. Errors propagate out of `acquire`.
    async fn create(&self) -> anyhow::Result<Self::Resource>;

    /// Health predicate consulted on release and while pruning idle
    /// resources. Defaults to always healthy.
    fn is_healthy(&self, _resource: &Self::Resource) -> bool {
        true
    }

    /// Best-effort cleanup for a resource leaving the pool.
    async fn destroy(&self, resource: Self::Resource) {
        drop(resource);
    }
}

type CreateFn<R> = Box<dyn Fn() -> anyhow::Result<R> + Send + Sync>;
type HealthFn<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

// == Fn Factory ==
/// Adapts plain closures into a [`ResourceFactory`].
///
/// # Example
/// ```
/// use cachepool::pool::FnFactory;
///
/// let factory = FnFactory::new(|| Ok(String::from("conn")))
///     .with_health_check(|conn: &String| !conn.is_empty());
/// # let _ = factory;
/// ```
pub struct FnFactory<R> {
    create: CreateFn<R>,
    health: Option<HealthFn<R>>,
}

impl<R> FnFactory<R>
where
    R: Send + 'static,
{
    pub fn new<F>(create: F) -> Self
    where
        F: Fn() -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self {
            create: Box::new(create),
            health: None,
        }
    }

    pub fn with_health_check<H>(mut self, health: H) -> Self
    where
        H: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.health = Some(Box::new(health));
        self
    }
}

#[async_trait]
impl<R> ResourceFactory for FnFactory<R>
where
    R: Send + 'static,
{
    type Resource = R;

    async fn create(&self) -> anyhow::Result<R> {
        (self.create)()
    }

    fn is_healthy(&self, resource: &R) -> bool {
        self.health.as_ref().map_or(true, |check| check(resource))
    }
}
