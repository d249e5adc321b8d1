//! Pool Module
//!
//! Generic resource pool with min/max bounds, idle reaping and a
//! caller-supplied health predicate.

mod factory;
mod manager;
mod resource;

pub use factory::{FnFactory, ResourceFactory};
pub use manager::ResourcePool;
pub(crate) use resource::IdleResource;
pub use resource::{Lease, PoolStats, ResourceId, ResourceMeta};
