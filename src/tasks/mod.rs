//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired bounded-cache entries at configured intervals
//! - Access Count Worker: best-effort `access_count` updates for distributed
//!   cache hits

mod access;
mod cleanup;

pub(crate) use access::{spawn_access_worker, AccessTracker};
pub use cleanup::spawn_cleanup_task;
