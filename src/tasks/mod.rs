//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the process lifetime.
//!
//! # Tasks
//! - Expiry sweep: removes expired entries from the in-memory store

mod cleanup;

pub use cleanup::spawn_cleanup_task;
