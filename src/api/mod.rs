//! API Module
//!
//! Admin HTTP surface over the named cache instances.
//!
//! # Endpoints
//! - `GET /cache/:instance/:key` - Read a value
//! - `PUT /cache/:instance/:key` - Store a value
//! - `DELETE /cache/:instance/:key` - Delete a key
//! - `GET /cache/:instance/:key/ttl` - Remaining TTL
//! - `DELETE /cache/:instance` - Clear the instance namespace
//! - `GET /stats` - Per-instance statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
