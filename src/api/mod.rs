//! API Module
//!
//! HTTP handlers and routing for the host process.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /stats` - Current cache statistics
//! - `POST /optimize` - Run an optimization cycle now
//! - `GET /history` - Monitoring history and summary
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
