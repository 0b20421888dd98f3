//! API Module
//!
//! HTTP handlers and routing for the session diagnostics API.
//!
//! # Endpoints
//! - `GET /health`, `GET /stats`
//! - `PUT /cache`, `DELETE /cache`, `GET|DELETE /cache/:key`
//! - `GET|DELETE /instance`, `DELETE /instance/:key`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
