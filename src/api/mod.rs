//! API Module
//!
//! HTTP handlers and routing for the recipe cache REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Cache statistics
//! - `POST /cache/invalidate` - Drop cached entries
//! - `POST /recipes/generate` - Generate or reuse a recipe

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
