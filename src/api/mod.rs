//! HTTP layer: the redirect pipeline plus a small admin surface.
//!
//! # Modules
//!
//! - [`dto`] - Response bodies of the admin and health endpoints
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Redirect pipeline, authentication and tracing
//! - [`routes`] - Admin route configuration

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
