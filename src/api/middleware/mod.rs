//! HTTP middleware for request processing and protection.
//!
//! - [`redirect`] - The redirect pipeline
//! - [`auth`] - Bearer token guard for admin endpoints
//! - [`tracing`] - Request/response logging

pub mod auth;
pub mod redirect;
pub mod tracing;
