//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for rule storage and caching.
//!
//! # Modules
//!
//! - [`cache`] - Match cache (in-memory, Redis and no-op implementations)
//! - [`persistence`] - Rule store implementations

pub mod cache;
pub mod persistence;
