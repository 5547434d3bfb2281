//! Utility functions shared across layers.
//!
//! - [`path_normalizer`] - Request path normalization

pub mod path_normalizer;
