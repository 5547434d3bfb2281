//! Domain layer: rules, matching, conditions and redirect construction.
//!
//! # Architecture
//!
//! - [`entities`] - Rule data model
//! - [`signature`] - Normalized request signature
//! - [`matcher`] - Compiled rule index and the three-pass matching algorithm
//! - [`conditions`] - Pluggable vetoes evaluated after a match
//! - [`location`] - Target interpolation and response construction
//! - [`match_event`] / [`match_worker`] - Match notifications and the audit worker
//! - [`repositories`] - Rule store interface
//!
//! Everything here is synchronous and free of I/O except the repository
//! traits and the audit worker.

pub mod conditions;
pub mod entities;
pub mod errors;
pub mod location;
pub mod match_event;
pub mod match_worker;
pub mod matcher;
pub mod repositories;
pub mod signature;
