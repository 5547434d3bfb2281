//! Business logic services for the application layer.

pub mod redirect_service;
pub mod rule_snapshot;

pub use redirect_service::{PublishReport, RedirectService, Resolution, ResolveMode};
pub use rule_snapshot::RuleSnapshot;
