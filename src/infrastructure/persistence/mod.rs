//! Rule store implementations.
//!
//! - [`PgRuleRepository`] - PostgreSQL via SQLx
//! - [`JsonRuleRepository`] - JSON file, for deployments without a database

pub mod json_rule_repository;
pub mod pg_rule_repository;

pub use json_rule_repository::JsonRuleRepository;
pub use pg_rule_repository::PgRuleRepository;
