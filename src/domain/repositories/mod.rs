//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.

pub mod rule_repository;

pub use rule_repository::RuleRepository;

#[cfg(test)]
pub use rule_repository::MockRuleRepository;
