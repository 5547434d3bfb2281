//! Core domain entities.
//!
//! - [`Rule`] - A validated redirect rule
//! - [`RuleRecord`] - The rule as persisted, validated into a [`Rule`] at publish time

pub mod rule;

pub use rule::{
    ALLOWED_STATUS_CODES, RequestScheme, Rule, RuleKind, RuleRecord, SchemeConstraint,
};
