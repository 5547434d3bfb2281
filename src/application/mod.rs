//! Application layer orchestrating the domain.
//!
//! - [`services::RedirectService`] - Publishing, cached resolution, condition gate and
//!   response construction
//! - [`services::RuleSnapshot`] - The immutable unit swapped in on publish

pub mod services;
