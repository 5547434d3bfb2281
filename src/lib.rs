//! # Redirect Engine
//!
//! Rule-based HTTP redirect middleware for Axum with a cached matching engine.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Rules, matcher, conditions, response construction
//! - **Application Layer** ([`application`]) - Publishing and cached resolution
//! - **Infrastructure Layer** ([`infrastructure`]) - Rule stores and cache backends
//! - **API Layer** ([`api`]) - Redirect middleware, health and publish endpoints
//!
//! ## Request flow
//!
//! ```text
//! request → normalize → cache | matcher → match event → conditions → redirect
//!                                                                   ↘ pass-through
//! ```
//!
//! ## Rule kinds
//!
//! - `exact` - `/old-page`
//! - `placeholder` - `/blog/{slug}`, `/docs/{*rest}`
//! - `regex` - `^/old/(\d+)$` with `$1` in the target
//!
//! Within a kind, the more specific pattern wins and ties go to the lower id.
//!
//! ## Quick Start
//!
//! ```bash
//! export RULES_FILE="rules.json"   # or DATABASE_URL
//! export ADMIN_TOKEN="change-me"
//! cargo run
//!
//! # after editing rules
//! curl -X POST -H "Authorization: Bearer change-me" localhost:3000/_redirect/publish
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{PublishReport, RedirectService, Resolution, ResolveMode};
    pub use crate::domain::conditions::{ConditionRegistry, RedirectCondition};
    pub use crate::domain::entities::{RequestScheme, Rule, RuleRecord};
    pub use crate::domain::location::RedirectOptions;
    pub use crate::domain::match_event::MatchEventBus;
    pub use crate::error::AppError;
    pub use crate::state::{AppState, PipelineSettings};
}
