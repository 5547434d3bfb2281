//! Pluggable conditions that can veto a matched redirect.
//!
//! Conditions are registered by identifier in a [`ConditionRegistry`] and
//! resolved once per publish into a [`ConditionGate`], so requests never look
//! anything up by name.
//!
//! # Built-in Conditions
//!
//! - `no-self-redirect` - vetoes a relative, literal target equal to the request path
//! - `skip-static-assets` - vetoes pattern rules on static asset paths

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

use crate::domain::entities::{Rule, RuleKind};
use crate::domain::errors::ConditionError;
use crate::domain::signature::RequestSignature;
use crate::utils::path_normalizer::normalize_path;

/// A predicate evaluated against a tentative match.
///
/// Implementations may only inspect their arguments; they must not touch the
/// cache or the rule set. Returning `Err` vetoes the redirect.
pub trait RedirectCondition: Send + Sync {
    /// Identifier used in configuration.
    fn name(&self) -> &'static str;

    /// Returns `Ok(true)` if the redirect may proceed.
    fn passes(&self, rule: &Rule, signature: &RequestSignature) -> Result<bool, ConditionError>;
}

/// Ordered, resolved conditions for one published rule set.
#[derive(Clone, Default)]
pub struct ConditionGate {
    conditions: Vec<Arc<dyn RedirectCondition>>,
}

impl ConditionGate {
    pub fn new(conditions: Vec<Arc<dyn RedirectCondition>>) -> Self {
        Self { conditions }
    }

    /// Runs conditions in order, stopping at the first veto.
    pub fn evaluate(&self, rule: &Rule, signature: &RequestSignature) -> bool {
        self.first_veto(rule, signature).is_none()
    }

    /// Returns the name of the condition that vetoed, if any.
    ///
    /// A condition that errors counts as a veto; the error is logged.
    pub fn first_veto(&self, rule: &Rule, signature: &RequestSignature) -> Option<&'static str> {
        self.conditions.iter().find_map(|condition| {
            match condition.passes(rule, signature) {
                Ok(true) => None,
                Ok(false) => {
                    debug!(
                        rule_id = rule.id,
                        condition = condition.name(),
                        path = %signature.path,
                        "Redirect vetoed by condition"
                    );
                    Some(condition.name())
                }
                Err(e) => {
                    error!(
                        rule_id = rule.id,
                        path = %signature.path,
                        error = %e,
                        "Condition failed, redirect vetoed"
                    );
                    Some(condition.name())
                }
            }
        })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.conditions.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Conditions available by identifier.
#[derive(Clone, Default)]
pub struct ConditionRegistry {
    conditions: HashMap<&'static str, Arc<dyn RedirectCondition>>,
}

impl ConditionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in conditions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NoSelfRedirect));
        registry.register(Arc::new(SkipStaticAssets));
        registry
    }

    /// Registers a condition, replacing any previous one with the same name.
    pub fn register(&mut self, condition: Arc<dyn RedirectCondition>) {
        self.conditions.insert(condition.name(), condition);
    }

    /// Resolves identifiers, in order, into a gate.
    ///
    /// Unknown identifiers are logged and skipped.
    pub fn resolve(&self, names: &[String]) -> ConditionGate {
        let conditions = names
            .iter()
            .filter_map(|name| match self.conditions.get(name.as_str()) {
                Some(condition) => Some(condition.clone()),
                None => {
                    warn!(condition = %name, "Unknown redirect condition, skipped");
                    None
                }
            })
            .collect();

        ConditionGate::new(conditions)
    }
}

/// Vetoes a redirect whose relative, literal target is the request path itself.
pub struct NoSelfRedirect;

impl RedirectCondition for NoSelfRedirect {
    fn name(&self) -> &'static str {
        "no-self-redirect"
    }

    fn passes(&self, rule: &Rule, signature: &RequestSignature) -> Result<bool, ConditionError> {
        let target = rule.target.as_str();
        if target.contains(['{', '$']) || Url::parse(target).is_ok() {
            return Ok(true);
        }

        Ok(normalize_path(target, "") != signature.path)
    }
}

/// Vetoes placeholder and regex redirects for static asset paths.
///
/// Exact rules always pass: an exact rule for an asset is deliberate.
pub struct SkipStaticAssets;

const STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2", "ttf",
];

impl RedirectCondition for SkipStaticAssets {
    fn name(&self) -> &'static str {
        "skip-static-assets"
    }

    fn passes(&self, rule: &Rule, signature: &RequestSignature) -> Result<bool, ConditionError> {
        if rule.kind == RuleKind::Exact {
            return Ok(true);
        }

        let is_asset = signature
            .path
            .rsplit('/')
            .next()
            .and_then(|segment| segment.rsplit_once('.'))
            .is_some_and(|(_, ext)| STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        Ok(!is_asset)
    }
}
