//! Published rule index.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::{Captures, CompiledRule};
use crate::domain::entities::{RequestScheme, Rule, RuleKind};
use crate::domain::errors::RuleError;

/// A successful match: the rule and what its pattern captured.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub rule: Arc<CompiledRule>,
    pub captures: Captures,
}

impl RuleMatch {
    pub fn rule(&self) -> &Rule {
        self.rule.rule()
    }
}

/// Immutable lookup structure over compiled rules.
///
/// Built off to the side on publish and never modified afterwards, so
/// concurrent matches against one index need no synchronization.
#[derive(Debug, Default)]
pub struct RuleIndex {
    exact: HashMap<String, Vec<Arc<CompiledRule>>>,
    placeholder: Vec<Arc<CompiledRule>>,
    regex: Vec<Arc<CompiledRule>>,
    by_id: HashMap<i64, Arc<CompiledRule>>,
}

impl RuleIndex {
    /// Compiles and indexes rules.
    ///
    /// Disabled rules are left out. Rules that fail to compile are skipped,
    /// logged, and returned alongside the index; they never prevent the other
    /// rules from being indexed.
    pub fn build(rules: impl IntoIterator<Item = Rule>) -> (Self, Vec<RuleError>) {
        let mut index = Self::default();
        let mut skipped = Vec::new();

        for rule in rules.into_iter().filter(|r| r.enabled) {
            let compiled = match CompiledRule::compile(rule) {
                Ok(compiled) => Arc::new(compiled),
                Err(e) => {
                    warn!(rule_id = e.rule_id(), error = %e, "Skipping rule");
                    skipped.push(e);
                    continue;
                }
            };

            if index.by_id.contains_key(&compiled.id()) {
                let e = RuleError::Configuration {
                    id: compiled.id(),
                    reason: "duplicate rule id".to_string(),
                };
                warn!(rule_id = compiled.id(), error = %e, "Skipping rule");
                skipped.push(e);
                continue;
            }

            index.by_id.insert(compiled.id(), compiled.clone());
            let exact_key = compiled.exact_path().map(str::to_string);
            match (compiled.kind(), exact_key) {
                (RuleKind::Exact, Some(path)) => {
                    index.exact.entry(path).or_default().push(compiled);
                }
                (RuleKind::Placeholder, _) => index.placeholder.push(compiled),
                _ => index.regex.push(compiled),
            }
        }

        for candidates in index.exact.values_mut() {
            candidates.sort_by(|a, b| a.precedence(b));
        }
        index.placeholder.sort_by(|a, b| a.precedence(b));
        index.regex.sort_by(|a, b| a.precedence(b));

        (index, skipped)
    }

    /// Finds the best rule for a normalized path.
    ///
    /// Candidates must be enabled, inside their activity window at `now`,
    /// and accept `scheme`. Passes run exact, placeholder, then regex; the
    /// first hit in precedence order wins.
    pub fn find(&self, path: &str, scheme: RequestScheme, now: DateTime<Utc>) -> Option<RuleMatch> {
        let exact = self
            .exact
            .get(path)
            .into_iter()
            .flatten()
            .find(|rule| rule.is_candidate(scheme, now))
            .map(|rule| RuleMatch {
                rule: rule.clone(),
                captures: Captures::default(),
            });

        exact
            .or_else(|| Self::first_match(&self.placeholder, path, scheme, now))
            .or_else(|| Self::first_match(&self.regex, path, scheme, now))
    }

    /// Re-applies a single rule, as when resolving a cached match.
    ///
    /// Returns `None` if the rule is unknown, no longer a candidate, or its
    /// pattern does not match `path`.
    pub fn rematch(
        &self,
        rule_id: i64,
        path: &str,
        scheme: RequestScheme,
        now: DateTime<Utc>,
    ) -> Option<RuleMatch> {
        let rule = self.by_id.get(&rule_id)?;
        if !rule.is_candidate(scheme, now) {
            return None;
        }

        rule.captures(path).map(|captures| RuleMatch {
            rule: rule.clone(),
            captures,
        })
    }

    pub fn get(&self, rule_id: i64) -> Option<&Arc<CompiledRule>> {
        self.by_id.get(&rule_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn first_match(
        rules: &[Arc<CompiledRule>],
        path: &str,
        scheme: RequestScheme,
        now: DateTime<Utc>,
    ) -> Option<RuleMatch> {
        rules
            .iter()
            .filter(|rule| rule.is_candidate(scheme, now))
            .find_map(|rule| {
                rule.captures(path).map(|captures| RuleMatch {
                    rule: rule.clone(),
                    captures,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RuleRecord;
    use chrono::Duration;

    fn rule(id: i64, kind: &str, pattern: &str, target: &str) -> Rule {
        Rule::try_from(RuleRecord::new(id, kind, pattern, target)).unwrap()
    }

    fn find_id(index: &RuleIndex, path: &str) -> Option<i64> {
        index
            .find(path, RequestScheme::Https, Utc::now())
            .map(|m| m.rule().id)
    }

    #[test]
    fn test_exact_match_is_deterministic() {
        let (index, skipped) = RuleIndex::build(vec![
            rule(1, "exact", "/about", "/about-us"),
            rule(2, "exact", "/contact", "/contact-us"),
        ]);

        assert!(skipped.is_empty());
        for _ in 0..3 {
            assert_eq!(find_id(&index, "/about"), Some(1));
        }
        assert_eq!(find_id(&index, "/missing"), None);
    }

    #[test]
    fn test_pass_order_exact_then_placeholder_then_regex() {
        let (index, _) = RuleIndex::build(vec![
            rule(1, "regex", "^/blog/.*$", "/r"),
            rule(2, "placeholder", "/blog/{slug}", "/p/{slug}"),
            rule(3, "exact", "/blog/pinned", "/e"),
        ]);

        assert_eq!(find_id(&index, "/blog/pinned"), Some(3));
        assert_eq!(find_id(&index, "/blog/other"), Some(2));
        assert_eq!(find_id(&index, "/blog/a/b"), Some(1));
    }

    #[test]
    fn test_equal_specificity_lowest_id_wins() {
        let (index, _) = RuleIndex::build(vec![
            rule(20, "placeholder", "/blog/{post}", "/b"),
            rule(10, "placeholder", "/blog/{slug}", "/a"),
            rule(7, "exact", "/same", "/x"),
            rule(5, "exact", "/same/", "/y"),
        ]);

        assert_eq!(find_id(&index, "/blog/x"), Some(10));
        assert_eq!(find_id(&index, "/same"), Some(5));
    }

    #[test]
    fn test_more_specific_placeholder_wins_over_lower_id() {
        let (index, _) = RuleIndex::build(vec![
            rule(1, "placeholder", "/{section}/{slug}", "/a"),
            rule(2, "placeholder", "/blog/{slug}", "/b"),
        ]);

        assert_eq!(find_id(&index, "/blog/x"), Some(2));
        assert_eq!(find_id(&index, "/news/x"), Some(1));
    }

    #[test]
    fn test_scheme_constraint_filters_candidates() {
        let mut http_only = rule(1, "exact", "/a", "/http");
        http_only.scheme = crate::domain::entities::SchemeConstraint::Http;
        let (index, _) = RuleIndex::build(vec![http_only, rule(2, "exact", "/a", "/any")]);

        let now = Utc::now();
        assert_eq!(
            index.find("/a", RequestScheme::Http, now).map(|m| m.rule().id),
            Some(1)
        );
        assert_eq!(
            index.find("/a", RequestScheme::Https, now).map(|m| m.rule().id),
            Some(2)
        );
    }

    #[test]
    fn test_disabled_and_out_of_window_rules_never_match() {
        let now = Utc::now();
        let mut disabled = rule(1, "exact", "/a", "/x");
        disabled.enabled = false;
        let mut future = rule(2, "exact", "/a", "/y");
        future.from_date = Some(now + Duration::hours(1));
        let mut expired = rule(3, "placeholder", "/{p}", "/z");
        expired.to_date = Some(now - Duration::hours(1));

        let (index, _) = RuleIndex::build(vec![disabled, future, expired]);

        assert!(index.find("/a", RequestScheme::Http, now).is_none());
        assert!(index.rematch(2, "/a", RequestScheme::Http, now).is_none());
        assert!(index.get(1).is_none());
    }

    #[test]
    fn test_bad_rules_skipped_others_indexed() {
        let (index, skipped) = RuleIndex::build(vec![
            rule(1, "regex", "^/old/(", "/x"),
            rule(2, "regex", r"^/old/(\d+)$", "/new/$1"),
            rule(2, "exact", "/dup", "/dup"),
        ]);

        assert_eq!(index.len(), 1);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].rule_id(), 1);
        assert_eq!(find_id(&index, "/old/42"), Some(2));
    }

    #[test]
    fn test_rematch_recomputes_captures() {
        let (index, _) = RuleIndex::build(vec![rule(4, "placeholder", "/blog/{slug}", "/a/{slug}")]);

        let m = index
            .rematch(4, "/blog/hi", RequestScheme::Http, Utc::now())
            .unwrap();

        assert_eq!(m.captures.named("slug"), Some("hi"));
        assert!(index.rematch(4, "/news/hi", RequestScheme::Http, Utc::now()).is_none());
    }
}
