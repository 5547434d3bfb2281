//! Rules compiled into their matching form.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use tracing::debug;

use super::Captures;
use super::pattern::PlaceholderPattern;
use crate::domain::entities::{RequestScheme, Rule, RuleKind};
use crate::domain::errors::RuleError;
use crate::utils::path_normalizer::normalize_path;

/// Tie-break rank within one kind: more literal segments first, then the
/// longer literal prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    pub literal_segments: usize,
    pub literal_prefix_len: usize,
}

#[derive(Debug)]
enum PathMatcher {
    Exact(String),
    Placeholder(PlaceholderPattern),
    Regex(Regex),
}

/// A validated rule paired with its compiled pattern.
#[derive(Debug)]
pub struct CompiledRule {
    rule: Rule,
    matcher: PathMatcher,
    specificity: Specificity,
}

impl CompiledRule {
    /// Compiles a rule's pattern according to its kind.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Match`] when a regex does not compile or a
    /// placeholder pattern is malformed.
    pub fn compile(rule: Rule) -> Result<Self, RuleError> {
        let id = rule.id;
        let invalid = |reason: String| RuleError::Match { id, reason };

        let (matcher, specificity) = match rule.kind {
            RuleKind::Exact => {
                let path = normalize_path(&rule.pattern, "");
                let specificity = Specificity {
                    literal_segments: path.split('/').filter(|s| !s.is_empty()).count(),
                    literal_prefix_len: path.len(),
                };
                (PathMatcher::Exact(path), specificity)
            }
            RuleKind::Placeholder => {
                let pattern = PlaceholderPattern::parse(&rule.pattern).map_err(invalid)?;
                for token in pattern.token_names() {
                    if !rule.target.contains(&format!("{{{}}}", token)) {
                        debug!(rule_id = rule.id, token, "Placeholder not used by target, discarded");
                    }
                }
                let specificity = Specificity {
                    literal_segments: pattern.literal_segments(),
                    literal_prefix_len: pattern.literal_prefix_len(),
                };
                (PathMatcher::Placeholder(pattern), specificity)
            }
            RuleKind::RegularExpression => {
                let regex = Regex::new(&rule.pattern).map_err(|e| invalid(e.to_string()))?;
                let specificity = Specificity {
                    literal_segments: 0,
                    literal_prefix_len: regex_literal_prefix_len(&rule.pattern),
                };
                (PathMatcher::Regex(regex), specificity)
            }
        };

        Ok(Self {
            rule,
            matcher,
            specificity,
        })
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn id(&self) -> i64 {
        self.rule.id
    }

    pub fn kind(&self) -> RuleKind {
        self.rule.kind
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Key for exact lookups; `None` for pattern kinds.
    pub fn exact_path(&self) -> Option<&str> {
        match &self.matcher {
            PathMatcher::Exact(path) => Some(path),
            _ => None,
        }
    }

    /// Returns true if the rule may match a request with this scheme at `now`.
    pub fn is_candidate(&self, scheme: RequestScheme, now: DateTime<Utc>) -> bool {
        self.rule.is_active_at(now) && self.rule.scheme.allows(scheme)
    }

    /// Matches a normalized path against the pattern alone.
    pub fn captures(&self, path: &str) -> Option<Captures> {
        match &self.matcher {
            PathMatcher::Exact(expected) => (expected == path).then(Captures::default),
            PathMatcher::Placeholder(pattern) => pattern.captures(path),
            PathMatcher::Regex(regex) => {
                let caps = regex.captures(path)?;
                let mut captures = Captures::default();
                for (index, group) in caps.iter().enumerate() {
                    captures.insert_positional(index, group.map(|m| m.as_str()));
                }
                for name in regex.capture_names().flatten() {
                    if let Some(value) = caps.name(name) {
                        captures.insert_named(name, value.as_str());
                    }
                }
                Some(captures)
            }
        }
    }

    /// Orders rules within one pass: highest specificity first, then lowest id.
    pub fn precedence(&self, other: &Self) -> Ordering {
        other
            .specificity
            .cmp(&self.specificity)
            .then_with(|| self.rule.id.cmp(&other.rule.id))
    }
}

/// Counts the literal characters a regex source starts with, after `^`.
///
/// A character made optional by a following `?`, `*` or `{` does not count.
fn regex_literal_prefix_len(source: &str) -> usize {
    const META: &[char] = &[
        '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
    ];

    let body = source.strip_prefix('^').unwrap_or(source);
    let len = body.chars().take_while(|c| !META.contains(c)).count();

    match body.chars().nth(len) {
        Some('?' | '*' | '{') => len.saturating_sub(1),
        _ => len,
    }
}
