//! Redirect rule entity and its persisted representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::RuleError;

/// Status codes a rule may emit.
pub const ALLOWED_STATUS_CODES: [u16; 6] = [301, 302, 303, 307, 308, 410];

/// How a rule's `pattern` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Literal path equality after normalization.
    Exact,
    /// Path with `{token}` and `{*rest}` segments.
    Placeholder,
    /// Regular expression over the full normalized path.
    #[serde(rename = "regex")]
    RegularExpression,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Placeholder => "placeholder",
            Self::RegularExpression => "regex",
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "placeholder" | "placeholders" => Ok(Self::Placeholder),
            "regex" | "regular_expression" => Ok(Self::RegularExpression),
            other => Err(format!("unknown rule kind '{}'", other)),
        }
    }
}

/// Scheme of an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestScheme {
    Http,
    Https,
}

impl RequestScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for RequestScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unsupported scheme '{}'", other)),
        }
    }
}

/// Request schemes a rule accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeConstraint {
    Any,
    Http,
    Https,
}

impl SchemeConstraint {
    pub fn allows(&self, scheme: RequestScheme) -> bool {
        match self {
            Self::Any => true,
            Self::Http => scheme == RequestScheme::Http,
            Self::Https => scheme == RequestScheme::Https,
        }
    }
}

impl FromStr for SchemeConstraint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "auto" => Ok(Self::Any),
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unknown scheme constraint '{}'", other)),
        }
    }
}

/// A rule as stored in the rule store, before validation.
///
/// Kind, scheme and status are kept loose here so a single bad row can be
/// reported and skipped at publish time instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RuleRecord {
    pub id: i64,
    pub kind: String,
    pub pattern: String,
    pub target: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_status_code")]
    pub status_code: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
}

fn default_scheme() -> String {
    "any".to_string()
}

fn default_status_code() -> i32 {
    301
}

fn default_enabled() -> bool {
    true
}

impl RuleRecord {
    /// Creates an enabled, scheme-agnostic 301 record.
    pub fn new(id: i64, kind: &str, pattern: &str, target: &str) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            pattern: pattern.to_string(),
            target: target.to_string(),
            scheme: default_scheme(),
            status_code: default_status_code(),
            enabled: true,
            from_date: None,
            to_date: None,
        }
    }
}

/// A validated redirect rule.
///
/// Rules are read-only once published; the engine never modifies them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: i64,
    pub kind: RuleKind,
    pub pattern: String,
    pub target: String,
    pub scheme: SchemeConstraint,
    pub status_code: u16,
    pub enabled: bool,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl Rule {
    /// Returns true if the rule's activity window contains `now`.
    ///
    /// The window start is inclusive and the end exclusive; an unset bound
    /// is open.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        self.from_date.is_none_or(|from| from <= now) && self.to_date.is_none_or(|to| now < to)
    }

    /// Returns true if the rule is enabled and inside its window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.in_window(now)
    }

    /// Returns the next window boundary strictly after `now`, if any.
    pub fn next_transition_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        [self.from_date, self.to_date]
            .into_iter()
            .flatten()
            .filter(|bound| *bound > now)
            .min()
    }
}

impl TryFrom<RuleRecord> for Rule {
    type Error = RuleError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        let configuration = |reason: String| RuleError::Configuration { id, reason };

        let kind = record.kind.parse::<RuleKind>().map_err(configuration)?;
        let scheme = record
            .scheme
            .parse::<SchemeConstraint>()
            .map_err(configuration)?;

        let status_code = u16::try_from(record.status_code)
            .ok()
            .filter(|code| ALLOWED_STATUS_CODES.contains(code))
            .ok_or_else(|| configuration(format!("unsupported status code {}", record.status_code)))?;

        if let (Some(from), Some(to)) = (record.from_date, record.to_date)
            && from >= to
        {
            return Err(configuration(format!(
                "empty activity window ({} >= {})",
                from, to
            )));
        }

        Ok(Self {
            id,
            kind,
            pattern: record.pattern,
            target: record.target,
            scheme,
            status_code,
            enabled: record.enabled,
            from_date: record.from_date,
            to_date: record.to_date,
        })
    }
}
