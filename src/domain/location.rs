//! Redirect response construction.

use tracing::warn;
use url::Url;

use crate::domain::matcher::{Captures, RuleMatch};

/// Status for which no `Location` header is emitted.
pub const GONE: u16 = 410;

/// Executor behavior flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedirectOptions {
    /// Append the original query string to the target. Off by default so
    /// unrelated parameters do not leak to the destination.
    pub preserve_query_string: bool,
}

/// Status and location for a redirect; emitting it is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectResponse {
    pub status_code: u16,
    /// `None` for `410 Gone`.
    pub location: Option<String>,
}

/// Builds the response for a match.
///
/// Every `{name}` and `$n` reference in the rule target is replaced by its
/// captured value. References with no value are rendered as
/// `{unresolved:NAME}` so a misconfigured rule is visible in the Location
/// header rather than silently producing a wrong URL.
pub fn build_response(
    rule_match: &RuleMatch,
    query: Option<&str>,
    options: RedirectOptions,
) -> RedirectResponse {
    let rule = rule_match.rule();

    if rule.status_code == GONE {
        return RedirectResponse {
            status_code: rule.status_code,
            location: None,
        };
    }

    let (mut location, unresolved) = interpolate(&rule.target, &rule_match.captures);
    if !unresolved.is_empty() {
        warn!(
            rule_id = rule.id,
            target = %rule.target,
            unresolved = ?unresolved,
            "Unresolved references in redirect target"
        );
    }

    if options.preserve_query_string
        && let Some(query) = query.filter(|q| !q.is_empty())
    {
        location = append_query(&location, query);
    }

    RedirectResponse {
        status_code: rule.status_code,
        location: Some(location),
    }
}

/// Substitutes capture references in a template.
///
/// Returns the rendered string and the names of references that had no value.
/// `$$` renders a literal `$`.
pub fn interpolate(template: &str, captures: &Captures) -> (String, Vec<String>) {
    let mut output = String::with_capacity(template.len());
    let mut unresolved = Vec::new();
    let mut rest = template;

    while let Some(position) = rest.find(['{', '$']) {
        output.push_str(&rest[..position]);
        let tail = &rest[position..];

        if let Some(after) = tail.strip_prefix("$$") {
            output.push('$');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('$') {
            let digits = after.chars().take_while(char::is_ascii_digit).count();
            if digits == 0 {
                output.push('$');
                rest = after;
                continue;
            }
            let reference = &after[..digits];
            match reference.parse::<usize>().ok().and_then(|i| captures.positional(i)) {
                Some(value) => output.push_str(value),
                None => {
                    output.push_str(&format!("{{unresolved:${}}}", reference));
                    unresolved.push(format!("${}", reference));
                }
            }
            rest = &after[digits..];
        } else {
            match parse_brace_reference(tail) {
                Some((name, consumed)) => {
                    match captures.named(name) {
                        Some(value) => output.push_str(value),
                        None => {
                            output.push_str(&format!("{{unresolved:{}}}", name));
                            unresolved.push(name.to_string());
                        }
                    }
                    rest = &tail[consumed..];
                }
                None => {
                    output.push('{');
                    rest = &tail[1..];
                }
            }
        }
    }

    output.push_str(rest);
    (output, unresolved)
}

/// Parses `{name}` or `{*name}` at the start of `s`.
fn parse_brace_reference(s: &str) -> Option<(&str, usize)> {
    let close = s.find('}')?;
    let inner = &s[1..close];
    let name = inner.strip_prefix('*').unwrap_or(inner);

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    valid.then_some((name, close + 1))
}

fn append_query(location: &str, query: &str) -> String {
    if let Ok(mut url) = Url::parse(location) {
        let merged = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query),
            _ => query.to_string(),
        };
        url.set_query(Some(&merged));
        return url.to_string();
    }

    let (base, fragment) = match location.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (location, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };

    let mut result = format!("{}{}{}", base, separator, query);
    if let Some(fragment) = fragment {
        result.push('#');
        result.push_str(fragment);
    }
    result
}
