//! Placeholder pattern parsing and matching.

use super::Captures;
use crate::utils::path_normalizer::normalize_path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{name}`: exactly one non-empty path segment.
    Token(String),
    /// `{*name}`: the remainder of the path, possibly empty.
    Rest(String),
}

/// A parsed `{token}`-bearing path pattern such as `/blog/{year}/{slug}` or
/// `/docs/{*page}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderPattern {
    segments: Vec<Segment>,
}

impl PlaceholderPattern {
    /// Parses a pattern.
    ///
    /// # Errors
    ///
    /// Returns a reason string when:
    /// - A segment mixes literal text and braces (`/file-{id}`)
    /// - A token name is empty or contains characters other than `[A-Za-z0-9_-]`
    /// - A token name is used twice
    /// - A rest token is not the last segment
    pub fn parse(pattern: &str) -> Result<Self, String> {
        let normalized = normalize_path(pattern, "");
        let raw_segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw_segments.len());

        for (position, raw) in raw_segments.iter().enumerate() {
            let segment = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(inner) => match inner.strip_prefix('*') {
                    Some(name) => {
                        if position + 1 != raw_segments.len() {
                            return Err(format!("rest token '{{*{}}}' must be the last segment", name));
                        }
                        Segment::Rest(validate_token_name(name)?)
                    }
                    None => Segment::Token(validate_token_name(inner)?),
                },
                None if raw.contains(['{', '}']) => {
                    return Err(format!("segment '{}' mixes literal text and a token", raw));
                }
                None => Segment::Literal((*raw).to_string()),
            };

            if let Some(name) = token_name(&segment)
                && segments.iter().any(|s| token_name(s) == Some(name))
            {
                return Err(format!("token '{}' is used more than once", name));
            }

            segments.push(segment);
        }

        Ok(Self { segments })
    }

    /// Matches a normalized path, returning the captured token values.
    pub fn captures(&self, path: &str) -> Option<Captures> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut captures = Captures::default();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if parts.get(index) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Token(name) => {
                    let value = parts.get(index)?;
                    captures.insert_named(name, value);
                }
                Segment::Rest(name) => {
                    let rest = parts.get(index..).unwrap_or_default().join("/");
                    captures.insert_named(name, &rest);
                    return Some(captures);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(captures)
    }

    /// Token names in pattern order, rest token included.
    pub fn token_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(token_name)
    }

    pub fn literal_segments(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Length of the literal path before the first token, slashes included.
    pub fn literal_prefix_len(&self) -> usize {
        self.segments
            .iter()
            .map_while(|s| match s {
                Segment::Literal(literal) => Some(literal.len() + 1),
                _ => None,
            })
            .sum()
    }
}

fn token_name(segment: &Segment) -> Option<&str> {
    match segment {
        Segment::Token(name) | Segment::Rest(name) => Some(name),
        Segment::Literal(_) => None,
    }
}

fn validate_token_name(name: &str) -> Result<String, String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(name.to_string())
    } else {
        Err(format!("invalid token name '{}'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token() {
        let pattern = PlaceholderPattern::parse("/blog/{slug}").unwrap();

        let captures = pattern.captures("/blog/hello-world").unwrap();

        assert_eq!(captures.named("slug"), Some("hello-world"));
        assert!(pattern.captures("/blog").is_none());
        assert!(pattern.captures("/blog/a/b").is_none());
        assert!(pattern.captures("/news/a").is_none());
    }

    #[test]
    fn test_rest_token() {
        let pattern = PlaceholderPattern::parse("/docs/{*page}").unwrap();

        let captures = pattern.captures("/docs/guide/install").unwrap();
        assert_eq!(captures.named("page"), Some("guide/install"));

        let captures = pattern.captures("/docs").unwrap();
        assert_eq!(captures.named("page"), Some(""));
    }

    #[test]
    fn test_rest_must_be_last() {
        assert!(PlaceholderPattern::parse("/{*all}/tail").is_err());
    }

    #[test]
    fn test_mixed_segment_rejected() {
        assert!(PlaceholderPattern::parse("/file-{id}.html").is_err());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        assert!(PlaceholderPattern::parse("/{id}/{id}").is_err());
    }

    #[test]
    fn test_invalid_token_name() {
        assert!(PlaceholderPattern::parse("/{}").is_err());
        assert!(PlaceholderPattern::parse("/{a b}").is_err());
    }

    #[test]
    fn test_specificity_parts() {
        let pattern = PlaceholderPattern::parse("/shop/items/{id}/{*rest}").unwrap();

        assert_eq!(pattern.literal_segments(), 2);
        assert_eq!(pattern.literal_prefix_len(), "/shop/items".len());
        assert_eq!(pattern.token_names().collect::<Vec<_>>(), vec!["id", "rest"]);
    }
}
