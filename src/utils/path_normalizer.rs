//! Request path normalization.
//!
//! Produces the canonical form used both for matching and as a cache key, so
//! every caller that builds a signature must go through [`normalize_path`].

/// Normalizes a request path.
///
/// # Normalization Rules
///
/// 1. **Base path**: Stripped when the path starts with it on a segment boundary
/// 2. **Leading slash**: Always present
/// 3. **Duplicate slashes**: Collapsed (`//a///b` → `/a/b`)
/// 4. **Trailing slash**: Removed, except for the root path
/// 5. **Query / fragment**: Anything after `?` or `#` is dropped
/// 6. **Case and percent-encoding**: Preserved
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_path("/blog/", ""), "/blog");
/// assert_eq!(normalize_path("/app/blog", "/app"), "/blog");
/// assert_eq!(normalize_path("", ""), "/");
/// ```
pub fn normalize_path(raw: &str, base_path: &str) -> String {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    let path = strip_base_path(path, base_path);

    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }

    normalized
}

/// Normalizes a configured base path to `/segment` form, or empty for none.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn strip_base_path<'a>(path: &'a str, base_path: &str) -> &'a str {
    if base_path.is_empty() {
        return path;
    }

    match path.strip_prefix(base_path) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}
