//! Validation of revalidation targets.
//!
//! Paths must look like `/segment/segment?query` using a narrow character
//! set and may never contain `..`. Tags are identifier-like.

use thiserror::Error;

/// Rejected revalidation input. Messages are safe to return to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Path cannot be empty")]
    EmptyPath,
    #[error("Path cannot traverse directories")]
    PathTraversal,
    #[error("Path contains invalid characters")]
    InvalidPath,
    #[error("Tag cannot be empty")]
    EmptyTag,
    #[error("Tag contains invalid characters")]
    InvalidTag,
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-')
}

fn is_query_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '=' | '&' | '%' | '-')
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-')
}

/// Trim, prefix with `/` when missing, then validate.
pub fn sanitize_path(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    let normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    if normalized.contains("..") {
        return Err(ValidationError::PathTraversal);
    }

    let (path, query) = match normalized.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (normalized.as_str(), None),
    };
    let path_ok = path.chars().all(is_path_char);
    let query_ok = query.map_or(true, |q| q.chars().all(is_query_char));
    if !(path_ok && query_ok) {
        return Err(ValidationError::InvalidPath);
    }
    Ok(normalized)
}

/// Trim, then require a non-empty run of `[A-Za-z0-9:_-]`.
pub fn sanitize_tag(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTag);
    }
    if !trimmed.chars().all(is_tag_char) {
        return Err(ValidationError::InvalidTag);
    }
    Ok(trimmed.to_string())
}
