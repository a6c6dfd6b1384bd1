//! Resource path template matching.
//!
//! # Responsibilities
//! - Match a request path against a registered resource template
//! - Treat `{...}` segments as single-segment wildcards
//!
//! # Design Decisions
//! - Exact string equality short-circuits
//! - Segment counts must be equal; no cross-segment wildcards
//! - The leading segment (empty for absolute paths) is never compared
//! - Literal segments are case-sensitive

const SEPARATOR: char = '/';
const WILDCARD_START: char = '{';

/// A parsed resource template, e.g. `/users/{id}/orders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard,
}

impl PathTemplate {
    /// Parse a template string.
    pub fn new(template: impl Into<String>) -> Self {
        let raw = template.into();
        let segments = raw
            .split(SEPARATOR)
            .map(|s| {
                if s.starts_with(WILDCARD_START) {
                    Segment::Wildcard
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { raw, segments }
    }

    /// The template as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `path` matches this template.
    pub fn matches(&self, path: &str) -> bool {
        if self.raw == path {
            return true;
        }

        let parts: Vec<&str> = path.split(SEPARATOR).collect();
        if parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(parts.iter())
            .skip(1)
            .all(|(segment, part)| match segment {
                Segment::Wildcard => !part.is_empty(),
                Segment::Literal(literal) => literal == part,
            })
    }
}

/// Returns true if `request_path` matches `template`.
pub fn matches(template: &str, request_path: &str) -> bool {
    PathTemplate::new(template).matches(request_path)
}
