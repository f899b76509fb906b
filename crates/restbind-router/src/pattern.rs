//! Path pattern parsing.
//!
//! A pattern is a `/`-separated list of segments. A segment starting with
//! `:` is a named capture (`/users/:id`); every other segment is matched
//! literally. Empty segments are ignored, so `/users/` and `/users` are the
//! same pattern.

use std::fmt;
use std::str::FromStr;

use crate::error::PatternError;

/// Prefix marking a named segment.
pub const NAMED_PREFIX: char = ':';

/// One segment of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal text that must match exactly.
    Static(String),
    /// Named capture; matches any single non-empty segment.
    Named(String),
}

impl Segment {
    /// Returns the capture name for named segments.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Static(_) => None,
        }
    }
}

/// A parsed URL path pattern.
///
/// # Example
///
/// ```rust
/// use restbind_router::PathPattern;
///
/// let pattern = PathPattern::parse("/orgs/:org/users/:id").unwrap();
/// assert_eq!(pattern.names().collect::<Vec<_>>(), vec!["org", "id"]);
/// assert_eq!(pattern.param_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a pattern string.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash {
                pattern: raw.to_string(),
            });
        }

        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            if let Some(name) = part.strip_prefix(NAMED_PREFIX) {
                if name.is_empty() {
                    return Err(PatternError::EmptyName {
                        pattern: raw.to_string(),
                    });
                }
                segments.push(Segment::Named(name.to_string()));
            } else {
                segments.push(Segment::Static(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as originally written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Capture names in registration (left-to-right) order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(Segment::name)
    }

    /// Number of named segments.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.names().count()
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
