//! Captured path parameters.
//!
//! A match produces one value per named segment, in pattern order. The
//! names belong to the route and are shared, so a match only allocates its
//! values.

use std::sync::Arc;

use smallvec::SmallVec;

/// Values captured by a route match, addressable by name or position.
///
/// ```rust
/// use restbind_router::Params;
///
/// let mut params = Params::new();
/// params.push("org", "acme");
/// params.push("id", "7");
///
/// assert_eq!(params.get("id"), Some("7"));
/// assert_eq!(params.get_index(0), Some("acme"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Params {
    names: Names,
    values: SmallVec<[String; 4]>,
}

/// Route-owned names, or names pushed one at a time when built by hand.
#[derive(Debug, Clone)]
enum Names {
    Shared(Arc<[String]>),
    Owned(Vec<String>),
}

impl Default for Names {
    fn default() -> Self {
        Self::Owned(Vec::new())
    }
}

impl Names {
    fn as_slice(&self) -> &[String] {
        match self {
            Self::Shared(names) => names,
            Self::Owned(names) => names,
        }
    }
}

impl Params {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs a route's capture names with the values of one match.
    ///
    /// Surplus names or values are ignored.
    pub fn from_captures(names: Arc<[String]>, values: impl IntoIterator<Item = String>) -> Self {
        let values: SmallVec<[String; 4]> = values.into_iter().take(names.len()).collect();
        Self {
            names: Names::Shared(names),
            values,
        }
    }

    /// Appends a capture.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let len = self.values.len();
        if let Names::Shared(shared) = &self.names {
            self.names = Names::Owned(shared.iter().take(len).cloned().collect());
        }
        if let Names::Owned(names) = &mut self.names {
            names.truncate(len);
            names.push(name.into());
        }
        self.values.push(value.into());
    }

    /// The value of the first capture called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let index = self.names.as_slice().iter().position(|n| n == name)?;
        self.get_index(index)
    }

    /// The value captured by the `index`-th named segment.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .as_slice()
            .iter()
            .zip(&self.values)
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for Params {}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let (names, values) = iter.into_iter().unzip();
        Self {
            names: Names::Owned(names),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(names: &[&str]) -> Arc<[String]> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_empty() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.get_index(0), None);
        assert_eq!(params.iter().count(), 0);
    }

    #[test]
    fn test_from_captures() {
        let params = Params::from_captures(
            shared(&["org", "id"]),
            vec!["acme".to_string(), "7".to_string()],
        );
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("org"), Some("acme"));
        assert_eq!(params.get_index(1), Some("7"));
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("org", "acme"), ("id", "7")]);
    }

    #[test]
    fn test_from_captures_ignores_surplus_values() {
        let params = Params::from_captures(
            shared(&["id"]),
            vec!["1".to_string(), "2".to_string()],
        );
        assert_eq!(params.len(), 1);
        assert_eq!(params.get_index(1), None);
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let mut params = Params::new();
        params.push("id", "1");
        params.push("id", "2");
        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.get_index(1), Some("2"));
    }

    #[test]
    fn test_push_after_shared() {
        let mut params = Params::from_captures(shared(&["a", "b"]), vec!["1".to_string()]);
        params.push("c", "3");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "1"), ("c", "3")]);
    }

    #[test]
    fn test_equality_ignores_storage() {
        let mut built = Params::new();
        built.push("id", "9");
        let matched = Params::from_captures(shared(&["id"]), vec!["9".to_string()]);
        assert_eq!(built, matched);
    }
}
