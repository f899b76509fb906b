//! Radix tree node implementation.
//!
//! Each node is one path segment. Static children are kept sorted for
//! binary search; a node has at most one named child, shared by every
//! pattern with a capture at that position. Capture names live on the
//! [`Route`] rather than the node, so `/users/:id` and `/users/:name/posts`
//! keep their own names.

use http::Method;
use smallvec::SmallVec;

use crate::error::RouteError;
use crate::method_router::{MethodRouter, Route};
use crate::pattern::Segment;

/// Raw captured values, in pattern order.
pub type Captures<'p> = SmallVec<[&'p str; 4]>;

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Literal text for static nodes, `:` for the named child.
    segment: String,
    /// Routes ending at this node.
    methods: Option<MethodRouter<T>>,
    /// Static children, sorted by segment for binary search.
    static_children: Vec<Node<T>>,
    /// Named child (at most one per node).
    param_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            methods: None,
            static_children: Vec::new(),
            param_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new("")
    }

    /// Inserts a route below this node.
    pub fn insert(
        &mut self,
        segments: &[Segment],
        method: &Method,
        route: Route<T>,
    ) -> Result<(), RouteError> {
        let Some((first, remaining)) = segments.split_first() else {
            return self
                .methods
                .get_or_insert_with(MethodRouter::new)
                .insert(method, route);
        };

        match first {
            Segment::Static(text) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(i) => i,
                    Err(i) => {
                        self.static_children.insert(i, Node::new(text.clone()));
                        i
                    }
                };
                self.static_children[index].insert(remaining, method, route)
            }
            Segment::Named(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new(":")))
                .insert(remaining, method, route),
        }
    }

    /// Matches a request path.
    ///
    /// Returns the method router of the matched node and the raw captured
    /// values.
    #[must_use]
    pub fn match_path<'p>(&self, path: &'p str) -> Option<(&MethodRouter<T>, Captures<'p>)> {
        let segments: SmallVec<[&str; 8]> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut captures = Captures::new();
        let methods = self.match_segments(&segments, &mut captures)?;
        Some((methods, captures))
    }

    fn match_segments<'p>(
        &self,
        segments: &[&'p str],
        captures: &mut Captures<'p>,
    ) -> Option<&MethodRouter<T>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().filter(|m| m.has_any_method());
        };

        // Static first (highest priority)
        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, captures) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            let depth = captures.len();
            captures.push(segment);
            if let Some(found) = child.match_segments(remaining, captures) {
                return Some(found);
            }
            captures.truncate(depth);
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
