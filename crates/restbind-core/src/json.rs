//! The `Json` body wrapper.
//!
//! As a parameter, `Json<T>` is the request body decoded through the
//! route's protocol. As a return value, it is the response body.

use std::ops::{Deref, DerefMut};

use serde::{Serialize, Serializer};

/// A request or response body.
///
/// ```rust
/// use restbind_core::Json;
///
/// let Json(value) = Json(41);
/// assert_eq!(value + 1, 42);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consumes the wrapper and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
