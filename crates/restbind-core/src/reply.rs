//! Handler return shapes.
//!
//! A handler returns `Result<O, E>`. The error side always wins. On success
//! `O` is turned into a [`Reply`] through [`IntoReply`], which decides
//! between "no body", "body", "explicit status" and "body with explicit
//! status".

use std::collections::{BTreeMap, HashMap};

use http::StatusCode;
use serde::Serialize;

use crate::json::Json;

/// What a successful handler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// No body, default status.
    NoBody,
    /// A body with the default status.
    Body(T),
    /// An explicit status and no body.
    Status(StatusCode),
    /// A body with an explicit status.
    BodyAndStatus(T, StatusCode),
}

impl<T> Reply<T> {
    /// The explicit status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) | Self::BodyAndStatus(_, status) => Some(*status),
            Self::NoBody | Self::Body(_) => None,
        }
    }

    /// The body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&T> {
        match self {
            Self::Body(body) | Self::BodyAndStatus(body, _) => Some(body),
            Self::NoBody | Self::Status(_) => None,
        }
    }

    /// Splits into `(status, body)`.
    #[must_use]
    pub fn into_parts(self) -> (Option<StatusCode>, Option<T>) {
        match self {
            Self::NoBody => (None, None),
            Self::Body(body) => (None, Some(body)),
            Self::Status(status) => (Some(status), None),
            Self::BodyAndStatus(body, status) => (Some(status), Some(body)),
        }
    }
}

/// Converts a handler's success value into a [`Reply`].
///
/// ```rust
/// use http::StatusCode;
/// use restbind_core::{IntoReply, Json, Reply};
///
/// assert_eq!(().into_reply(), Reply::NoBody);
/// assert_eq!(StatusCode::IM_A_TEAPOT.into_reply(), Reply::Status(StatusCode::IM_A_TEAPOT));
/// assert_eq!(Json("hi").into_reply(), Reply::Body("hi"));
/// assert_eq!(
///     (7, StatusCode::ACCEPTED).into_reply(),
///     Reply::BodyAndStatus(7, StatusCode::ACCEPTED)
/// );
/// ```
pub trait IntoReply: Send + 'static {
    /// Body type handed to the protocol encoder.
    type Body: Serialize + Send;

    /// Performs the conversion.
    fn into_reply(self) -> Reply<Self::Body>;
}

impl<T: Serialize + Send + 'static> IntoReply for Reply<T> {
    type Body = T;

    fn into_reply(self) -> Reply<T> {
        self
    }
}

impl IntoReply for () {
    type Body = ();

    fn into_reply(self) -> Reply<()> {
        Reply::NoBody
    }
}

impl IntoReply for StatusCode {
    type Body = ();

    fn into_reply(self) -> Reply<()> {
        Reply::Status(self)
    }
}

impl<T: Serialize + Send + 'static> IntoReply for (T, StatusCode) {
    type Body = T;

    fn into_reply(self) -> Reply<T> {
        Reply::BodyAndStatus(self.0, self.1)
    }
}

impl<T: Serialize + Send + 'static> IntoReply for Json<T> {
    type Body = T;

    fn into_reply(self) -> Reply<T> {
        Reply::Body(self.0)
    }
}

/// `None` is an absent body.
impl<T: Serialize + Send + 'static> IntoReply for Option<T> {
    type Body = T;

    fn into_reply(self) -> Reply<T> {
        self.map_or(Reply::NoBody, Reply::Body)
    }
}

impl<T: Serialize + Send + 'static> IntoReply for Vec<T> {
    type Body = Self;

    fn into_reply(self) -> Reply<Self> {
        Reply::Body(self)
    }
}

impl<V: Serialize + Send + 'static> IntoReply for HashMap<String, V> {
    type Body = Self;

    fn into_reply(self) -> Reply<Self> {
        Reply::Body(self)
    }
}

impl<V: Serialize + Send + 'static> IntoReply for BTreeMap<String, V> {
    type Body = Self;

    fn into_reply(self) -> Reply<Self> {
        Reply::Body(self)
    }
}

macro_rules! impl_into_reply_body {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                type Body = Self;

                fn into_reply(self) -> Reply<Self> {
                    Reply::Body(self)
                }
            }
        )*
    };
}

impl_into_reply_body!(
    String,
    &'static str,
    bool,
    f32,
    f64,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    serde_json::Value,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parts() {
        assert_eq!(Reply::<u8>::NoBody.into_parts(), (None, None));
        assert_eq!(Reply::Body(1).into_parts(), (None, Some(1)));
        assert_eq!(
            Reply::<u8>::Status(StatusCode::ACCEPTED).into_parts(),
            (Some(StatusCode::ACCEPTED), None)
        );
        assert_eq!(
            Reply::BodyAndStatus(1, StatusCode::IM_A_TEAPOT).into_parts(),
            (Some(StatusCode::IM_A_TEAPOT), Some(1))
        );
    }

    #[test]
    fn test_reply_accessors() {
        let reply = Reply::BodyAndStatus("x", StatusCode::CREATED);
        assert_eq!(reply.status(), Some(StatusCode::CREATED));
        assert_eq!(reply.body(), Some(&"x"));
        assert_eq!(Reply::<()>::NoBody.body(), None);
    }

    #[test]
    fn test_option_maps_to_no_body() {
        assert_eq!(None::<u8>.into_reply(), Reply::NoBody);
        assert_eq!(Some(5u8).into_reply(), Reply::Body(5));
    }

    #[test]
    fn test_scalars_are_bodies() {
        assert_eq!(43i64.into_reply(), Reply::Body(43));
        assert_eq!("hi".to_string().into_reply(), Reply::Body("hi".to_string()));
        assert_eq!(vec![1, 2].into_reply(), Reply::Body(vec![1, 2]));
        assert_eq!(
            serde_json::json!({"a": 1}).into_reply(),
            Reply::Body(serde_json::json!({"a": 1}))
        );
    }
}
