//! Parameter binding.
//!
//! Every handler parameter type implements [`Bind`]. At registration the
//! parameters are classified left to right against a [`Signature`]:
//!
//! 1. [`Context`] and [`Request`] are passthroughs and consume nothing.
//! 2. Path scalars (`String`, floats, signed and unsigned integers) take the
//!    next unconsumed named segment. Once segments run out they fall through
//!    to the body.
//! 3. Body types ([`Json<T>`], `Option<Json<T>>`, `Vec<T>`, `bool`,
//!    `serde_json::Value`) decode the request payload through the route's
//!    protocol. They cannot sit on a named segment.
//! 4. Only one parameter may take the body.
//!
//! Any violation is a [`RegistrationError`]. The produced [`Binder`]s hold no
//! per-request state and are shared by every request to the route.

use std::any::type_name;
use std::sync::Arc;

use restbind_router::PathPattern;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::{BindError, RegistrationError};
use crate::json::Json;
use crate::protocol::ServerDecoder;
use crate::request::Request;

/// Produces one argument value from a request.
pub type Binder<T> = Box<dyn Fn(&Request) -> Result<T, BindError> + Send + Sync>;

/// Where a parameter gets its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRole {
    /// The per-request [`Context`].
    Context,
    /// The whole [`Request`].
    Request,
    /// A named path segment.
    Path {
        /// Capture name.
        name: String,
        /// Position among the pattern's captures.
        index: usize,
        /// Parameter type.
        type_name: &'static str,
    },
    /// The decoded request payload.
    Body {
        /// Parameter type.
        type_name: &'static str,
    },
}

/// Registration-time state of a handler being classified.
///
/// Once all parameters are bound, [`Signature::roles`] describes the
/// handler: one [`ParamRole`] per parameter in declared order.
#[derive(Debug, Clone)]
pub struct Signature {
    pattern: String,
    names: Vec<String>,
    next_segment: usize,
    body_taken: bool,
    roles: Vec<ParamRole>,
}

impl Signature {
    /// Starts classifying a handler for `pattern`.
    #[must_use]
    pub fn new(pattern: &PathPattern) -> Self {
        Self {
            pattern: pattern.as_str().to_string(),
            names: pattern.names().map(str::to_string).collect(),
            next_segment: 0,
            body_taken: false,
            roles: Vec::new(),
        }
    }

    /// The route pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Roles assigned so far, in parameter order.
    #[must_use]
    pub fn roles(&self) -> &[ParamRole] {
        &self.roles
    }

    /// Returns true if a parameter took the body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body_taken
    }

    /// Named segments no parameter consumed.
    #[must_use]
    pub fn unused_segments(&self) -> &[String] {
        &self.names[self.next_segment..]
    }

    fn position(&self) -> usize {
        self.roles.len() + 1
    }

    /// Records a passthrough parameter.
    pub fn bind_passthrough(&mut self, role: ParamRole) {
        self.roles.push(role);
    }

    /// Claims the next named segment for a `T` parameter.
    pub fn take_segment<T>(&mut self) -> Option<(usize, String)> {
        let index = self.next_segment;
        let name = self.names.get(index)?.clone();
        self.next_segment += 1;
        self.roles.push(ParamRole::Path {
            name: name.clone(),
            index,
            type_name: type_name::<T>(),
        });
        Some((index, name))
    }

    /// Fails if a named segment is still waiting for a parameter, since `T`
    /// has no path conversion.
    pub fn refuse_segment<T>(&self) -> Result<(), RegistrationError> {
        match self.names.get(self.next_segment) {
            Some(name) => Err(RegistrationError::UnsupportedPathType {
                pattern: self.pattern.clone(),
                name: name.clone(),
                type_name: type_name::<T>(),
                position: self.position(),
            }),
            None => Ok(()),
        }
    }

    /// Claims the body for a `T` parameter.
    pub fn take_body<T>(&mut self) -> Result<(), RegistrationError> {
        if self.body_taken {
            return Err(RegistrationError::NoBindingSource {
                pattern: self.pattern.clone(),
                type_name: type_name::<T>(),
                position: self.position(),
            });
        }
        self.body_taken = true;
        self.roles.push(ParamRole::Body {
            type_name: type_name::<T>(),
        });
        Ok(())
    }
}

/// A type that can appear as a handler parameter.
pub trait Bind: Sized + Send + 'static {
    /// Classifies the parameter and builds its binder.
    fn binder<P: ServerDecoder>(
        signature: &mut Signature,
        protocol: &Arc<P>,
    ) -> Result<Binder<Self>, RegistrationError>;
}

impl Bind for Context {
    fn binder<P: ServerDecoder>(
        signature: &mut Signature,
        _protocol: &Arc<P>,
    ) -> Result<Binder<Self>, RegistrationError> {
        signature.bind_passthrough(ParamRole::Context);
        Ok(Box::new(|request| Ok(request.context().clone())))
    }
}

impl Bind for Request {
    fn binder<P: ServerDecoder>(
        signature: &mut Signature,
        _protocol: &Arc<P>,
    ) -> Result<Binder<Self>, RegistrationError> {
        signature.bind_passthrough(ParamRole::Request);
        Ok(Box::new(|request| Ok(request.clone())))
    }
}

/// Scalars that can be parsed out of a single path segment.
trait PathValue: Sized + Send + 'static {
    fn parse_segment(raw: &str) -> Result<Self, String>;
}

impl PathValue for String {
    fn parse_segment(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

macro_rules! impl_path_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PathValue for $ty {
                fn parse_segment(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

impl_path_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

fn is_infinity_literal(raw: &str) -> bool {
    let unsigned = raw.trim_start_matches(&['+', '-'][..]);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

macro_rules! impl_path_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PathValue for $ty {
                fn parse_segment(raw: &str) -> Result<Self, String> {
                    let value = raw.parse::<$ty>().map_err(|e| e.to_string())?;
                    // Overflow parses to infinity; only accept it when spelled out.
                    if value.is_infinite() && !is_infinity_literal(raw) {
                        return Err("value out of range".to_string());
                    }
                    Ok(value)
                }
            }
        )*
    };
}

impl_path_float!(f32, f64);

fn segment_binder<T: PathValue>(index: usize, name: String) -> Binder<T> {
    Box::new(move |request| {
        let raw = request
            .params()
            .get_index(index)
            .ok_or_else(|| BindError::MissingSegment { name: name.clone() })?;
        T::parse_segment(raw).map_err(|reason| BindError::InvalidSegment {
            name: name.clone(),
            value: raw.to_string(),
            reason,
        })
    })
}

fn body_binder<T, P>(signature: &mut Signature, protocol: &Arc<P>) -> Result<Binder<T>, RegistrationError>
where
    T: DeserializeOwned + Send + 'static,
    P: ServerDecoder,
{
    signature.take_body::<T>()?;
    let protocol = Arc::clone(protocol);
    Ok(Box::new(move |request| {
        protocol.decode_request(request).map_err(BindError::Body)
    }))
}

macro_rules! impl_bind_path {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn binder<P: ServerDecoder>(
                    signature: &mut Signature,
                    protocol: &Arc<P>,
                ) -> Result<Binder<Self>, RegistrationError> {
                    match signature.take_segment::<Self>() {
                        Some((index, name)) => Ok(segment_binder::<Self>(index, name)),
                        None => body_binder::<Self, P>(signature, protocol),
                    }
                }
            }
        )*
    };
}

impl_bind_path!(String, f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_bind_body {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn binder<P: ServerDecoder>(
                    signature: &mut Signature,
                    protocol: &Arc<P>,
                ) -> Result<Binder<Self>, RegistrationError> {
                    signature.refuse_segment::<Self>()?;
                    body_binder::<Self, P>(signature, protocol)
                }
            }
        )*
    };
}

impl_bind_body!(bool, serde_json::Value);

impl<T: DeserializeOwned + Send + 'static> Bind for Vec<T> {
    fn binder<P: ServerDecoder>(
        signature: &mut Signature,
        protocol: &Arc<P>,
    ) -> Result<Binder<Self>, RegistrationError> {
        signature.refuse_segment::<Self>()?;
        body_binder::<Self, P>(signature, protocol)
    }
}

impl<T: DeserializeOwned + Send + 'static> Bind for Json<T> {
    fn binder<P: ServerDecoder>(
        signature: &mut Signature,
        protocol: &Arc<P>,
    ) -> Result<Binder<Self>, RegistrationError> {
        signature.refuse_segment::<Self>()?;
        let inner = body_binder::<T, P>(signature, protocol)?;
        Ok(Box::new(move |request| inner(request).map(Json)))
    }
}

/// An empty body binds as `None`.
impl<T: DeserializeOwned + Send + 'static> Bind for Option<Json<T>> {
    fn binder<P: ServerDecoder>(
        signature: &mut Signature,
        protocol: &Arc<P>,
    ) -> Result<Binder<Self>, RegistrationError> {
        signature.refuse_segment::<Self>()?;
        let inner = body_binder::<T, P>(signature, protocol)?;
        Ok(Box::new(move |request| {
            if request.body().is_empty() {
                return Ok(None);
            }
            inner(request).map(|value| Some(Json(value)))
        }))
    }
}
