//! Typed construction of input/output trees.
//!
//! [`Io<T>`] is a [`Node`] tagged with the type `T` it decodes to and encodes
//! from. The free functions of this module build leaves, [`Io::and`],
//! [`Io::pair_with`], [`Io::map`] and [`Io::try_map`] build composites.
//!
//! # Example
//! ```
//! use micro_endpoint::context::SimpleRequest;
//! use micro_endpoint::io::{get, path, path_param, query_opt};
//! use micro_endpoint::TypedResult;
//!
//! let input = get().and(path("items")).and(path_param::<u32>("id")).and(query_opt::<String>("sort"));
//!
//! let mut req = SimpleRequest::get("/items/42?sort=asc");
//! match input.decode_and_assemble(&mut req).unwrap() {
//!     TypedResult::Value { value, .. } => assert_eq!(value, (42, Some("asc".to_string()))),
//!     TypedResult::Failure(failure) => panic!("unexpected {failure}"),
//! }
//! ```

use crate::assemble::{assemble, TypedResult};
use crate::codec::{
    BytesBody, Codec, CodecFormat, Form, Json, Optional, QueryStruct, Repeated, Segments, Single, Status, Stream,
    Text, Utf8,
};
use crate::concat::Concat;
use crate::context::{QueryParams, RequestContext};
use crate::decode::{decode, DecodeOutcome, Values};
use crate::encode::{encode, OutputValues};
use crate::failure::{DeclarationError, ValidationError};
use crate::node::{Combine, ErasedCodec, Leaf, MapFrom, MapTo, Node, Split};
use crate::value::{downcast, AnyValue};
use bytes::Bytes;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;
use std::fmt;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

/// A description tree whose value has type `T`.
pub struct Io<T> {
    node: Node,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Io<T> {
    fn clone(&self) -> Self {
        Self { node: self.node.clone(), _marker: PhantomData }
    }
}

impl<T> fmt::Debug for Io<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Io").field("type", &type_name::<T>()).field("node", &self.node).finish()
    }
}

impl<T> Io<T> {
    fn from_node(node: Node) -> Self {
        Self { node, _marker: PhantomData }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }
}

impl<T: Send + 'static> Io<T> {
    /// Pairs two trees, concatenating their tuple values.
    pub fn and<U>(self, other: Io<U>) -> Io<T::Out>
    where
        T: Concat<U>,
        U: Send + 'static,
        T::Out: Send + 'static,
    {
        let combine: Combine = Arc::new(|left, right| {
            let left = downcast::<T>(left)?;
            let right = downcast::<U>(right)?;
            Ok(Box::new(left.concat(right)) as AnyValue)
        });
        let split: Split = Arc::new(|value| {
            let (left, right) = T::split(downcast::<T::Out>(value)?);
            Ok((Box::new(left) as AnyValue, Box::new(right) as AnyValue))
        });

        Io::from_node(Node::pair(self.node, other.node, combine, split))
    }

    /// Pairs two trees with explicit combine and split functions.
    ///
    /// `split(combine(t, u)) == (t, u)` is assumed, not checked.
    pub fn pair_with<U, V, C, S>(self, other: Io<U>, combine: C, split: S) -> Io<(V,)>
    where
        U: Send + 'static,
        V: Send + 'static,
        C: Fn(T, U) -> V + Send + Sync + 'static,
        S: Fn(V) -> (T, U) + Send + Sync + 'static,
    {
        let combine: Combine = Arc::new(move |left, right| {
            let value = combine(downcast::<T>(left)?, downcast::<U>(right)?);
            Ok(Box::new((value,)) as AnyValue)
        });
        let split: Split = Arc::new(move |value| {
            let (value,) = downcast::<(V,)>(value)?;
            let (left, right) = split(value);
            Ok((Box::new(left) as AnyValue, Box::new(right) as AnyValue))
        });

        Io::from_node(Node::pair(self.node, other.node, combine, split))
    }

    /// Wraps the tree with a total bidirectional mapping.
    pub fn map<U, F, G>(self, to: F, from: G) -> Io<(U,)>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
        G: Fn(U) -> T + Send + Sync + 'static,
    {
        self.try_map(move |value| Ok(to(value)), from)
    }

    /// Wraps the tree with a mapping whose forward direction may reject the value.
    ///
    /// A rejection surfaces as a [`Reason::Validation`](crate::Reason::Validation)
    /// failure blaming the mapped node.
    pub fn try_map<U, F, G>(self, to: F, from: G) -> Io<(U,)>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U, ValidationError> + Send + Sync + 'static,
        G: Fn(U) -> T + Send + Sync + 'static,
    {
        let to: MapTo = Arc::new(move |value| {
            let value = downcast::<T>(value)?;
            Ok(to(value).map(|mapped| Box::new((mapped,)) as AnyValue))
        });
        let from: MapFrom = Arc::new(move |value| {
            let (value,) = downcast::<(U,)>(value)?;
            Ok(Box::new(from(value)) as AnyValue)
        });

        Io::from_node(Node::mapped(self.node, to, from))
    }

    /// Walks the tree against a request, see [`decode`].
    pub fn decode(&self, ctx: &mut dyn RequestContext) -> Result<DecodeOutcome, DeclarationError> {
        decode(&self.node, ctx)
    }

    /// Folds decoded values into a `T`, see [`assemble`].
    pub fn assemble(&self, values: Values) -> Result<TypedResult<T>, DeclarationError> {
        match assemble(&self.node, values)? {
            TypedResult::Value { value, remaining_path } => {
                Ok(TypedResult::Value { value: downcast::<T>(value)?, remaining_path })
            }
            TypedResult::Failure(failure) => Ok(TypedResult::Failure(failure)),
        }
    }

    /// [`decode`](Io::decode) followed by [`assemble`](Io::assemble).
    ///
    /// The context must hand out the body from [`RequestContext::raw_body`] if the
    /// tree has a body leaf, otherwise this is a [`DeclarationError::BodyNotRead`].
    /// A stream leaf takes the stream once every other leaf decoded.
    pub fn decode_and_assemble(&self, ctx: &mut dyn RequestContext) -> Result<TypedResult<T>, DeclarationError> {
        let mut values = match self.decode(ctx)? {
            DecodeOutcome::Values(values) => values,
            DecodeOutcome::Failure(failure) => return Ok(TypedResult::Failure(failure)),
        };
        if let Err(failure) = values.read_stream(ctx) {
            return Ok(TypedResult::Failure(failure));
        }
        self.assemble(values)
    }

    /// Renders a value into response slots, see [`encode`].
    pub fn encode(&self, value: T) -> Result<OutputValues, DeclarationError> {
        encode(&self.node, Box::new(value))
    }
}

fn leaf<T>(leaf: Leaf) -> Io<T> {
    Io::from_node(Node::leaf(leaf))
}

/// Matches nothing and decodes to `()`.
pub fn empty() -> Io<()> {
    leaf(Leaf::Empty)
}

/// Requires the request method to be `method`.
pub fn method(method: Method) -> Io<()> {
    leaf(Leaf::FixedMethod(method))
}

macro_rules! method_io {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Requires an HTTP ", stringify!($upper_case_method), " request.")]
        #[inline]
        pub fn $method() -> Io<()> {
            method(Method::$upper_case_method)
        }
    };
}

method_io!(get, GET);
method_io!(post, POST);
method_io!(put, PUT);
method_io!(delete, DELETE);
method_io!(head, HEAD);
method_io!(options, OPTIONS);
method_io!(connect, CONNECT);
method_io!(patch, PATCH);
method_io!(trace, TRACE);

/// Requires the next path segment to equal `segment`.
pub fn path<S: Into<String>>(segment: S) -> Io<()> {
    leaf(Leaf::FixedPath(segment.into()))
}

/// Captures the next path segment as `T`.
pub fn path_param<T>(name: &str) -> Io<(T,)>
where
    T: FromStr + Display + Send + 'static,
{
    path_param_with(name, Text::<T>::new())
}

pub fn path_param_with<C: Codec<String>>(name: &str, codec: C) -> Io<(C::Value,)> {
    leaf(Leaf::PathCapture { name: Some(name.to_string()), codec: ErasedCodec::new(codec) })
}

/// Captures the next path segment as `T` without naming it.
pub fn path_capture<T>() -> Io<(T,)>
where
    T: FromStr + Display + Send + 'static,
{
    leaf(Leaf::PathCapture { name: None, codec: ErasedCodec::new(Text::<T>::new()) })
}

/// Captures every remaining path segment, possibly none.
pub fn paths() -> Io<(Vec<String>,)> {
    paths_with(Segments)
}

pub fn paths_with<C: Codec<Vec<String>>>(codec: C) -> Io<(C::Value,)> {
    leaf(Leaf::PathsCapture { codec: ErasedCodec::new(codec) })
}

/// A required query parameter.
pub fn query<T>(name: &str) -> Io<(T,)>
where
    T: FromStr + Display + Send + 'static,
{
    query_with(name, Single(Text::<T>::new()))
}

/// An optional query parameter.
pub fn query_opt<T>(name: &str) -> Io<(Option<T>,)>
where
    T: FromStr + Display + Send + 'static,
{
    query_with(name, Optional(Text::<T>::new()))
}

/// Every value of a repeated query parameter.
pub fn query_list<T>(name: &str) -> Io<(Vec<T>,)>
where
    T: FromStr + Display + Send + 'static,
{
    query_with(name, Repeated(Text::<T>::new()))
}

pub fn query_with<C: Codec<Vec<String>>>(name: &str, codec: C) -> Io<(C::Value,)> {
    leaf(Leaf::Query { name: name.to_string(), codec: ErasedCodec::new(codec) })
}

/// Every query pair as it is.
pub fn query_params() -> Io<(QueryParams,)> {
    query_params_with(AllParams)
}

/// The whole query string deserialized into `T`.
pub fn query_struct<T>() -> Io<(T,)>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    query_params_with(QueryStruct::<T>::new())
}

pub fn query_params_with<C: Codec<QueryParams>>(codec: C) -> Io<(C::Value,)> {
    leaf(Leaf::QueryParams { codec: ErasedCodec::new(codec) })
}

/// A required header.
pub fn header<T>(name: &str) -> Io<(T,)>
where
    T: FromStr + Display + Send + 'static,
{
    header_with(name, Single(Text::<T>::new()))
}

/// An optional header.
pub fn header_opt<T>(name: &str) -> Io<(Option<T>,)>
where
    T: FromStr + Display + Send + 'static,
{
    header_with(name, Optional(Text::<T>::new()))
}

/// Every value of a repeated header.
pub fn header_list<T>(name: &str) -> Io<(Vec<T>,)>
where
    T: FromStr + Display + Send + 'static,
{
    header_with(name, Repeated(Text::<T>::new()))
}

pub fn header_with<C: Codec<Vec<String>>>(name: &str, codec: C) -> Io<(C::Value,)> {
    leaf(Leaf::Header { name: name.to_string(), codec: ErasedCodec::new(codec) })
}

/// Requires (on input) or adds (on output) the header `name: value`.
pub fn fixed_header<K: Into<String>, V: Into<String>>(name: K, value: V) -> Io<()> {
    leaf(Leaf::FixedHeader { name: name.into(), value: value.into() })
}

pub fn body_with<C: Codec<Bytes>>(codec: C) -> Io<(C::Value,)> {
    leaf(Leaf::Body { codec: ErasedCodec::new(codec) })
}

/// The body as UTF-8 text.
pub fn string_body() -> Io<(String,)> {
    text_body::<String>()
}

/// The body as UTF-8 text parsed into `T`.
pub fn text_body<T>() -> Io<(T,)>
where
    T: FromStr + Display + Send + 'static,
{
    body_with(Utf8(Text::<T>::new()))
}

pub fn bytes_body() -> Io<(Bytes,)> {
    body_with(BytesBody)
}

pub fn json_body<T>() -> Io<(T,)>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    body_with(Json::<T>::new())
}

pub fn form_body<T>() -> Io<(T,)>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    body_with(Form::<T>::new())
}

/// An opaque streaming body of type `S`, never read by the core.
pub fn stream_body<S: Send + 'static>(format: CodecFormat) -> Io<(S,)> {
    leaf(Leaf::StreamBody { codec: ErasedCodec::new(Stream::<S>::new(format)) })
}

/// Sets the response status to `status`.
pub fn status(status: StatusCode) -> Io<()> {
    leaf(Leaf::FixedStatus(status))
}

/// Sets the response status from the value.
pub fn status_code() -> Io<(StatusCode,)> {
    leaf(Leaf::Status { codec: ErasedCodec::new(Status) })
}

/// Passthrough codec behind [`query_params`].
#[derive(Debug, Clone, Copy, Default)]
struct AllParams;

impl Codec<QueryParams> for AllParams {
    type Value = QueryParams;

    fn decode(&self, raw: QueryParams) -> crate::codec::DecodeResult<QueryParams> {
        Ok(raw)
    }

    fn encode(&self, value: QueryParams) -> Result<QueryParams, crate::codec::EncodeError> {
        Ok(value)
    }
}
