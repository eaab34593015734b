//! Typed, bidirectional descriptions of HTTP endpoints
//!
//! An endpoint is described by trees of inputs and outputs. Each leaf of a
//! tree names one place of a request or response (the method, a path segment,
//! a query parameter, a header, the body, the status code) together with a
//! [`Codec`] between the raw text or bytes found there and a typed value.
//! Leaves are combined into pairs and wrapped with bidirectional mappings, so
//! the same tree both reads a request into a value and writes a value into a
//! response.
//!
//! Three engines walk the trees:
//!
//! - [`decode`] walks a tree against a [`RequestContext`](context::RequestContext),
//!   decoding every leaf and stopping at the first [`Failure`]
//! - [`assemble`] folds the decoded leaf values into the declared type,
//!   running the pair combiners and the forward mappings
//! - [`encode`] splits a typed value back down to leaves and renders them
//!   into [`OutputValues`]
//!
//! The engines are transport-agnostic. The `micro-endpoint-web` crate is a
//! backend serving endpoints over [`http`] types.
//!
//! # Example
//!
//! ```
//! use micro_endpoint::context::SimpleRequest;
//! use micro_endpoint::io::{get, path, path_param, query_opt, string_body};
//! use micro_endpoint::{Endpoint, OutputBody};
//!
//! let endpoint = Endpoint::builder()
//!     .input(get().and(path("items")).and(path_param::<u32>("id")).and(query_opt::<String>("sort")))
//!     .output(string_body())
//!     .build()
//!     .unwrap();
//!
//! let mut req = SimpleRequest::get("/items/42");
//! let (id, sort) = endpoint.decode_request(&mut req).unwrap().into_result().unwrap();
//! assert_eq!((id, sort), (42, None));
//!
//! let output = endpoint.encode_output((format!("item {id}"),)).unwrap();
//! assert!(matches!(output.body(), Some(OutputBody::Bytes { bytes, .. }) if bytes == "item 42"));
//! ```

mod assemble;
mod concat;
mod decode;
mod encode;
mod endpoint;
mod failure;
mod node;
mod value;

pub mod codec;
pub mod context;
pub mod io;

pub use assemble::assemble;
pub use assemble::TypedResult;
pub use codec::Codec;
pub use codec::CodecFormat;
pub use concat::Concat;
pub use decode::decode;
pub use decode::DecodeOutcome;
pub use decode::Raw;
pub use decode::Values;
pub use encode::encode;
pub use encode::OutputBody;
pub use encode::OutputValues;
pub use endpoint::Endpoint;
pub use endpoint::EndpointBuilder;
pub use failure::DeclarationError;
pub use failure::Failure;
pub use failure::Reason;
pub use failure::ValidationError;
pub use io::Io;
pub use node::LeafKind;
pub use node::Node;
pub use value::AnyValue;
pub use value::StreamHandle;
