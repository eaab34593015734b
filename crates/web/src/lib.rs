//! Serving `micro-endpoint` descriptions over [`http`] types
//!
//! [`ServerInterpreter`] takes an [`http::Request`], tries each registered
//! [`ServerEndpoint`] in order and answers with an
//! [`http::Response<ResponseBody>`](ResponseBody). The request body is read
//! at most once, and only after an endpoint matched the request head.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use http_body_util::Empty;
//! use micro_endpoint::Endpoint;
//! use micro_endpoint::io::{get, path, path_param, string_body};
//! use micro_endpoint_web::{server_endpoint, ServerInterpreter};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let hello = Endpoint::builder()
//!     .input(get().and(path("hello")).and(path_param::<String>("name")))
//!     .output(string_body())
//!     .build()
//!     .unwrap();
//!
//! let interpreter = ServerInterpreter::builder()
//!     .endpoint(server_endpoint(hello, |(name,): (String,)| async move { Ok::<_, ()>((format!("hello {name}"),)) }))
//!     .build();
//!
//! let response = interpreter.handle(Request::get("/hello/world").body(Empty::<Bytes>::new()).unwrap()).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

mod body;
mod error;
mod failure_handler;
mod interpreter;
mod options;
mod request;
mod response;
mod server_endpoint;

pub use body::BodyStream;
pub use body::BoxError;
pub use body::RequestBody;
pub use body::ResponseBody;
pub use error::WebError;
pub use failure_handler::DecodeFailureHandler;
pub use failure_handler::DefaultDecodeFailureHandler;
pub use interpreter::ServerInterpreter;
pub use interpreter::ServerInterpreterBuilder;
pub use options::ServerOptions;
pub use options::ServerOptionsBuilder;
pub use request::HttpRequestContext;
pub use response::into_response;
pub use response::text_response;
pub use server_endpoint::server_endpoint;
pub use server_endpoint::EndpointHandler;
pub use server_endpoint::ServerEndpoint;
pub use server_endpoint::Served;
