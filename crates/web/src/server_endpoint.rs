//! Endpoints paired with the logic that serves them.

use crate::body::{RequestBody, ResponseBody};
use crate::error::WebError;
use crate::options::ServerOptions;
use crate::request::HttpRequestContext;
use crate::response::{into_response, text_response};
use async_trait::async_trait;
use http::request::Parts;
use http::{Response, StatusCode};
use micro_endpoint::{DeclarationError, DecodeOutcome, Endpoint, Failure, OutputValues, TypedResult, Values};
use std::fmt;
use std::future::Future;
use tracing::{debug, error, warn};

/// What serving one endpoint against a request came to.
#[derive(Debug)]
pub enum Served {
    Response(Response<ResponseBody>),
    /// The endpoint does not apply, the next one should be tried.
    NoMatch,
}

/// An endpoint with its logic, type-erased so that endpoints of different
/// input and output types can be served from one list.
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    fn describe(&self) -> String;

    async fn serve(&self, parts: &Parts, body: &RequestBody, options: &ServerOptions) -> Served;
}

pub struct ServerEndpoint<I, E, O, F> {
    endpoint: Endpoint<I, E, O>,
    logic: F,
}

impl<I, E, O, F> ServerEndpoint<I, E, O, F> {
    pub fn new(endpoint: Endpoint<I, E, O>, logic: F) -> Self {
        Self { endpoint, logic }
    }
}

/// Pairs `endpoint` with an async function from its input to its output or
/// error output.
pub fn server_endpoint<I, E, O, F, Fut>(endpoint: Endpoint<I, E, O>, logic: F) -> ServerEndpoint<I, E, O, F>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send,
{
    ServerEndpoint::new(endpoint, logic)
}

impl<I, E, O, F> fmt::Debug for ServerEndpoint<I, E, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEndpoint").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

impl<I, E, O, F, Fut> ServerEndpoint<I, E, O, F>
where
    I: Send + 'static,
    E: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send,
{
    /// Decodes the request head, then reads the body or takes the stream only
    /// when the input needs it and the head matched.
    async fn decode(&self, parts: &Parts, body: &RequestBody, options: &ServerOptions) -> Result<Decoded<I>, WebError> {
        let mut ctx = HttpRequestContext::new(parts, body);
        let outcome = self.endpoint.input().decode(&mut ctx)?;

        let mut values = match outcome {
            DecodeOutcome::Values(values) => values,
            DecodeOutcome::Failure(failure) => return Ok(self.reject(&failure, options)),
        };

        if !values.remaining_path().is_empty() {
            debug!(endpoint = %self.endpoint.describe(), remaining = ?values.remaining_path(), "path not fully consumed");
            return Ok(Decoded::Rejected(Served::NoMatch));
        }

        if values.unread_body().is_some() {
            let bytes = match body.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(cause = %e, "failed to read request body");
                    return Ok(Decoded::Rejected(Served::Response(text_response(StatusCode::BAD_REQUEST, e.to_string()))));
                }
            };
            if let Err(failure) = values.decode_body(bytes) {
                return Ok(self.reject(&failure, options));
            }
        }

        if values.unread_stream().is_some()
            && let Err(failure) = values.read_stream(&mut ctx)
        {
            return Ok(self.reject(&failure, options));
        }

        self.assemble(values, options)
    }

    fn assemble(&self, values: Values, options: &ServerOptions) -> Result<Decoded<I>, WebError> {
        match self.endpoint.input().assemble(values)? {
            TypedResult::Value { value, .. } => Ok(Decoded::Value(value)),
            TypedResult::Failure(failure) => Ok(self.reject(&failure, options)),
        }
    }

    fn reject(&self, failure: &Failure, options: &ServerOptions) -> Decoded<I> {
        debug!(endpoint = %self.endpoint.describe(), failure = %failure, "decode failed");
        match options.decode_failure_handler().on_failure(failure) {
            Some(response) => Decoded::Rejected(Served::Response(response)),
            None => Decoded::Rejected(Served::NoMatch),
        }
    }

    fn respond(
        output: Result<OutputValues, DeclarationError>,
        status: StatusCode,
    ) -> Result<Response<ResponseBody>, WebError> {
        into_response(output?, status)
    }
}

enum Decoded<I> {
    Value(I),
    Rejected(Served),
}

#[async_trait]
impl<I, E, O, F, Fut> EndpointHandler for ServerEndpoint<I, E, O, F>
where
    I: Send + 'static,
    E: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send,
{
    fn describe(&self) -> String {
        self.endpoint.describe()
    }

    async fn serve(&self, parts: &Parts, body: &RequestBody, options: &ServerOptions) -> Served {
        let input = match self.decode(parts, body, options).await {
            Ok(Decoded::Value(input)) => input,
            Ok(Decoded::Rejected(served)) => return served,
            Err(e) => return Served::Response(internal_error(&self.endpoint.describe(), &e)),
        };

        debug!(endpoint = %self.endpoint.describe(), "endpoint matched");
        let response = match (self.logic)(input).await {
            Ok(output) => Self::respond(self.endpoint.encode_output(output), options.default_status()),
            Err(error_output) => Self::respond(self.endpoint.encode_error(error_output), options.default_error_status()),
        };

        match response {
            Ok(response) => Served::Response(response),
            Err(e) => Served::Response(internal_error(&self.endpoint.describe(), &e)),
        }
    }
}

fn internal_error(endpoint: &str, e: &WebError) -> Response<ResponseBody> {
    error!(endpoint, cause = %e, "failed to serve request");
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}
