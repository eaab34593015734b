use crate::body::{BoxError, RequestBody, ResponseBody};
use crate::options::ServerOptions;
use crate::server_endpoint::{EndpointHandler, Served};
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body as HttpBody;
use std::fmt;
use tracing::{debug, info};

pub struct ServerInterpreterBuilder {
    endpoints: Vec<Box<dyn EndpointHandler>>,
    options: ServerOptions,
}

impl ServerInterpreterBuilder {
    fn new() -> Self {
        Self { endpoints: vec![], options: ServerOptions::default() }
    }

    /// Adds an endpoint; endpoints are tried in the order they were added.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl EndpointHandler + 'static) -> Self {
        self.endpoints.push(Box::new(endpoint));
        self
    }

    #[must_use]
    pub fn options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> ServerInterpreter {
        for endpoint in &self.endpoints {
            info!(endpoint = %endpoint.describe(), "register endpoint");
        }
        ServerInterpreter { endpoints: self.endpoints, options: self.options }
    }
}

impl fmt::Debug for ServerInterpreterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerInterpreterBuilder")
            .field("endpoints", &self.endpoints.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Serves requests against a list of endpoints.
pub struct ServerInterpreter {
    endpoints: Vec<Box<dyn EndpointHandler>>,
    options: ServerOptions,
}

impl ServerInterpreter {
    pub fn builder() -> ServerInterpreterBuilder {
        ServerInterpreterBuilder::new()
    }

    /// Tries every endpoint in order and answers with the first one that
    /// matches, or the failure handler's no-match response.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let body = RequestBody::new(body);

        for endpoint in &self.endpoints {
            match endpoint.serve(&parts, &body, &self.options).await {
                Served::Response(response) => {
                    debug!(method = %parts.method, uri = %parts.uri, status = %response.status(), "request served");
                    return response;
                }
                Served::NoMatch => {}
            }
        }

        debug!(method = %parts.method, uri = %parts.uri, "no endpoint matched");
        self.options.decode_failure_handler().no_match()
    }
}

impl fmt::Debug for ServerInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerInterpreter")
            .field("endpoints", &self.endpoints.iter().map(|e| e.describe()).collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}
