use crate::failure_handler::{DecodeFailureHandler, DefaultDecodeFailureHandler};
use http::StatusCode;
use std::fmt;
use std::sync::Arc;

/// Settings shared by every endpoint an interpreter serves.
#[derive(Clone)]
pub struct ServerOptions {
    decode_failure_handler: Arc<dyn DecodeFailureHandler>,
    default_status: StatusCode,
    default_error_status: StatusCode,
}

impl ServerOptions {
    pub fn builder() -> ServerOptionsBuilder {
        ServerOptionsBuilder::new()
    }

    pub fn decode_failure_handler(&self) -> &dyn DecodeFailureHandler {
        self.decode_failure_handler.as_ref()
    }

    /// Status of a successful response without a status leaf.
    pub fn default_status(&self) -> StatusCode {
        self.default_status
    }

    /// Status of an error response without a status leaf.
    pub fn default_error_status(&self) -> StatusCode {
        self.default_error_status
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptionsBuilder::new().build()
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("default_status", &self.default_status)
            .field("default_error_status", &self.default_error_status)
            .finish_non_exhaustive()
    }
}

pub struct ServerOptionsBuilder {
    decode_failure_handler: Arc<dyn DecodeFailureHandler>,
    default_status: StatusCode,
    default_error_status: StatusCode,
}

impl ServerOptionsBuilder {
    fn new() -> Self {
        Self {
            decode_failure_handler: Arc::new(DefaultDecodeFailureHandler),
            default_status: StatusCode::OK,
            default_error_status: StatusCode::BAD_REQUEST,
        }
    }

    #[must_use]
    pub fn decode_failure_handler(mut self, handler: impl DecodeFailureHandler + 'static) -> Self {
        self.decode_failure_handler = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn default_status(mut self, status: StatusCode) -> Self {
        self.default_status = status;
        self
    }

    #[must_use]
    pub fn default_error_status(mut self, status: StatusCode) -> Self {
        self.default_error_status = status;
        self
    }

    pub fn build(self) -> ServerOptions {
        ServerOptions {
            decode_failure_handler: self.decode_failure_handler,
            default_status: self.default_status,
            default_error_status: self.default_error_status,
        }
    }
}

impl fmt::Debug for ServerOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptionsBuilder")
            .field("default_status", &self.default_status)
            .field("default_error_status", &self.default_error_status)
            .finish_non_exhaustive()
    }
}
