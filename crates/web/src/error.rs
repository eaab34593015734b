use crate::body::BoxError;
use micro_endpoint::DeclarationError;
use thiserror::Error;

/// Errors raised while serving a request, as opposed to decode failures,
/// which are answered through the [`DecodeFailureHandler`](crate::DecodeFailureHandler).
#[derive(Debug, Error)]
pub enum WebError {
    #[error("endpoint declaration error: {source}")]
    Declaration {
        #[from]
        source: DeclarationError,
    },

    #[error("failed to read request body: {source}")]
    ReadBody { source: BoxError },

    #[error("request body has been consumed")]
    BodyConsumed,

    #[error("invalid response header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("unsupported response stream type {type_name}")]
    UnsupportedStream { type_name: &'static str },
}

impl WebError {
    pub fn read_body<E: Into<BoxError>>(e: E) -> Self {
        Self::ReadBody { source: e.into() }
    }

    pub fn invalid_header<N: ToString, R: ToString>(name: N, reason: R) -> Self {
        Self::InvalidHeader { name: name.to_string(), reason: reason.to_string() }
    }
}
