//! Translation of decode failures into responses.

use crate::body::ResponseBody;
use crate::response::text_response;
use http::{Response, StatusCode};
use micro_endpoint::{Failure, LeafKind, Reason};

/// Decides what a request that an endpoint failed to decode gets.
pub trait DecodeFailureHandler: Send + Sync {
    /// `None` means the endpoint does not match and the next one is tried.
    fn on_failure(&self, failure: &Failure) -> Option<Response<ResponseBody>>;

    /// The response when no endpoint matched.
    fn no_match(&self) -> Response<ResponseBody>;
}

/// Failures on the method or the path mean "no match", a missing
/// `authorization` header is `401`, anything else is `400`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecodeFailureHandler;

impl DecodeFailureHandler for DefaultDecodeFailureHandler {
    fn on_failure(&self, failure: &Failure) -> Option<Response<ResponseBody>> {
        let node = failure.node();
        match node.leaf_kind() {
            Some(kind) if kind.is_route() => None,
            Some(LeafKind::Header)
                if failure.reason() == &Reason::Missing
                    && node.name().is_some_and(|name| name.eq_ignore_ascii_case(http::header::AUTHORIZATION.as_str())) =>
            {
                Some(text_response(StatusCode::UNAUTHORIZED, failure.to_string()))
            }
            _ => Some(text_response(StatusCode::BAD_REQUEST, failure.to_string())),
        }
    }

    fn no_match(&self) -> Response<ResponseBody> {
        text_response(StatusCode::NOT_FOUND, "not found")
    }
}
