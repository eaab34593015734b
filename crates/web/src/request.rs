//! The [`RequestContext`] implementation over [`http`] request parts.

use crate::body::RequestBody;
use bytes::Bytes;
use http::request::Parts;
use http::Method;
use micro_endpoint::context::{split_path, QueryParams, RequestContext};
use micro_endpoint::StreamHandle;
use std::collections::VecDeque;
use tracing::{trace, warn};

/// Walks the head of one request, borrowing the shared [`RequestBody`].
///
/// A fresh context is created for every endpoint tried, so each one starts
/// from the first path segment.
#[derive(Debug)]
pub struct HttpRequestContext<'req> {
    parts: &'req Parts,
    body: &'req RequestBody,
    segments: VecDeque<String>,
    query: QueryParams,
}

impl<'req> HttpRequestContext<'req> {
    pub fn new(parts: &'req Parts, body: &'req RequestBody) -> Self {
        let segments = split_path(parts.uri.path()).into();
        let query = match parts.uri.query().map(QueryParams::parse) {
            Some(Ok(query)) => query,
            Some(Err(e)) => {
                warn!(cause = %e, uri = %parts.uri, "malformed query string, treating it as empty");
                QueryParams::new()
            }
            None => QueryParams::new(),
        };

        Self { parts, body, segments, query }
    }
}

impl RequestContext for HttpRequestContext<'_> {
    fn next_path_segment(&mut self) -> Option<String> {
        self.segments.pop_front()
    }

    fn remaining_path_segments(&mut self) -> Vec<String> {
        self.segments.drain(..).collect()
    }

    fn query_values(&self, name: &str) -> Vec<String> {
        self.query.get_all(name)
    }

    fn query_params(&self) -> QueryParams {
        self.query.clone()
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.parts
            .headers
            .get_all(name)
            .iter()
            .filter_map(|value| match value.to_str() {
                Ok(value) => Some(value.to_string()),
                Err(_) => {
                    trace!(header = name, "skipping non visible-ascii header value");
                    None
                }
            })
            .collect()
    }

    fn method(&self) -> Method {
        self.parts.method.clone()
    }

    /// Always `None`: the body is read only once an endpoint's head matched,
    /// so body leaves are decoded after every other leaf.
    fn raw_body(&mut self) -> Option<Bytes> {
        None
    }

    fn body_stream(&mut self) -> Option<StreamHandle> {
        self.body.take_stream().map(StreamHandle::new)
    }
}
