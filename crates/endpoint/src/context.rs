//! The read-only view of one incoming request that the decode engine queries.
//!
//! Backends implement [`RequestContext`] over whatever request type their
//! transport produces. [`SimpleRequest`] is an in-memory implementation for
//! tests and for embedders that already hold a parsed request.

use crate::value::StreamHandle;
use bytes::Bytes;
use http::Method;
use percent_encoding::percent_decode_str;
use tracing::warn;

/// Accessors the decode engine needs, grouped by leaf kind.
///
/// Only the path has a cursor: [`next_path_segment`](RequestContext::next_path_segment)
/// and [`remaining_path_segments`](RequestContext::remaining_path_segments) advance it.
/// Every other accessor is an idempotent lookup.
#[cfg_attr(test, mockall::automock)]
pub trait RequestContext {
    /// Consumes the next path segment, if any.
    fn next_path_segment(&mut self) -> Option<String>;

    /// Consumes every path segment left after the cursor.
    fn remaining_path_segments(&mut self) -> Vec<String>;

    /// All values of the query parameter `name`, in request order.
    fn query_values(&self, name: &str) -> Vec<String>;

    /// Every query pair, in request order.
    fn query_params(&self) -> QueryParams;

    /// All values of the header `name`; names compare case-insensitively.
    fn header_values(&self, name: &str) -> Vec<String>;

    fn method(&self) -> Method;

    /// The fully read request body, or `None` when the backend has not read it
    /// yet. A `None` makes the engine report the body leaf as unread instead
    /// of failing.
    fn raw_body(&mut self) -> Option<Bytes>;

    /// Takes the streaming body. Returns `None` once taken.
    fn body_stream(&mut self) -> Option<StreamHandle>;
}

/// Ordered query pairs, duplicates allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Parses an `application/x-www-form-urlencoded` query string (without the leading `?`).
    pub fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str::<Vec<(String, String)>>(query).map(|pairs| Self { pairs })
    }

    pub fn push<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn get_all(&self, name: &str) -> Vec<String> {
        self.pairs.iter().filter(|(k, _)| k == name).map(|(_, v)| v.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(&self.pairs).unwrap_or_default()
    }
}

impl IntoIterator for QueryParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// Splits a request path into percent-decoded segments.
///
/// Empty segments are dropped, so `/items/42/`, `items/42` and `//items//42`
/// all give `["items", "42"]`.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect()
}

/// An in-memory request.
///
/// # Example
/// ```
/// use micro_endpoint::context::{RequestContext, SimpleRequest};
///
/// let mut req = SimpleRequest::get("/items/42?sort=asc").header("x-trace", "abc");
/// assert_eq!(req.next_path_segment().as_deref(), Some("items"));
/// assert_eq!(req.query_values("sort"), vec!["asc".to_string()]);
/// assert_eq!(req.header_values("X-Trace"), vec!["abc".to_string()]);
/// ```
#[derive(Debug)]
pub struct SimpleRequest {
    method: Method,
    segments: Vec<String>,
    cursor: usize,
    query: QueryParams,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    stream: Option<StreamHandle>,
}

impl SimpleRequest {
    /// Creates a request for `target`, a path with an optional `?query`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let query = QueryParams::parse(query).unwrap_or_else(|e| {
            warn!(cause = %e, query, "malformed query string, ignoring it");
            QueryParams::new()
        });

        Self {
            method,
            segments: split_path(path),
            cursor: 0,
            query,
            headers: vec![],
            body: None,
            stream: None,
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn stream<S: Send + 'static>(mut self, stream: S) -> Self {
        self.stream = Some(StreamHandle::new(stream));
        self
    }
}

impl RequestContext for SimpleRequest {
    fn next_path_segment(&mut self) -> Option<String> {
        let segment = self.segments.get(self.cursor).cloned();
        if segment.is_some() {
            self.cursor += 1;
        }
        segment
    }

    fn remaining_path_segments(&mut self) -> Vec<String> {
        let remaining = self.segments.get(self.cursor..).map(<[String]>::to_vec).unwrap_or_default();
        self.cursor = self.segments.len();
        remaining
    }

    fn query_values(&self, name: &str) -> Vec<String> {
        self.query.get_all(name)
    }

    fn query_params(&self) -> QueryParams {
        self.query.clone()
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.clone()).collect()
    }

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn raw_body(&mut self) -> Option<Bytes> {
        self.body.clone()
    }

    fn body_stream(&mut self) -> Option<StreamHandle> {
        self.stream.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_drops_empty_segments_and_decodes() {
        assert_eq!(split_path("/items/42/"), vec!["items", "42"]);
        assert_eq!(split_path("//a//b"), vec!["a", "b"]);
        assert_eq!(split_path("/"), Vec::<String>::new());
        assert_eq!(split_path("/files/my%20doc.txt"), vec!["files", "my doc.txt"]);
    }

    #[test]
    fn path_cursor_advances() {
        let mut req = SimpleRequest::get("/a/b/c");
        assert_eq!(req.next_path_segment().as_deref(), Some("a"));
        assert_eq!(req.remaining_path_segments(), vec!["b", "c"]);
        assert_eq!(req.next_path_segment(), None);
        assert!(req.remaining_path_segments().is_empty());
    }

    #[test]
    fn query_keeps_order_and_duplicates() {
        let req = SimpleRequest::get("/?tag=a&x=1&tag=b+c");
        assert_eq!(req.query_values("tag"), vec!["a", "b c"]);
        assert_eq!(req.query_values("missing"), Vec::<String>::new());
        assert_eq!(req.query_params().len(), 3);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = SimpleRequest::get("/").header("Accept", "text/plain").header("accept", "application/json");
        assert_eq!(req.header_values("ACCEPT"), vec!["text/plain", "application/json"]);
    }

    #[test]
    fn stream_is_taken_once() {
        let mut req = SimpleRequest::post("/upload").stream(vec![1_u8]);
        assert!(req.body_stream().is_some());
        assert!(req.body_stream().is_none());
    }

    #[test]
    fn pushed_params_are_appended() {
        let mut params = QueryParams::from_pairs([("tag", "a")]);
        params.push("tag", "b");
        params.push("sort", "asc");
        assert_eq!(params.get_all("tag"), vec!["a", "b"]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn query_params_round_trip_through_string() {
        let params = QueryParams::from_pairs([("q", "a b"), ("n", "1")]);
        let parsed = QueryParams::parse(&params.to_query_string()).unwrap();
        assert_eq!(parsed, params);
    }
}
