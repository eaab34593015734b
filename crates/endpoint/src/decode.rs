//! The decode engine: walks a tree against a [`RequestContext`].
//!
//! The walk is depth-first and left before right. Mapped nodes are
//! transparent here, their functions only run in [`assemble`](crate::assemble).
//! Each leaf is decoded with its codec as soon as it is reached; the first
//! failure stops the walk and is the one reported.

use crate::context::{QueryParams, RequestContext};
use crate::failure::{DeclarationError, Failure, Reason, Stop};
use crate::node::{Leaf, Node, NodeKind};
use crate::value::AnyValue;
use bytes::Bytes;
use std::fmt;
use tracing::{debug, trace};

/// The raw input a leaf saw, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raw {
    /// Fixed leaves (method, path segment, fixed header) and the empty leaf.
    Unit,
    Segment(String),
    Segments(Vec<String>),
    Values(Vec<String>),
    Params(QueryParams),
    Body(Bytes),
    Stream,
    /// A body leaf waiting for [`Values::decode_body`] or
    /// [`Values::read_stream`].
    Unread,
}

pub(crate) struct DecodedLeaf {
    pub(crate) node: Node,
    pub(crate) raw: Raw,
    pub(crate) value: Option<AnyValue>,
}

/// Flat collection of decoded leaf values, in traversal order.
pub struct Values {
    pub(crate) leaves: Vec<DecodedLeaf>,
    remaining_path: Vec<String>,
    unread_body: Vec<usize>,
    unread_stream: Vec<usize>,
}

impl Values {
    /// Raw input of every leaf, in traversal order.
    pub fn raws(&self) -> Vec<&Raw> {
        self.leaves.iter().map(|leaf| &leaf.raw).collect()
    }

    pub fn raw(&self, index: usize) -> Option<&Raw> {
        self.leaves.get(index).map(|leaf| &leaf.raw)
    }

    /// Raw input of the leaf `node`, compared by identity.
    pub fn raw_of(&self, node: &Node) -> Option<&Raw> {
        self.leaves.iter().find(|leaf| leaf.node.ptr_eq(node)).map(|leaf| &leaf.raw)
    }

    /// Path segments no leaf consumed.
    pub fn remaining_path(&self) -> &[String] {
        &self.remaining_path
    }

    /// The first body leaf still waiting for the body, if the context did not
    /// have it during the walk.
    pub fn unread_body(&self) -> Option<&Node> {
        self.unread_body.first().map(|&index| &self.leaves[index].node)
    }

    /// Decodes every waiting body leaf from `body`, read once by the caller.
    ///
    /// On failure the first failing body leaf is reported and the values
    /// should be discarded.
    pub fn decode_body(&mut self, body: Bytes) -> Result<(), Failure> {
        for index in std::mem::take(&mut self.unread_body) {
            let leaf = &mut self.leaves[index];
            if let NodeKind::Leaf(Leaf::Body { codec }) = leaf.node.kind() {
                trace!(leaf = %leaf.node.describe(), len = body.len(), "decode deferred body");
                let value = codec.decode(body.clone()).map_err(|reason| fail(&leaf.node, reason))?;
                leaf.raw = Raw::Body(body.clone());
                leaf.value = Some(value);
            }
        }
        Ok(())
    }

    /// The first stream leaf still waiting for the request stream.
    ///
    /// Stream leaves never take the stream during the walk, so a tree that
    /// ends up not matching leaves it in place for the next one.
    pub fn unread_stream(&self) -> Option<&Node> {
        self.unread_stream.first().map(|&index| &self.leaves[index].node)
    }

    /// Hands the request stream from `ctx` to every waiting stream leaf.
    ///
    /// The stream can be taken once, a second stream leaf sees it missing.
    pub fn read_stream(&mut self, ctx: &mut dyn RequestContext) -> Result<(), Failure> {
        for index in std::mem::take(&mut self.unread_stream) {
            let leaf = &mut self.leaves[index];
            if let NodeKind::Leaf(Leaf::StreamBody { codec }) = leaf.node.kind() {
                trace!(leaf = %leaf.node.describe(), "take request stream");
                let stream = ctx.body_stream().ok_or_else(|| fail(&leaf.node, Reason::Missing))?;
                let value = codec.decode(stream).map_err(|reason| fail(&leaf.node, reason))?;
                leaf.raw = Raw::Stream;
                leaf.value = Some(value);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Values")
            .field("raws", &self.raws())
            .field("remaining_path", &self.remaining_path)
            .field("unread_body", &self.unread_body().map(Node::describe))
            .field("unread_stream", &self.unread_stream().map(Node::describe))
            .finish()
    }
}

/// Result of walking a tree against a request.
#[derive(Debug)]
pub enum DecodeOutcome {
    Values(Values),
    Failure(Failure),
}

impl DecodeOutcome {
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            DecodeOutcome::Values(_) => None,
            DecodeOutcome::Failure(failure) => Some(failure),
        }
    }
}

/// Decodes every leaf of `root` from `ctx`.
///
/// Leaves that cannot appear in a request (status codes) are a
/// [`DeclarationError`]. Data-dependent rejections are a
/// [`DecodeOutcome::Failure`].
pub fn decode(root: &Node, ctx: &mut dyn RequestContext) -> Result<DecodeOutcome, DeclarationError> {
    let mut decoder =
        Decoder { ctx, body: BodyState::NotRequested, leaves: vec![], unread_body: vec![], unread_stream: vec![] };

    match decoder.walk(root) {
        Ok(()) => {
            let remaining_path = decoder.ctx.remaining_path_segments();
            Ok(DecodeOutcome::Values(Values {
                leaves: decoder.leaves,
                remaining_path,
                unread_body: decoder.unread_body,
                unread_stream: decoder.unread_stream,
            }))
        }
        Err(Stop::Failed(failure)) => {
            debug!(leaf = %failure.node().describe(), reason = %failure.reason(), "decode failed");
            Ok(DecodeOutcome::Failure(failure))
        }
        Err(Stop::Defect(e)) => Err(e),
    }
}

enum BodyState {
    NotRequested,
    Read(Bytes),
    Unavailable,
}

struct Decoder<'c> {
    ctx: &'c mut dyn RequestContext,
    body: BodyState,
    leaves: Vec<DecodedLeaf>,
    unread_body: Vec<usize>,
    unread_stream: Vec<usize>,
}

impl Decoder<'_> {
    fn walk(&mut self, node: &Node) -> Result<(), Stop> {
        match node.kind() {
            NodeKind::Leaf(leaf) => self.leaf(node, leaf),
            NodeKind::Pair { left, right, .. } => {
                self.walk(left)?;
                self.walk(right)
            }
            NodeKind::Mapped { inner, .. } => self.walk(inner),
        }
    }

    fn leaf(&mut self, node: &Node, leaf: &Leaf) -> Result<(), Stop> {
        trace!(leaf = %node.describe(), "decode leaf");

        let (raw, value) = match leaf {
            Leaf::Empty => (Raw::Unit, unit()),
            Leaf::FixedMethod(expected) => {
                let actual = self.ctx.method();
                if actual != *expected {
                    return Err(fail(node, Reason::mismatch(expected, actual)).into());
                }
                (Raw::Unit, unit())
            }
            Leaf::FixedPath(expected) => match self.ctx.next_path_segment() {
                None => return Err(fail(node, Reason::Missing).into()),
                Some(segment) if segment == *expected => (Raw::Unit, unit()),
                Some(segment) => return Err(fail(node, Reason::mismatch(expected, segment)).into()),
            },
            Leaf::PathCapture { codec, .. } => {
                let segment = self.ctx.next_path_segment().ok_or_else(|| fail(node, Reason::Missing))?;
                let value = codec.decode(segment.clone()).map_err(|reason| fail(node, reason))?;
                (Raw::Segment(segment), value)
            }
            Leaf::PathsCapture { codec } => {
                let segments = self.ctx.remaining_path_segments();
                let value = codec.decode(segments.clone()).map_err(|reason| fail(node, reason))?;
                (Raw::Segments(segments), value)
            }
            Leaf::Query { name, codec } => {
                let values = self.ctx.query_values(name);
                let value = codec.decode(values.clone()).map_err(|reason| fail(node, reason))?;
                (Raw::Values(values), value)
            }
            Leaf::QueryParams { codec } => {
                let params = self.ctx.query_params();
                let value = codec.decode(params.clone()).map_err(|reason| fail(node, reason))?;
                (Raw::Params(params), value)
            }
            Leaf::Header { name, codec } => {
                let values = self.ctx.header_values(name);
                let value = codec.decode(values.clone()).map_err(|reason| fail(node, reason))?;
                (Raw::Values(values), value)
            }
            Leaf::FixedHeader { name, value: expected } => {
                let values = self.ctx.header_values(name);
                if values.is_empty() {
                    return Err(fail(node, Reason::Missing).into());
                }
                if !values.iter().any(|value| value == expected) {
                    return Err(fail(node, Reason::mismatch(expected, values.join(", "))).into());
                }
                (Raw::Unit, unit())
            }
            Leaf::Body { codec } => match self.body() {
                Some(body) => {
                    let value = codec.decode(body.clone()).map_err(|reason| fail(node, reason))?;
                    (Raw::Body(body), value)
                }
                None => {
                    trace!(leaf = %node.describe(), "body not read yet, deferring");
                    self.unread_body.push(self.leaves.len());
                    self.leaves.push(DecodedLeaf { node: node.clone(), raw: Raw::Unread, value: None });
                    return Ok(());
                }
            },
            Leaf::StreamBody { .. } => {
                self.unread_stream.push(self.leaves.len());
                self.leaves.push(DecodedLeaf { node: node.clone(), raw: Raw::Unread, value: None });
                return Ok(());
            }
            Leaf::FixedStatus(_) | Leaf::Status { .. } => {
                return Err(DeclarationError::NotAnInput { leaf: node.describe() }.into());
            }
        };

        self.leaves.push(DecodedLeaf { node: node.clone(), raw, value: Some(value) });
        Ok(())
    }

    /// Asks the context for the body at most once per walk.
    fn body(&mut self) -> Option<Bytes> {
        match &self.body {
            BodyState::Read(body) => Some(body.clone()),
            BodyState::Unavailable => None,
            BodyState::NotRequested => {
                let body = self.ctx.raw_body();
                self.body = match &body {
                    Some(body) => BodyState::Read(body.clone()),
                    None => BodyState::Unavailable,
                };
                body
            }
        }
    }
}

fn unit() -> AnyValue {
    Box::new(())
}

fn fail(node: &Node, reason: Reason) -> Failure {
    Failure::new(node.clone(), reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MockRequestContext, SimpleRequest};
    use crate::io::{
        fixed_header, get, header, json_body, path, path_param, paths, post, query, query_opt, status,
        string_body,
    };
    use http::{Method, StatusCode};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct NewItem {
        name: String,
    }

    fn values(outcome: DecodeOutcome) -> Values {
        match outcome {
            DecodeOutcome::Values(values) => values,
            DecodeOutcome::Failure(failure) => panic!("unexpected failure: {failure}"),
        }
    }

    fn failure(outcome: DecodeOutcome) -> Failure {
        match outcome {
            DecodeOutcome::Failure(failure) => failure,
            DecodeOutcome::Values(values) => panic!("unexpected values: {values:?}"),
        }
    }

    #[test]
    fn items_request_decodes_raw_values() {
        let input = get().and(path("items")).and(path_param::<i32>("id")).and(query_opt::<String>("sort"));
        let mut req = SimpleRequest::get("/items/42?sort=asc");

        let values = values(input.decode(&mut req).unwrap());
        assert_eq!(
            values.raws(),
            vec![&Raw::Unit, &Raw::Unit, &Raw::Segment("42".into()), &Raw::Values(vec!["asc".into()])]
        );
        assert!(values.remaining_path().is_empty());
        assert!(values.unread_body().is_none());
    }

    #[test]
    fn non_numeric_id_is_mismatch_at_capture() {
        let id = path_param::<i32>("id");
        let input = get().and(path("items")).and(id.clone()).and(query_opt::<String>("sort"));
        let mut req = SimpleRequest::get("/items/abc");

        let failure = failure(input.decode(&mut req).unwrap());
        assert!(failure.node().ptr_eq(id.node()));
        assert_eq!(failure.reason(), &Reason::mismatch("i32", "abc"));
    }

    #[test]
    fn absent_query_string_is_fine_for_optional_leaves() {
        let input = get().and(path("items")).and(query_opt::<String>("sort"));
        let mut req = SimpleRequest::get("/items");

        let values = values(input.decode(&mut req).unwrap());
        assert_eq!(values.raw(2), Some(&Raw::Values(vec![])));
    }

    #[test]
    fn absent_required_query_is_missing() {
        let limit = query::<u32>("limit");
        let mut req = SimpleRequest::get("/items");
        let failure = failure(get().and(limit.clone()).decode(&mut req).unwrap());
        assert!(failure.node().ptr_eq(limit.node()));
        assert_eq!(failure.reason(), &Reason::Missing);
    }

    #[test]
    fn repeated_single_query_is_multiple() {
        let mut req = SimpleRequest::get("/?n=1&n=2&n=3");
        let failure = failure(query::<u32>("n").decode(&mut req).unwrap());
        assert_eq!(failure.reason(), &Reason::multiple(3));
    }

    #[test]
    fn fixed_path_missing_and_mismatch() {
        let input = path("items").and(path("all"));

        let failure_missing = failure(input.decode(&mut SimpleRequest::get("/items")).unwrap());
        assert_eq!(failure_missing.reason(), &Reason::Missing);
        assert_eq!(failure_missing.node().describe(), "path segment `all`");

        let failure_mismatch = failure(input.decode(&mut SimpleRequest::get("/items/some")).unwrap());
        assert_eq!(failure_mismatch.reason(), &Reason::mismatch("all", "some"));
    }

    #[test]
    fn method_mismatch() {
        let failure = failure(post().and(path("items")).decode(&mut SimpleRequest::get("/items")).unwrap());
        assert_eq!(failure.reason(), &Reason::mismatch(Method::POST, Method::GET));
    }

    #[test]
    fn fixed_header_missing_and_mismatch() {
        let input = fixed_header("content-type", "application/json");

        assert!(input.decode(&mut SimpleRequest::post("/").header("Content-Type", "application/json")).unwrap().failure().is_none());

        let missing = failure(input.decode(&mut SimpleRequest::post("/")).unwrap());
        assert_eq!(missing.reason(), &Reason::Missing);

        let mismatch = failure(input.decode(&mut SimpleRequest::post("/").header("content-type", "text/plain")).unwrap());
        assert_eq!(mismatch.reason(), &Reason::mismatch("application/json", "text/plain"));
    }

    #[test]
    fn paths_consumes_rest_and_tolerates_none() {
        let input = path("files").and(paths());

        let values_some = values(input.decode(&mut SimpleRequest::get("/files/a/b/c.txt")).unwrap());
        assert_eq!(values_some.raw(1), Some(&Raw::Segments(vec!["a".into(), "b".into(), "c.txt".into()])));
        assert!(values_some.remaining_path().is_empty());

        let values_none = values(input.decode(&mut SimpleRequest::get("/files")).unwrap());
        assert_eq!(values_none.raw(1), Some(&Raw::Segments(vec![])));
    }

    #[test]
    fn leftover_segments_are_reported() {
        let values = values(path("items").decode(&mut SimpleRequest::get("/items/42/extra")).unwrap());
        assert_eq!(values.remaining_path(), &["42".to_string(), "extra".to_string()]);
    }

    #[test]
    fn left_failure_wins() {
        let left = query::<u32>("a");
        let right = header::<u32>("b");
        let mut req = SimpleRequest::get("/?a=x").header("b", "y");

        let failure = failure(left.clone().and(right).decode(&mut req).unwrap());
        assert!(failure.node().ptr_eq(left.node()));
    }

    #[test]
    fn decoding_twice_is_deterministic() {
        let input = get().and(path("items")).and(path_param::<i32>("id")).and(query::<u32>("limit"));

        let first = failure(input.decode(&mut SimpleRequest::get("/items/x?limit=y")).unwrap());
        let second = failure(input.decode(&mut SimpleRequest::get("/items/x?limit=y")).unwrap());
        assert_eq!(first, second);

        let first = values(input.decode(&mut SimpleRequest::get("/items/1?limit=2")).unwrap());
        let second = values(input.decode(&mut SimpleRequest::get("/items/1?limit=2")).unwrap());
        assert_eq!(first.raws(), second.raws());
    }

    #[test]
    fn failure_short_circuits_later_leaves() {
        let mut ctx = MockRequestContext::new();
        ctx.expect_method().times(1).return_const(Method::GET);
        ctx.expect_next_path_segment().times(1).returning(|| Some("other".to_string()));
        ctx.expect_query_values().never();
        ctx.expect_header_values().never();
        ctx.expect_raw_body().never();
        ctx.expect_remaining_path_segments().never();

        let input = get().and(path("items")).and(query::<u32>("limit")).and(header::<String>("x-key")).and(string_body());
        let failure = failure(input.decode(&mut ctx).unwrap());
        assert_eq!(failure.node().describe(), "path segment `items`");
    }

    #[test]
    fn body_is_read_once_for_several_body_leaves() {
        let mut ctx = MockRequestContext::new();
        ctx.expect_raw_body().times(1).returning(|| Some(Bytes::from_static(br#"{"name":"pen"}"#)));
        ctx.expect_remaining_path_segments().times(1).returning(Vec::new);

        let input = string_body().and(json_body::<NewItem>());
        let values = values(input.decode(&mut ctx).unwrap());
        assert_eq!(values.raw(0), values.raw(1));
    }

    #[test]
    fn unavailable_body_is_deferred_then_decoded() {
        let body = json_body::<NewItem>();
        let input = post().and(path("items")).and(body.clone());
        let mut req = SimpleRequest::post("/items");

        let mut values = values(input.decode(&mut req).unwrap());
        assert!(values.unread_body().unwrap().ptr_eq(body.node()));
        assert_eq!(values.raw(2), Some(&Raw::Unread));

        values.decode_body(Bytes::from_static(br#"{"name":"pen"}"#)).unwrap();
        assert!(values.unread_body().is_none());

        match input.assemble(values).unwrap() {
            crate::TypedResult::Value { value, .. } => assert_eq!(value, (NewItem { name: "pen".into() },)),
            crate::TypedResult::Failure(failure) => panic!("unexpected failure: {failure}"),
        }
    }

    #[test]
    fn deferred_body_failure_blames_body_leaf() {
        let body = json_body::<NewItem>();
        let mut values = values(body.decode(&mut SimpleRequest::post("/")).unwrap());
        let failure = values.decode_body(Bytes::from_static(b"not json")).unwrap_err();
        assert!(failure.node().ptr_eq(body.node()));
        assert!(matches!(failure.reason(), Reason::Error { .. }));
    }

    #[test]
    fn stream_body_is_handed_over_after_the_walk() {
        let stream = crate::io::stream_body::<Vec<u8>>(crate::CodecFormat::octet_stream());
        let input = post().and(stream.clone());
        let mut req = SimpleRequest::post("/upload").stream(vec![1_u8, 2]);

        let mut decoded = values(input.decode(&mut req).unwrap());
        assert_eq!(decoded.raw(1), Some(&Raw::Unread));
        assert!(decoded.unread_stream().unwrap().ptr_eq(stream.node()));

        decoded.read_stream(&mut req).unwrap();
        assert_eq!(decoded.raw(1), Some(&Raw::Stream));
        assert!(decoded.unread_stream().is_none());

        let mut without_stream = SimpleRequest::post("/upload");
        let mut decoded = values(input.decode(&mut without_stream).unwrap());
        let missing = decoded.read_stream(&mut without_stream).unwrap_err();
        assert!(missing.node().ptr_eq(stream.node()));
        assert_eq!(missing.reason(), &Reason::Missing);
    }

    #[test]
    fn walk_never_takes_the_stream() {
        let mut ctx = MockRequestContext::new();
        ctx.expect_method().times(1).return_const(Method::POST);
        ctx.expect_next_path_segment().times(1).returning(|| Some("upload".to_string()));
        ctx.expect_remaining_path_segments().times(1).returning(|| vec!["big".to_string()]);
        ctx.expect_body_stream().never();

        let input = post().and(path("upload")).and(crate::io::stream_body::<Vec<u8>>(crate::CodecFormat::octet_stream()));
        let values = values(input.decode(&mut ctx).unwrap());
        assert_eq!(values.remaining_path(), &["big".to_string()]);
        assert!(values.unread_stream().is_some());
    }

    #[test]
    fn raw_of_finds_leaf_by_identity() {
        let id = path_param::<u32>("id");
        let input = path("items").and(id.clone());
        let values = values(input.decode(&mut SimpleRequest::get("/items/7")).unwrap());

        assert_eq!(values.raw_of(id.node()), Some(&Raw::Segment("7".into())));
        assert_eq!(values.raw_of(path_param::<u32>("id").node()), None);
    }

    #[test]
    fn status_leaf_in_input_is_declaration_error() {
        let err = get().and(status(StatusCode::OK)).decode(&mut SimpleRequest::get("/")).unwrap_err();
        assert!(matches!(err, DeclarationError::NotAnInput { .. }));
    }
}
