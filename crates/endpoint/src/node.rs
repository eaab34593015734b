//! The recursive input/output description tree.
//!
//! A [`Node`] is a leaf describing one physical location of a request or
//! response, a pair of two sub-nodes folded together with a combine/split
//! function pair, or a single sub-node wrapped with a bidirectional mapping.
//! Nodes are immutable and cheap to clone; clones share identity, which is
//! what [`Failure::node`](crate::Failure::node) refers to.
//!
//! Nodes are usually built through the typed façade in [`crate::io`].

use crate::codec::{Codec, CodecFormat, DecodeResult, EncodeError};
use crate::context::QueryParams;
use crate::failure::{DeclarationError, ValidationError};
use crate::value::{downcast, AnyValue, StreamHandle};
use bytes::Bytes;
use http::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;

pub(crate) type Combine = Arc<dyn Fn(AnyValue, AnyValue) -> Result<AnyValue, DeclarationError> + Send + Sync>;
pub(crate) type Split = Arc<dyn Fn(AnyValue) -> Result<(AnyValue, AnyValue), DeclarationError> + Send + Sync>;
pub(crate) type MapTo =
    Arc<dyn Fn(AnyValue) -> Result<Result<AnyValue, ValidationError>, DeclarationError> + Send + Sync>;
pub(crate) type MapFrom = Arc<dyn Fn(AnyValue) -> Result<AnyValue, DeclarationError> + Send + Sync>;

type ErasedDecode<L> = Box<dyn Fn(L) -> DecodeResult<AnyValue> + Send + Sync>;
type ErasedEncode<L> = Box<dyn Fn(AnyValue) -> Result<Result<L, EncodeError>, DeclarationError> + Send + Sync>;

/// A [`Codec`] with its value type erased.
///
/// Decoded values are boxed as 1-tuples `(C::Value,)`, the shape the typed
/// façade gives every valued leaf.
pub(crate) struct ErasedCodec<L> {
    decode: ErasedDecode<L>,
    encode: ErasedEncode<L>,
    format: CodecFormat,
}

impl<L: 'static> ErasedCodec<L> {
    pub(crate) fn new<C: Codec<L>>(codec: C) -> Self {
        let format = codec.format();
        let codec = Arc::new(codec);
        let decoder = Arc::clone(&codec);

        Self {
            decode: Box::new(move |raw| decoder.decode(raw).map(|value| Box::new((value,)) as AnyValue)),
            encode: Box::new(move |value| {
                let (value,) = downcast::<(C::Value,)>(value)?;
                Ok(codec.encode(value))
            }),
            format,
        }
    }

    pub(crate) fn decode(&self, raw: L) -> DecodeResult<AnyValue> {
        (self.decode)(raw)
    }

    pub(crate) fn encode(&self, value: AnyValue) -> Result<Result<L, EncodeError>, DeclarationError> {
        (self.encode)(value)
    }

    pub(crate) fn format(&self) -> &CodecFormat {
        &self.format
    }
}

/// One physical location, with the codec for its raw representation.
pub(crate) enum Leaf {
    Empty,
    FixedMethod(Method),
    FixedPath(String),
    PathCapture { name: Option<String>, codec: ErasedCodec<String> },
    PathsCapture { codec: ErasedCodec<Vec<String>> },
    Query { name: String, codec: ErasedCodec<Vec<String>> },
    QueryParams { codec: ErasedCodec<QueryParams> },
    Header { name: String, codec: ErasedCodec<Vec<String>> },
    FixedHeader { name: String, value: String },
    Body { codec: ErasedCodec<Bytes> },
    StreamBody { codec: ErasedCodec<StreamHandle> },
    FixedStatus(StatusCode),
    Status { codec: ErasedCodec<StatusCode> },
}

/// Public, data-free view of a leaf's kind, for backends classifying failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Empty,
    FixedMethod,
    FixedPath,
    PathCapture,
    PathsCapture,
    Query,
    QueryParams,
    Header,
    FixedHeader,
    Body,
    StreamBody,
    FixedStatus,
    Status,
}

impl LeafKind {
    /// Whether the leaf can be decoded from a request.
    pub fn is_input(self) -> bool {
        !matches!(self, LeafKind::FixedStatus | LeafKind::Status)
    }

    /// Whether the leaf can be encoded into a response.
    pub fn is_output(self) -> bool {
        matches!(
            self,
            LeafKind::Empty
                | LeafKind::Header
                | LeafKind::FixedHeader
                | LeafKind::Body
                | LeafKind::StreamBody
                | LeafKind::FixedStatus
                | LeafKind::Status
        )
    }

    /// Whether the leaf is part of the request line: the method or the path.
    pub fn is_route(self) -> bool {
        matches!(self, LeafKind::FixedMethod | LeafKind::FixedPath | LeafKind::PathCapture | LeafKind::PathsCapture)
    }
}

impl Leaf {
    fn kind(&self) -> LeafKind {
        match self {
            Leaf::Empty => LeafKind::Empty,
            Leaf::FixedMethod(_) => LeafKind::FixedMethod,
            Leaf::FixedPath(_) => LeafKind::FixedPath,
            Leaf::PathCapture { .. } => LeafKind::PathCapture,
            Leaf::PathsCapture { .. } => LeafKind::PathsCapture,
            Leaf::Query { .. } => LeafKind::Query,
            Leaf::QueryParams { .. } => LeafKind::QueryParams,
            Leaf::Header { .. } => LeafKind::Header,
            Leaf::FixedHeader { .. } => LeafKind::FixedHeader,
            Leaf::Body { .. } => LeafKind::Body,
            Leaf::StreamBody { .. } => LeafKind::StreamBody,
            Leaf::FixedStatus(_) => LeafKind::FixedStatus,
            Leaf::Status { .. } => LeafKind::Status,
        }
    }

    fn describe(&self) -> String {
        match self {
            Leaf::Empty => "empty value".to_string(),
            Leaf::FixedMethod(method) => format!("method {method}"),
            Leaf::FixedPath(segment) => format!("path segment `{segment}`"),
            Leaf::PathCapture { name: Some(name), .. } => format!("path parameter `{name}`"),
            Leaf::PathCapture { name: None, .. } => "path parameter".to_string(),
            Leaf::PathsCapture { .. } => "remaining path".to_string(),
            Leaf::Query { name, .. } => format!("query parameter `{name}`"),
            Leaf::QueryParams { .. } => "query parameters".to_string(),
            Leaf::Header { name, .. } => format!("header `{name}`"),
            Leaf::FixedHeader { name, value } => format!("header `{name}: {value}`"),
            Leaf::Body { .. } => "body".to_string(),
            Leaf::StreamBody { .. } => "body stream".to_string(),
            Leaf::FixedStatus(status) => format!("status code {status}"),
            Leaf::Status { .. } => "status code".to_string(),
        }
    }
}

pub(crate) enum NodeKind {
    Leaf(Leaf),
    Pair { left: Node, right: Node, combine: Combine, split: Split },
    Mapped { inner: Node, to: MapTo, from: MapFrom },
}

/// A node of an input/output description tree.
#[derive(Clone)]
pub struct Node {
    kind: Arc<NodeKind>,
}

impl Node {
    pub(crate) fn leaf(leaf: Leaf) -> Self {
        Self { kind: Arc::new(NodeKind::Leaf(leaf)) }
    }

    pub(crate) fn pair(left: Node, right: Node, combine: Combine, split: Split) -> Self {
        Self { kind: Arc::new(NodeKind::Pair { left, right, combine, split }) }
    }

    pub(crate) fn mapped(inner: Node, to: MapTo, from: MapFrom) -> Self {
        Self { kind: Arc::new(NodeKind::Mapped { inner, to, from }) }
    }

    pub(crate) fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether both handles refer to the very same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.kind, &other.kind)
    }

    /// The leaf kind, or `None` for composite nodes.
    pub fn leaf_kind(&self) -> Option<LeafKind> {
        match self.kind() {
            NodeKind::Leaf(leaf) => Some(leaf.kind()),
            NodeKind::Pair { .. } | NodeKind::Mapped { .. } => None,
        }
    }

    /// The parameter or header name of a named leaf.
    pub fn name(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Leaf(
                Leaf::PathCapture { name: Some(name), .. }
                | Leaf::Query { name, .. }
                | Leaf::Header { name, .. }
                | Leaf::FixedHeader { name, .. },
            ) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Human-readable location, e.g. "query parameter `sort`".
    ///
    /// A mapped node describes the node it wraps.
    pub fn describe(&self) -> String {
        match self.kind() {
            NodeKind::Leaf(leaf) => leaf.describe(),
            NodeKind::Pair { left, right, .. } => format!("{} and {}", left.describe(), right.describe()),
            NodeKind::Mapped { inner, .. } => inner.describe(),
        }
    }

    /// Media type of a body leaf's codec.
    pub fn body_format(&self) -> Option<&CodecFormat> {
        match self.kind() {
            NodeKind::Leaf(Leaf::Body { codec }) => Some(codec.format()),
            NodeKind::Leaf(Leaf::StreamBody { codec }) => Some(codec.format()),
            _ => None,
        }
    }

    /// Every leaf, in the left-to-right depth-first order the engine walks them.
    pub fn leaves(&self) -> Vec<Node> {
        let mut leaves = vec![];
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(&self, leaves: &mut Vec<Node>) {
        match self.kind() {
            NodeKind::Leaf(_) => leaves.push(self.clone()),
            NodeKind::Pair { left, right, .. } => {
                left.collect_leaves(leaves);
                right.collect_leaves(leaves);
            }
            NodeKind::Mapped { inner, .. } => inner.collect_leaves(leaves),
        }
    }

    /// Number of leaves that target the body slot.
    pub fn body_leaves(&self) -> usize {
        self.leaves()
            .iter()
            .filter(|leaf| matches!(leaf.leaf_kind(), Some(LeafKind::Body | LeafKind::StreamBody)))
            .count()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Leaf(leaf) => f.debug_tuple("Leaf").field(&leaf.describe()).finish(),
            NodeKind::Pair { left, right, .. } => f.debug_tuple("Pair").field(left).field(right).finish(),
            NodeKind::Mapped { inner, .. } => f.debug_tuple("Mapped").field(inner).finish(),
        }
    }
}
