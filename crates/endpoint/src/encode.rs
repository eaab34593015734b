//! The output encoder: splits a typed value down to leaves and renders each
//! one into its response slot.
//!
//! Pair nodes run their split function, mapped nodes their backward mapping.
//! There is no failure channel for data: every error here is a
//! [`DeclarationError`].

use crate::codec::CodecFormat;
use crate::failure::DeclarationError;
use crate::node::{ErasedCodec, Leaf, Node, NodeKind};
use crate::value::{AnyValue, StreamHandle};
use bytes::Bytes;
use http::StatusCode;
use tracing::trace;

/// A rendered response body.
#[derive(Debug)]
pub enum OutputBody {
    Bytes { bytes: Bytes, format: CodecFormat },
    Stream { stream: StreamHandle, format: CodecFormat },
}

impl OutputBody {
    pub fn format(&self) -> &CodecFormat {
        match self {
            OutputBody::Bytes { format, .. } | OutputBody::Stream { format, .. } => format,
        }
    }
}

/// Response attributes accumulated while encoding.
///
/// Headers keep insertion order and may repeat.
#[derive(Debug, Default)]
pub struct OutputValues {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Option<OutputBody>,
}

impl OutputValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status set by a status leaf, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The status set by a status leaf, or `default`.
    pub fn status_or(&self, default: StatusCode) -> StatusCode {
        self.status.unwrap_or(default)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&OutputBody> {
        self.body.as_ref()
    }

    pub fn into_parts(self) -> (Option<StatusCode>, Vec<(String, String)>, Option<OutputBody>) {
        (self.status, self.headers, self.body)
    }

    fn add_header(&mut self, name: &str, value: String) {
        self.headers.push((name.to_string(), value));
    }

    fn set_body(&mut self, body: OutputBody) -> Result<(), DeclarationError> {
        if self.body.is_some() {
            return Err(DeclarationError::MultipleBodies { found: 2 });
        }
        self.body = Some(body);
        Ok(())
    }
}

/// Encodes `value`, of the type `root` was declared with, into response slots.
pub fn encode(root: &Node, value: AnyValue) -> Result<OutputValues, DeclarationError> {
    let mut output = OutputValues::new();
    encode_node(root, value, &mut output)?;
    Ok(output)
}

fn encode_node(node: &Node, value: AnyValue, output: &mut OutputValues) -> Result<(), DeclarationError> {
    match node.kind() {
        NodeKind::Leaf(leaf) => encode_leaf(node, leaf, value, output),
        NodeKind::Pair { left, right, split, .. } => {
            let (left_value, right_value) = split(value)?;
            encode_node(left, left_value, output)?;
            encode_node(right, right_value, output)
        }
        NodeKind::Mapped { inner, from, .. } => encode_node(inner, from(value)?, output),
    }
}

fn encode_leaf(node: &Node, leaf: &Leaf, value: AnyValue, output: &mut OutputValues) -> Result<(), DeclarationError> {
    trace!(leaf = %node.describe(), "encode leaf");

    match leaf {
        Leaf::Empty => Ok(()),
        Leaf::Header { name, codec } => {
            for header_value in raw(node, codec, value)? {
                output.add_header(name, header_value);
            }
            Ok(())
        }
        Leaf::FixedHeader { name, value } => {
            output.add_header(name, value.clone());
            Ok(())
        }
        Leaf::Body { codec } => {
            let bytes = raw(node, codec, value)?;
            output.set_body(OutputBody::Bytes { bytes, format: codec.format().clone() })
        }
        Leaf::StreamBody { codec } => {
            let stream = raw(node, codec, value)?;
            output.set_body(OutputBody::Stream { stream, format: codec.format().clone() })
        }
        Leaf::FixedStatus(status) => {
            output.status = Some(*status);
            Ok(())
        }
        Leaf::Status { codec } => {
            output.status = Some(raw(node, codec, value)?);
            Ok(())
        }
        Leaf::FixedMethod(_)
        | Leaf::FixedPath(_)
        | Leaf::PathCapture { .. }
        | Leaf::PathsCapture { .. }
        | Leaf::Query { .. }
        | Leaf::QueryParams { .. } => Err(DeclarationError::NotAnOutput { leaf: node.describe() }),
    }
}

fn raw<L: 'static>(node: &Node, codec: &ErasedCodec<L>, value: AnyValue) -> Result<L, DeclarationError> {
    codec
        .encode(value)?
        .map_err(|e| DeclarationError::InvalidEncodedValue { leaf: node.describe(), cause: e.to_string() })
}
