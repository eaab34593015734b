//! Where and why decoding failed, and what counts as a broken declaration.
//!
//! Two error classes never mix:
//!
//! - [`Failure`] is an expected, data-dependent outcome. It always names the
//!   [`Node`] at fault and a [`Reason`], and travels inside
//!   [`DecodeOutcome`](crate::DecodeOutcome) / [`TypedResult`](crate::TypedResult).
//! - [`DeclarationError`] means the endpoint description itself is malformed.
//!   No request can fix it, so it is returned through the outer `Result` of
//!   the engine entry points.

use crate::node::Node;
use std::fmt;
use thiserror::Error;

/// Why a leaf (or a mapped node) rejected the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Reason {
    #[error("missing value")]
    Missing,

    #[error("expected a single value, found {found}")]
    Multiple { found: usize },

    #[error("expected {expected}, found `{actual}`")]
    Mismatch { expected: String, actual: String },

    #[error("invalid value `{value}`: {message}")]
    Validation { message: String, value: String },

    #[error("cannot decode `{original}`: {cause}")]
    Error { original: String, cause: String },
}

impl Reason {
    pub fn multiple(found: usize) -> Self {
        Self::Multiple { found }
    }

    pub fn mismatch<E: ToString, A: ToString>(expected: E, actual: A) -> Self {
        Self::Mismatch { expected: expected.to_string(), actual: actual.to_string() }
    }

    pub fn validation<M: ToString, V: ToString>(message: M, value: V) -> Self {
        Self::Validation { message: message.to_string(), value: value.to_string() }
    }

    pub fn error<O: ToString, C: ToString>(original: O, cause: C) -> Self {
        Self::Error { original: original.to_string(), cause: cause.to_string() }
    }
}

/// Returned by the forward function of [`Io::try_map`](crate::io::Io::try_map)
/// to reject an otherwise well-formed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value `{value}`: {message}")]
pub struct ValidationError {
    message: String,
    value: String,
}

impl ValidationError {
    pub fn new<M: ToString, V: ToString>(message: M, value: V) -> Self {
        Self { message: message.to_string(), value: value.to_string() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl From<ValidationError> for Reason {
    fn from(e: ValidationError) -> Self {
        Reason::Validation { message: e.message, value: e.value }
    }
}

/// The first failure found while decoding or assembling a request.
#[derive(Clone, Error)]
#[error("{}: {reason}", node.describe())]
pub struct Failure {
    node: Node,
    reason: Reason,
}

impl Failure {
    pub fn new(node: Node, reason: Reason) -> Self {
        Self { node, reason }
    }

    /// The exact node that triggered the failure.
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn reason(&self) -> &Reason {
        &self.reason
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure").field("node", &self.node.describe()).field("reason", &self.reason).finish()
    }
}

/// Two failures are equal when they blame the same node for the same reason.
impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.node.ptr_eq(&other.node) && self.reason == other.reason
    }
}

/// A defect in an endpoint declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("an output declares {found} body leaves, at most one is allowed")]
    MultipleBodies { found: usize },

    #[error("declared value type does not line up, expected `{expected}`")]
    TypeMismatch { expected: &'static str },

    #[error("{leaf} cannot be decoded from a request")]
    NotAnInput { leaf: String },

    #[error("{leaf} cannot be encoded into a response")]
    NotAnOutput { leaf: String },

    #[error("codec of {leaf} could not encode its value: {cause}")]
    InvalidEncodedValue { leaf: String, cause: String },

    #[error("{leaf} has not been read, decode the body before assembling")]
    BodyNotRead { leaf: String },

    #[error("decoded values do not belong to this declaration")]
    ForeignValues,
}

/// Why a tree walk stopped early.
///
/// Internal to the engine so that both classes can use `?`; the public entry
/// points split it back into `Result<Outcome, DeclarationError>`.
pub(crate) enum Stop {
    Failed(Failure),
    Defect(DeclarationError),
}

impl From<Failure> for Stop {
    fn from(failure: Failure) -> Self {
        Stop::Failed(failure)
    }
}

impl From<DeclarationError> for Stop {
    fn from(e: DeclarationError) -> Self {
        Stop::Defect(e)
    }
}
