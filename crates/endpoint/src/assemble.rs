//! The value assembler: folds decoded leaf values back into the declared shape.
//!
//! Assembly re-walks the tree in the same order as [`decode`](crate::decode()),
//! consuming one decoded value per leaf. It never touches the request: it
//! only sees the [`Values`] collection. Pair nodes run their combine
//! function, mapped nodes their forward mapping, which is the only place a
//! well-formed decode can still fail.

use crate::decode::{DecodedLeaf, Values};
use crate::failure::{DeclarationError, Failure, Stop};
use crate::node::{Node, NodeKind};
use crate::value::AnyValue;
use tracing::debug;

/// Outcome of assembling a request value.
#[derive(Debug)]
pub enum TypedResult<T> {
    Value { value: T, remaining_path: Vec<String> },
    Failure(Failure),
}

impl<T> TypedResult<T> {
    /// Converts into a plain `Result`, dropping the remaining path.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            TypedResult::Value { value, .. } => Ok(value),
            TypedResult::Failure(failure) => Err(failure),
        }
    }
}

/// Assembles `values`, produced by decoding `root`, into one value.
///
/// `values` must come from the same tree and have its body decoded and its
/// stream taken, anything else is a [`DeclarationError`].
pub fn assemble(root: &Node, values: Values) -> Result<TypedResult<AnyValue>, DeclarationError> {
    if let Some(leaf) = values.unread_body().or_else(|| values.unread_stream()) {
        return Err(DeclarationError::BodyNotRead { leaf: leaf.describe() });
    }

    let remaining_path = values.remaining_path().to_vec();
    let mut leaves = values.leaves.into_iter();

    match assemble_node(root, &mut leaves) {
        Ok(value) if leaves.next().is_none() => Ok(TypedResult::Value { value, remaining_path }),
        Ok(_) => Err(DeclarationError::ForeignValues),
        Err(Stop::Failed(failure)) => {
            debug!(leaf = %failure.node().describe(), reason = %failure.reason(), "assemble failed");
            Ok(TypedResult::Failure(failure))
        }
        Err(Stop::Defect(e)) => Err(e),
    }
}

fn assemble_node(node: &Node, leaves: &mut impl Iterator<Item = DecodedLeaf>) -> Result<AnyValue, Stop> {
    match node.kind() {
        NodeKind::Leaf(_) => match leaves.next() {
            Some(DecodedLeaf { node: decoded, value: Some(value), .. }) if decoded.ptr_eq(node) => Ok(value),
            Some(DecodedLeaf { node: decoded, value: None, .. }) => {
                Err(DeclarationError::BodyNotRead { leaf: decoded.describe() }.into())
            }
            _ => Err(DeclarationError::ForeignValues.into()),
        },
        NodeKind::Pair { left, right, combine, .. } => {
            let left = assemble_node(left, leaves)?;
            let right = assemble_node(right, leaves)?;
            Ok(combine(left, right)?)
        }
        NodeKind::Mapped { inner, to, .. } => {
            let value = assemble_node(inner, leaves)?;
            match to(value)? {
                Ok(mapped) => Ok(mapped),
                Err(e) => Err(Failure::new(node.clone(), e.into()).into()),
            }
        }
    }
}
