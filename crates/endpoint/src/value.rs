//! Type-erased values that flow through the node tree.
//!
//! The decode engine, the assembler and the encoder only ever see
//! [`AnyValue`]s. The typed façade in [`crate::io`] is what guarantees
//! every downcast lines up with the declared type.

use crate::failure::DeclarationError;
use std::any::{type_name, Any};
use std::fmt;

/// A value of some declared type, boxed so that heterogeneous leaves can
/// share one tree.
pub type AnyValue = Box<dyn Any + Send>;

/// Recovers a concrete value from an [`AnyValue`].
///
/// A failed downcast means the declaration and the value disagree, which no
/// request data can cause.
pub(crate) fn downcast<T: 'static>(value: AnyValue) -> Result<T, DeclarationError> {
    match value.downcast::<T>() {
        Ok(value) => Ok(*value),
        Err(_value) => Err(DeclarationError::TypeMismatch { expected: type_name::<T>() }),
    }
}

/// An opaque streaming body handle.
///
/// The core never reads from it: the request side hands it from the
/// [`RequestContext`](crate::context::RequestContext) to the user's input value,
/// the response side hands it from the user's output value to the backend.
pub struct StreamHandle {
    inner: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl StreamHandle {
    pub fn new<S: Send + 'static>(stream: S) -> Self {
        Self { inner: Box::new(stream), type_name: type_name::<S>() }
    }

    /// Name of the concrete stream type, used in mismatch reports.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the stream if it has type `S`, otherwise gives the handle back.
    pub fn downcast<S: Send + 'static>(self) -> Result<S, StreamHandle> {
        let type_name = self.type_name;
        match self.inner.downcast::<S>() {
            Ok(stream) => Ok(*stream),
            Err(inner) => Err(StreamHandle { inner, type_name }),
        }
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamHandle").field(&self.type_name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_recovers_value() {
        let value: AnyValue = Box::new((42_i32, "x".to_string()));
        let (n, s) = downcast::<(i32, String)>(value).unwrap();
        assert_eq!(n, 42);
        assert_eq!(s, "x");
    }

    #[test]
    fn downcast_to_wrong_type_is_declaration_error() {
        let value: AnyValue = Box::new(1_u8);
        let err = downcast::<String>(value).unwrap_err();
        assert!(matches!(err, DeclarationError::TypeMismatch { expected } if expected.contains("String")));
    }

    #[test]
    fn stream_handle_gives_itself_back_on_mismatch() {
        let handle = StreamHandle::new(vec![1_u8, 2, 3]);
        let handle = handle.downcast::<String>().unwrap_err();
        assert!(handle.type_name().contains("Vec"));
        assert_eq!(handle.downcast::<Vec<u8>>().unwrap(), vec![1, 2, 3]);
    }
}
