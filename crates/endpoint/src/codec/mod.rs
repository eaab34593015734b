//! Conversions between raw wire representations and typed values.
//!
//! A [`Codec<L>`] is generic over its low-level representation `L`, which
//! is fixed by the leaf it is attached to:
//!
//! | leaf                       | `L`              |
//! |----------------------------|------------------|
//! | path parameter             | `String`         |
//! | remaining path segments    | `Vec<String>`    |
//! | query parameter, header    | `Vec<String>`    |
//! | all query parameters       | [`QueryParams`]  |
//! | body                       | `Bytes`          |
//! | streaming body             | [`StreamHandle`] |
//! | dynamic status code        | `StatusCode`     |
//!
//! Query parameters and headers always see every matching value, possibly
//! none. Whether zero values are acceptable is decided by the codec alone:
//! [`Single`] reports [`Reason::Missing`](crate::Reason::Missing),
//! [`Optional`] yields `None`, [`Repeated`] yields an empty `Vec`.
//!
//! [`QueryParams`]: crate::context::QueryParams
//! [`StreamHandle`]: crate::StreamHandle

mod body;
mod params;
mod text;

pub use body::{BytesBody, Form, Json, Stream, Utf8};
pub use params::QueryStruct;
pub use text::{Optional, Repeated, Segments, Single, Text};

use crate::failure::Reason;
use http::StatusCode;
use mime::Mime;
use thiserror::Error;

/// Outcome of decoding one raw value: the typed value or the reason it was rejected.
pub type DecodeResult<T> = Result<T, Reason>;

/// A codec could not produce a raw representation for a value.
///
/// This is an invariant violation of the codec, the encoder reports it as a
/// [`DeclarationError`](crate::DeclarationError).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct EncodeError {
    reason: String,
}

impl EncodeError {
    pub fn new<S: ToString>(reason: S) -> Self {
        Self { reason: reason.to_string() }
    }
}

/// Bidirectional converter between a raw representation `L` and a typed value.
pub trait Codec<L>: Send + Sync + 'static {
    type Value: Send + 'static;

    fn decode(&self, raw: L) -> DecodeResult<Self::Value>;

    fn encode(&self, value: Self::Value) -> Result<L, EncodeError>;

    /// Media type of the raw representation. Only body codecs make real use of it.
    fn format(&self) -> CodecFormat {
        CodecFormat::text_plain()
    }
}

/// The media type a codec reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecFormat(Mime);

impl CodecFormat {
    pub fn new(mime: Mime) -> Self {
        Self(mime)
    }

    pub fn text_plain() -> Self {
        Self(mime::TEXT_PLAIN_UTF_8)
    }

    pub fn json() -> Self {
        Self(mime::APPLICATION_JSON)
    }

    pub fn form() -> Self {
        Self(mime::APPLICATION_WWW_FORM_URLENCODED)
    }

    pub fn octet_stream() -> Self {
        Self(mime::APPLICATION_OCTET_STREAM)
    }

    pub fn mime(&self) -> &Mime {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

/// Passthrough codec for the dynamic status-code slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Status;

impl Codec<StatusCode> for Status {
    type Value = StatusCode;

    fn decode(&self, raw: StatusCode) -> DecodeResult<StatusCode> {
        Ok(raw)
    }

    fn encode(&self, value: StatusCode) -> Result<StatusCode, EncodeError> {
        Ok(value)
    }
}
