//! Body codecs.

use crate::codec::{Codec, CodecFormat, DecodeResult, EncodeError};
use crate::failure::Reason;
use crate::value::StreamHandle;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Reads the body as UTF-8 and hands the text to a string codec.
#[derive(Debug, Clone, Default)]
pub struct Utf8<C>(pub C);

impl<C: Codec<String>> Codec<Bytes> for Utf8<C> {
    type Value = C::Value;

    fn decode(&self, raw: Bytes) -> DecodeResult<C::Value> {
        match String::from_utf8(raw.to_vec()) {
            Ok(text) => self.0.decode(text),
            Err(e) => Err(Reason::error(String::from_utf8_lossy(&raw), e)),
        }
    }

    fn encode(&self, value: C::Value) -> Result<Bytes, EncodeError> {
        self.0.encode(value).map(Bytes::from)
    }

    fn format(&self) -> CodecFormat {
        CodecFormat::text_plain()
    }
}

/// The body bytes as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesBody;

impl Codec<Bytes> for BytesBody {
    type Value = Bytes;

    fn decode(&self, raw: Bytes) -> DecodeResult<Bytes> {
        Ok(raw)
    }

    fn encode(&self, value: Bytes) -> Result<Bytes, EncodeError> {
        Ok(value)
    }

    fn format(&self) -> CodecFormat {
        CodecFormat::octet_stream()
    }
}

/// `application/json` body via `serde_json`.
pub struct Json<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Json<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Json<{}>", type_name::<T>())
    }
}

impl<T> Codec<Bytes> for Json<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn decode(&self, raw: Bytes) -> DecodeResult<T> {
        serde_json::from_slice(&raw).map_err(|e| Reason::error(String::from_utf8_lossy(&raw), e))
    }

    fn encode(&self, value: T) -> Result<Bytes, EncodeError> {
        serde_json::to_vec(&value).map(Bytes::from).map_err(EncodeError::new)
    }

    fn format(&self) -> CodecFormat {
        CodecFormat::json()
    }
}

/// `application/x-www-form-urlencoded` body via `serde_urlencoded`.
pub struct Form<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Form<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for Form<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Form<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Form<{}>", type_name::<T>())
    }
}

impl<T> Codec<Bytes> for Form<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn decode(&self, raw: Bytes) -> DecodeResult<T> {
        serde_urlencoded::from_bytes(&raw).map_err(|e| Reason::error(String::from_utf8_lossy(&raw), e))
    }

    fn encode(&self, value: T) -> Result<Bytes, EncodeError> {
        serde_urlencoded::to_string(&value).map(Bytes::from).map_err(EncodeError::new)
    }

    fn format(&self) -> CodecFormat {
        CodecFormat::form()
    }
}

/// An opaque stream of type `S`, moved in and out of a [`StreamHandle`] untouched.
pub struct Stream<S> {
    format: CodecFormat,
    _marker: PhantomData<fn() -> S>,
}

impl<S> Stream<S> {
    pub fn new(format: CodecFormat) -> Self {
        Self { format, _marker: PhantomData }
    }
}

impl<S> fmt::Debug for Stream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream<{}>({})", type_name::<S>(), self.format.as_str())
    }
}

impl<S: Send + 'static> Codec<StreamHandle> for Stream<S> {
    type Value = S;

    fn decode(&self, raw: StreamHandle) -> DecodeResult<S> {
        raw.downcast::<S>().map_err(|handle| Reason::mismatch(type_name::<S>(), handle.type_name()))
    }

    fn encode(&self, value: S) -> Result<StreamHandle, EncodeError> {
        Ok(StreamHandle::new(value))
    }

    fn format(&self) -> CodecFormat {
        self.format.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Text;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        zip: String,
    }

    #[test]
    fn utf8_delegates_to_text_codec() {
        let codec = Utf8(Text::<u64>::new());
        assert_eq!(codec.decode(Bytes::from_static(b"42")), Ok(42));
        assert_eq!(codec.encode(42), Ok(Bytes::from_static(b"42")));
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        let codec = Utf8(Text::<String>::new());
        let reason = codec.decode(Bytes::from_static(&[0xff, 0xfe])).unwrap_err();
        assert!(matches!(reason, Reason::Error { .. }));
    }

    #[test]
    fn json_body() {
        let codec = Json::<User>::new();
        let user = codec.decode(Bytes::from_static(br#"{"name":"hello","zip":"world"}"#)).unwrap();
        assert_eq!(user, User { name: "hello".into(), zip: "world".into() });
        assert_eq!(codec.format(), CodecFormat::json());

        let reason = codec.decode(Bytes::from_static(b"{")).unwrap_err();
        assert!(matches!(reason, Reason::Error { original, .. } if original == "{"));
    }

    #[test]
    fn form_body() {
        let codec = Form::<User>::new();
        let user = codec.decode(Bytes::from_static(b"name=hello&zip=world")).unwrap();
        assert_eq!(user, User { name: "hello".into(), zip: "world".into() });
        assert_eq!(codec.encode(user), Ok(Bytes::from_static(b"name=hello&zip=world")));
    }

    #[test]
    fn stream_of_wrong_type_is_mismatch() {
        let codec = Stream::<Vec<u8>>::new(CodecFormat::octet_stream());
        let reason = codec.decode(StreamHandle::new("not a vec".to_string())).unwrap_err();
        assert!(matches!(reason, Reason::Mismatch { .. }));
    }
}
