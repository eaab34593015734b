//! Codecs for textual values: path segments, query parameters and headers.

use crate::codec::{Codec, DecodeResult, EncodeError};
use crate::failure::Reason;
use std::any::type_name;
use std::fmt;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

/// Parses one string with [`FromStr`] and renders it back with [`Display`].
///
/// A value that does not parse is a [`Reason::Mismatch`] naming the target type.
pub struct Text<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Text<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for Text<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Text<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text<{}>", type_name::<T>())
    }
}

impl<T> Codec<String> for Text<T>
where
    T: FromStr + Display + Send + 'static,
{
    type Value = T;

    fn decode(&self, raw: String) -> DecodeResult<T> {
        match raw.parse::<T>() {
            Ok(value) => Ok(value),
            Err(_parse_error) => Err(Reason::mismatch(type_name::<T>(), raw)),
        }
    }

    fn encode(&self, value: T) -> Result<String, EncodeError> {
        Ok(value.to_string())
    }
}

/// Exactly one value out of a list: none is `Missing`, more than one is `Multiple`.
#[derive(Debug, Clone, Default)]
pub struct Single<C>(pub C);

impl<C: Codec<String>> Codec<Vec<String>> for Single<C> {
    type Value = C::Value;

    fn decode(&self, mut raw: Vec<String>) -> DecodeResult<C::Value> {
        match raw.len() {
            0 => Err(Reason::Missing),
            1 => self.0.decode(raw.remove(0)),
            found => Err(Reason::multiple(found)),
        }
    }

    fn encode(&self, value: C::Value) -> Result<Vec<String>, EncodeError> {
        Ok(vec![self.0.encode(value)?])
    }
}

/// At most one value out of a list; absence decodes to `None`.
#[derive(Debug, Clone, Default)]
pub struct Optional<C>(pub C);

impl<C: Codec<String>> Codec<Vec<String>> for Optional<C> {
    type Value = Option<C::Value>;

    fn decode(&self, mut raw: Vec<String>) -> DecodeResult<Option<C::Value>> {
        match raw.len() {
            0 => Ok(None),
            1 => self.0.decode(raw.remove(0)).map(Some),
            found => Err(Reason::multiple(found)),
        }
    }

    fn encode(&self, value: Option<C::Value>) -> Result<Vec<String>, EncodeError> {
        value.map(|v| self.0.encode(v)).into_iter().collect()
    }
}

/// Every value of a list, possibly none. The first element that fails to
/// decode rejects the whole list.
#[derive(Debug, Clone, Default)]
pub struct Repeated<C>(pub C);

impl<C: Codec<String>> Codec<Vec<String>> for Repeated<C> {
    type Value = Vec<C::Value>;

    fn decode(&self, raw: Vec<String>) -> DecodeResult<Vec<C::Value>> {
        raw.into_iter().map(|value| self.0.decode(value)).collect()
    }

    fn encode(&self, value: Vec<C::Value>) -> Result<Vec<String>, EncodeError> {
        value.into_iter().map(|v| self.0.encode(v)).collect()
    }
}

/// The remaining path segments as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segments;

impl Codec<Vec<String>> for Segments {
    type Value = Vec<String>;

    fn decode(&self, raw: Vec<String>) -> DecodeResult<Vec<String>> {
        Ok(raw)
    }

    fn encode(&self, value: Vec<String>) -> Result<Vec<String>, EncodeError> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn text_parses_and_renders() {
        let codec = Text::<i32>::new();
        assert_eq!(codec.decode("42".into()), Ok(42));
        assert_eq!(codec.encode(-7), Ok("-7".to_string()));
    }

    #[test]
    fn text_rejects_with_mismatch() {
        let codec = Text::<i32>::new();
        assert_eq!(codec.decode("abc".into()), Err(Reason::mismatch("i32", "abc")));
    }

    #[test]
    fn single_requires_exactly_one() {
        let codec = Single(Text::<u8>::new());
        assert_eq!(codec.decode(vec![]), Err(Reason::Missing));
        assert_eq!(codec.decode(strings(&["1"])), Ok(1));
        assert_eq!(codec.decode(strings(&["1", "2"])), Err(Reason::multiple(2)));
    }

    #[test]
    fn optional_tolerates_absence() {
        let codec = Optional(Text::<String>::new());
        assert_eq!(codec.decode(vec![]), Ok(None));
        assert_eq!(codec.decode(strings(&["asc"])), Ok(Some("asc".to_string())));
        assert_eq!(codec.decode(strings(&["asc", "desc"])), Err(Reason::multiple(2)));

        assert_eq!(codec.encode(None), Ok(vec![]));
        assert_eq!(codec.encode(Some("asc".into())), Ok(strings(&["asc"])));
    }

    #[test]
    fn repeated_collects_all_or_fails_on_first() {
        let codec = Repeated(Text::<u32>::new());
        assert_eq!(codec.decode(vec![]), Ok(vec![]));
        assert_eq!(codec.decode(strings(&["1", "2", "3"])), Ok(vec![1, 2, 3]));
        assert_eq!(codec.decode(strings(&["1", "x", "y"])), Err(Reason::mismatch("u32", "x")));
    }
}
