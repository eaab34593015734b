use crate::codec::{Codec, DecodeResult, EncodeError};
use crate::context::QueryParams;
use crate::failure::Reason;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Deserializes the whole query string into a struct with `serde_qs`.
pub struct QueryStruct<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> QueryStruct<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for QueryStruct<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for QueryStruct<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryStruct<{}>", type_name::<T>())
    }
}

impl<T> Codec<QueryParams> for QueryStruct<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn decode(&self, raw: QueryParams) -> DecodeResult<T> {
        let query = raw.to_query_string();
        serde_qs::from_str::<T>(&query).map_err(|e| Reason::error(&query, e))
    }

    fn encode(&self, value: T) -> Result<QueryParams, EncodeError> {
        let query = serde_qs::to_string(&value).map_err(EncodeError::new)?;
        QueryParams::parse(&query).map_err(EncodeError::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Paging {
        page: u32,
        size: Option<u32>,
    }

    #[test]
    fn decodes_struct_from_all_params() {
        let codec = QueryStruct::<Paging>::new();
        let params = QueryParams::from_pairs([("page", "2"), ("size", "50")]);
        assert_eq!(codec.decode(params), Ok(Paging { page: 2, size: Some(50) }));
    }

    #[test]
    fn missing_field_is_decode_error() {
        let codec = QueryStruct::<Paging>::new();
        let reason = codec.decode(QueryParams::from_pairs([("size", "50")])).unwrap_err();
        assert!(matches!(reason, Reason::Error { .. }));
    }

    #[test]
    fn encodes_back_to_pairs() {
        let codec = QueryStruct::<Paging>::new();
        let params = codec.encode(Paging { page: 1, size: Some(10) }).unwrap();
        assert_eq!(params.get_all("page"), vec!["1".to_string()]);
        assert_eq!(params.get_all("size"), vec!["10".to_string()]);
    }
}
