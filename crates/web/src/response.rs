//! Materialisation of encoded outputs into [`http::Response`]s.

use crate::body::{BodyStream, ResponseBody};
use crate::error::WebError;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use micro_endpoint::{OutputBody, OutputValues};

const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";

/// Builds the response for `output`, using `default_status` when no status
/// leaf set one.
///
/// `Content-Type` comes from the body codec unless a header leaf set it.
pub fn into_response(output: OutputValues, default_status: StatusCode) -> Result<Response<ResponseBody>, WebError> {
    let status = output.status_or(default_status);
    let (_, headers, body) = output.into_parts();

    let (body, format) = match body {
        None => (ResponseBody::empty(), None),
        Some(OutputBody::Bytes { bytes, format }) => (ResponseBody::once(bytes), Some(format)),
        Some(OutputBody::Stream { stream, format }) => {
            let type_name = stream.type_name();
            let stream = stream.downcast::<BodyStream>().map_err(|_stream| WebError::UnsupportedStream { type_name })?;
            (ResponseBody::from(stream), Some(format))
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;

    let response_headers = response.headers_mut();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| WebError::invalid_header(&name, e))?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| WebError::invalid_header(&name, e))?;
        response_headers.append(header_name, header_value);
    }

    if let Some(format) = format
        && !response_headers.contains_key(CONTENT_TYPE)
    {
        let content_type =
            HeaderValue::from_str(format.as_str()).map_err(|e| WebError::invalid_header(CONTENT_TYPE, e))?;
        response_headers.insert(CONTENT_TYPE, content_type);
    }

    Ok(response)
}

/// A plain-text response.
pub fn text_response<S: Into<String>>(status: StatusCode, message: S) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::from(message.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF_8));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use micro_endpoint::io::{fixed_header, header, json_body, status, status_code, stream_body, string_body};
    use micro_endpoint::CodecFormat;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Item {
        id: u32,
    }

    async fn body_bytes(response: Response<ResponseBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn content_type_from_codec() {
        let output = json_body::<Item>().encode((Item { id: 1 },)).unwrap();
        let response = into_response(output, StatusCode::OK).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_bytes(response).await, Bytes::from_static(br#"{"id":1}"#));
    }

    #[tokio::test]
    async fn explicit_content_type_wins() {
        let output = fixed_header("content-type", "text/html").and(string_body()).encode(("<p>hi</p>".into(),)).unwrap();
        let response = into_response(output, StatusCode::OK).unwrap();

        assert_eq!(response.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn status_leaf_overrides_default() {
        let output = status(StatusCode::CREATED).encode(()).unwrap();
        assert_eq!(into_response(output, StatusCode::OK).unwrap().status(), StatusCode::CREATED);

        let output = status_code().encode((StatusCode::CONFLICT,)).unwrap();
        assert_eq!(into_response(output, StatusCode::BAD_REQUEST).unwrap().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_header_value_is_an_error() {
        let output = header::<String>("x-note").encode(("line\nbreak".to_string(),)).unwrap();
        let err = into_response(output, StatusCode::OK).unwrap_err();
        assert!(matches!(err, WebError::InvalidHeader { name, .. } if name == "x-note"));
    }

    #[tokio::test]
    async fn body_stream_is_forwarded() {
        let stream: BodyStream = Full::new(Bytes::from_static(b"streamed"))
            .map_err(|never| -> crate::body::BoxError { match never {} })
            .boxed_unsync();
        let output = stream_body::<BodyStream>(CodecFormat::octet_stream()).encode((stream,)).unwrap();
        let response = into_response(output, StatusCode::OK).unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(body_bytes(response).await, Bytes::from_static(b"streamed"));
    }

    #[test]
    fn foreign_stream_type_is_rejected() {
        let output = stream_body::<Vec<u8>>(CodecFormat::octet_stream()).encode((vec![1],)).unwrap();
        let err = into_response(output, StatusCode::OK).unwrap_err();
        assert!(matches!(err, WebError::UnsupportedStream { .. }));
    }
}
