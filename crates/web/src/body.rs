use crate::error::WebError;
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Mutex;
use tracing::trace;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A boxed body stream, handed to streaming body leaves in both directions.
pub type BodyStream = UnsyncBoxBody<Bytes, BoxError>;

/// The request body, read at most once and shared between every endpoint a
/// request is tried against.
///
/// The first [`bytes`](RequestBody::bytes) collects the stream, later calls
/// return the same bytes.
#[derive(Clone)]
pub struct RequestBody {
    inner: Arc<Mutex<State>>,
}

enum State {
    Unread(BodyStream),
    Read(Bytes),
    Taken,
}

impl RequestBody {
    pub fn new<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self::from_state(State::Unread(body.map_err(Into::into).boxed_unsync()))
    }

    pub fn empty() -> Self {
        Self::from_state(State::Read(Bytes::new()))
    }

    fn from_state(state: State) -> Self {
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    /// Collects the whole body, or returns the bytes collected earlier.
    pub async fn bytes(&self) -> Result<Bytes, WebError> {
        let mut guard = self.inner.lock().await;
        match std::mem::replace(&mut *guard, State::Taken) {
            State::Unread(stream) => {
                let bytes = stream.collect().await.map_err(WebError::read_body)?.to_bytes();
                trace!(len = bytes.len(), "request body collected");
                *guard = State::Read(bytes.clone());
                Ok(bytes)
            }
            State::Read(bytes) => {
                *guard = State::Read(bytes.clone());
                Ok(bytes)
            }
            State::Taken => Err(WebError::BodyConsumed),
        }
    }

    /// The collected bytes, if [`bytes`](RequestBody::bytes) already ran.
    pub fn try_bytes(&self) -> Option<Bytes> {
        let guard = self.inner.try_lock().ok()?;
        match &*guard {
            State::Read(bytes) => Some(bytes.clone()),
            State::Unread(_) | State::Taken => None,
        }
    }

    /// Hands out the raw stream, once.
    ///
    /// If the body was already collected the stream replays the bytes.
    pub fn take_stream(&self) -> Option<BodyStream> {
        let mut guard = self.inner.try_lock().ok()?;
        match std::mem::replace(&mut *guard, State::Taken) {
            State::Unread(stream) => Some(stream),
            State::Read(bytes) => {
                *guard = State::Read(bytes.clone());
                Some(Full::new(bytes).map_err(|never: Infallible| -> BoxError { match never {} }).boxed_unsync())
            }
            State::Taken => None,
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.try_lock().as_deref() {
            Ok(State::Unread(_)) => "unread",
            Ok(State::Read(_)) => "read",
            Ok(State::Taken) => "taken",
            Err(_) => "locked",
        };
        f.debug_struct("RequestBody").field("state", &state).finish()
    }
}

pub struct ResponseBody {
    inner: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Stream(BodyStream),
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Kind::Once(Some(bytes)) } }
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes, Error = BoxError> + Send + 'static,
    {
        Self { inner: Kind::Stream(UnsyncBoxBody::new(body)) }
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<BodyStream> for ResponseBody {
    fn from(stream: BodyStream) -> Self {
        Self { inner: Kind::Stream(stream) }
    }
}

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().inner {
            Kind::Once(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream(box_body) => Pin::new(box_body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Once(option_bytes) => option_bytes.is_none(),
            Kind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Stream(box_body) => box_body.size_hint(),
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(bytes) => f.debug_tuple("Once").field(bytes).finish(),
            Kind::Stream(_) => f.debug_tuple("Stream").finish_non_exhaustive(),
        }
    }
}
