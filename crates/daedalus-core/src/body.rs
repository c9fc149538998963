//! Request and response bodies.
//!
//! A [`Body`] is either fully buffered or a stream of byte chunks. Buffered
//! bodies can be inspected any number of times; streams are consumed once.
//! Response validation never buffers a stream.

use std::fmt;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http_body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use thiserror::Error;

/// Boxed error type carried by streaming bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Type-erased `http_body::Body` handed to the transport.
pub type HttpBody = UnsyncBoxBody<Bytes, BoxError>;

/// An HTTP message body.
pub enum Body {
    /// A buffered body.
    Full(Bytes),
    /// A streamed body.
    Stream(HttpBody),
}

/// Errors raised while reading a body.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The underlying stream failed.
    #[error("failed to read body: {0}")]
    Read(#[source] BoxError),

    /// The body was taken out of the context earlier.
    #[error("body was already consumed")]
    Consumed,

    /// The body is not UTF-8 text.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl Body {
    /// An empty buffered body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Full(Bytes::new())
    }

    /// Wraps a stream of byte chunks.
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use daedalus_core::Body;
    ///
    /// let chunks = futures_util::stream::iter(vec![
    ///     Ok::<_, std::io::Error>(Bytes::from_static(b"hello ")),
    ///     Ok(Bytes::from_static(b"world")),
    /// ]);
    /// let body = Body::from_stream(chunks);
    /// assert!(body.is_stream());
    /// ```
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let frames = stream
            .map_ok(Frame::data)
            .map_err(|err: E| -> BoxError { err.into() });
        Self::Stream(StreamBody::new(frames).boxed_unsync())
    }

    /// Wraps any `http_body::Body`, such as hyper's incoming body.
    pub fn wrap<B>(body: B) -> Self
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self::Stream(body.map_err(|err| -> BoxError { err.into() }).boxed_unsync())
    }

    /// Returns `true` for streamed bodies.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Returns the bytes of a buffered body.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Full(bytes) => Some(bytes),
            Self::Stream(_) => None,
        }
    }

    /// Buffers the whole body.
    pub async fn collect(self) -> Result<Bytes, BodyError> {
        match self {
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(body) => body
                .collect()
                .await
                .map(http_body_util::Collected::to_bytes)
                .map_err(BodyError::Read),
        }
    }

    /// Converts into the boxed body type served over the wire.
    #[must_use]
    pub fn into_http(self) -> HttpBody {
        match self {
            Self::Full(bytes) => Full::new(bytes)
                .map_err(|never| match never {})
                .boxed_unsync(),
            Self::Stream(body) => body,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Full(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::Full(Bytes::from_static(text.as_bytes()))
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_full() {
        let body = Body::from("hello");
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_collect_stream() {
        let chunks = futures_util::stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"a")),
            Ok(Bytes::from_static(b"b")),
        ]);
        let body = Body::from_stream(chunks);
        assert!(body.is_stream());
        assert!(body.as_bytes().is_none());
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"ab"));
    }

    #[tokio::test]
    async fn test_stream_error_surfaces() {
        let chunks = futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"a")),
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "reset")),
        ]);
        let err = Body::from_stream(chunks).collect().await.unwrap_err();
        assert!(matches!(err, BodyError::Read(_)));
    }

    #[tokio::test]
    async fn test_into_http_round_trip() {
        let http = Body::from(vec![1u8, 2, 3]).into_http();
        let bytes = Body::wrap(http).collect().await.unwrap();
        assert_eq!(&bytes[..], &[1, 2, 3]);
    }

    #[test]
    fn test_debug_hides_content() {
        assert_eq!(format!("{:?}", Body::from("abc")), "Full(3)");
        assert_eq!(format!("{:?}", Body::empty()), "Full(0)");
    }
}
