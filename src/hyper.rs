//! Hyper integration helpers.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body_util::BodyExt;
use hyper::{header, Request};

use crate::{ProtocolError, UploadError};

/// Hyper body stream mapped into the reader's chunk type.
pub type HyperBodyBoxStream =
    Pin<Box<dyn Stream<Item = Result<Bytes, UploadError>> + Send + 'static>>;

/// Returns the raw `Content-Type` header of a request, if present.
pub fn content_type_from_request<B>(request: &Request<B>) -> Result<Option<&str>, ProtocolError> {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ProtocolError::new("Content-Type header must be ASCII"))
        })
        .transpose()
}

/// Maps a Hyper body into the chunk stream consumed by [`crate::Multipart`].
///
/// Body errors (for example a client disconnecting mid-upload) become
/// [`ProtocolError`]s.
pub fn map_body_stream<B>(body: B) -> HyperBodyBoxStream
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: std::fmt::Display,
{
    Box::pin(body.into_data_stream().map(|item| {
        item.map_err(|err| ProtocolError::new(format!("request body stream error: {err}")).into())
    }))
}
