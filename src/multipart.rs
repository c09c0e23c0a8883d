use bytes::Bytes;
use futures::{future::poll_fn, Stream};

use crate::{
    error::{ProtocolError, UploadError},
    parser::{extract_multipart_boundary, stream::MultipartStream},
    part::Part,
};

/// Sequential multipart reader handing out one [`Part`] at a time.
///
/// A `Part` mutably borrows the reader, so the next part can only be
/// requested once the current one is closed or dropped.
#[derive(Debug)]
pub struct Multipart<S> {
    inner: MultipartStream<S>,
}

impl<S> Multipart<S> {
    /// Creates a reader from an already extracted boundary and a chunk source.
    pub fn new(boundary: impl Into<String>, stream: S) -> Result<Self, ProtocolError> {
        Ok(Self {
            inner: MultipartStream::new(boundary, stream)?,
        })
    }

    /// Creates a reader from a request `Content-Type` value.
    ///
    /// Fails when the header is absent, not multipart, or lacks a valid boundary.
    pub fn from_content_type(content_type: Option<&str>, stream: S) -> Result<Self, ProtocolError> {
        let content_type = content_type
            .ok_or_else(|| ProtocolError::new("request Content-Type isn't multipart/form-data"))?;
        Self::new(extract_multipart_boundary(content_type)?, stream)
    }
}

impl<S> Multipart<S>
where
    S: Stream<Item = Result<Bytes, UploadError>> + Unpin,
{
    /// Returns the next part, or `Ok(None)` after the closing boundary.
    pub async fn next_part(&mut self) -> Result<Option<Part<'_, S>>, UploadError> {
        let headers = poll_fn(|cx| self.inner.poll_next_part(cx)).await?;
        Ok(headers.map(|headers| Part::new(headers, &mut self.inner)))
    }
}
