use std::{
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::{future::poll_fn, Stream, StreamExt};

use crate::{
    error::UploadError,
    parser::{headers::ParsedPartHeaders, stream::MultipartStream},
};

/// One multipart part whose body is read from the request as it arrives.
///
/// The body can be read once. Dropping a part without reading it to the end is
/// fine; the reader skips the rest before yielding the next part.
#[derive(Debug)]
pub struct Part<'a, S> {
    headers: ParsedPartHeaders,
    reader: &'a mut MultipartStream<S>,
    done: bool,
}

impl<'a, S> Part<'a, S> {
    pub(crate) fn new(headers: ParsedPartHeaders, reader: &'a mut MultipartStream<S>) -> Self {
        Self {
            headers,
            reader,
            done: false,
        }
    }

    /// Returns the client-declared file name, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.headers.file_name.as_deref()
    }

    /// Returns the form field name, if any.
    pub fn field_name(&self) -> Option<&str> {
        self.headers.field_name.as_deref()
    }

    /// Returns the part content type.
    pub fn content_type(&self) -> &mime::Mime {
        &self.headers.content_type
    }

    /// Returns the parsed part headers.
    pub fn headers(&self) -> &ParsedPartHeaders {
        &self.headers
    }
}

impl<S> Part<'_, S>
where
    S: Stream<Item = Result<Bytes, UploadError>> + Unpin,
{
    /// Reads the next body chunk, `Ok(None)` at the end of the part.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, UploadError> {
        poll_fn(|cx| self.poll_chunk(cx)).await
    }

    /// Discards any unread body and releases the part.
    pub async fn close(mut self) -> Result<(), UploadError> {
        while let Some(chunk) = self.next().await {
            chunk?;
        }
        Ok(())
    }

    fn poll_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<Bytes>, UploadError>> {
        if self.done {
            return Poll::Ready(Ok(None));
        }

        let polled = self.reader.poll_body_chunk(cx);
        if matches!(polled, Poll::Ready(Ok(None) | Err(_))) {
            self.done = true;
        }
        polled
    }
}

impl<S> Stream for Part<'_, S>
where
    S: Stream<Item = Result<Bytes, UploadError>> + Unpin,
{
    type Item = Result<Bytes, UploadError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_chunk(cx).map(Result::transpose)
    }
}
