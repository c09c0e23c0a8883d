use std::{
    pin::Pin,
    task::{ready, Context, Poll},
};

use bytes::{Buf, Bytes, BytesMut};
use futures::Stream;

use crate::{
    error::{ProtocolError, UploadError},
    parser::headers::{parse_header_block, parse_part_headers, ParsedPartHeaders},
};

/// Largest accepted header block for a single part.
pub const MAX_HEADER_BLOCK: usize = 16 * 1024;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Preamble,
    Headers,
    Body,
    End,
    Failed,
}

/// What follows `--boundary` on a boundary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryTail {
    /// Another part follows; the line (padding and CRLF) spans this many bytes.
    Next(usize),
    /// Closing `--`.
    Close,
    /// Not enough buffered input to decide.
    Undecided,
    /// The bytes are not a boundary line.
    NotBoundary,
}

/// Incremental multipart reader over a chunked byte stream.
///
/// Part bodies are handed out as they arrive, so memory use stays bounded by
/// one upstream chunk plus the delimiter length regardless of part size.
#[derive(Debug)]
pub struct MultipartStream<S> {
    stream: S,
    dash_boundary: Vec<u8>,
    delimiter: Vec<u8>,
    buffer: BytesMut,
    state: ParseState,
    at_body_start: bool,
    upstream_done: bool,
}

impl<S> MultipartStream<S> {
    /// Creates a reader for a known multipart boundary.
    pub fn new(boundary: impl Into<String>, stream: S) -> Result<Self, ProtocolError> {
        let boundary = boundary.into();
        if boundary.is_empty() {
            return Err(ProtocolError::new("multipart boundary cannot be empty"));
        }
        if boundary.contains(['\r', '\n']) {
            return Err(ProtocolError::new("multipart boundary cannot contain CRLF"));
        }

        let dash_boundary = format!("--{boundary}").into_bytes();
        let delimiter = [CRLF, dash_boundary.as_slice()].concat();

        Ok(Self {
            stream,
            dash_boundary,
            delimiter,
            buffer: BytesMut::new(),
            state: ParseState::Preamble,
            at_body_start: true,
            upstream_done: false,
        })
    }
}

impl<S> MultipartStream<S>
where
    S: Stream<Item = Result<Bytes, UploadError>> + Unpin,
{
    /// Advances to the next part and returns its headers.
    ///
    /// Any unread body of the current part is skipped first. `Ok(None)` marks
    /// the closing boundary.
    pub fn poll_next_part(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ParsedPartHeaders>, UploadError>> {
        loop {
            match self.state {
                ParseState::Preamble => {
                    if !self.scan_opening_boundary() {
                        ready!(self.poll_more(cx))?;
                    }
                }
                ParseState::Headers => match self.scan_headers() {
                    Ok(Some(headers)) => {
                        self.state = ParseState::Body;
                        return Poll::Ready(Ok(Some(headers)));
                    }
                    Ok(None) => ready!(self.poll_more(cx))?,
                    Err(err) => return Poll::Ready(Err(self.fail(err))),
                },
                ParseState::Body => {
                    // Skip what the consumer left unread.
                    ready!(self.poll_body_chunk(cx))?;
                }
                ParseState::End => return Poll::Ready(Ok(None)),
                ParseState::Failed => {
                    return Poll::Ready(Err(ProtocolError::new(
                        "multipart reader already failed",
                    )
                    .into()));
                }
            }
        }
    }

    /// Reads the next body chunk of the current part.
    ///
    /// `Ok(None)` marks the end of the part; the reader is then positioned at
    /// the next part's headers or at the end of the stream.
    pub fn poll_body_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<Bytes>, UploadError>> {
        loop {
            match self.state {
                ParseState::Body => {}
                ParseState::Failed => {
                    return Poll::Ready(Err(ProtocolError::new(
                        "multipart reader already failed",
                    )
                    .into()));
                }
                _ => return Poll::Ready(Ok(None)),
            }

            match self.scan_body() {
                BodyScan::Chunk(chunk) => return Poll::Ready(Ok(Some(chunk))),
                BodyScan::PartEnd => return Poll::Ready(Ok(None)),
                BodyScan::NeedMore => ready!(self.poll_more(cx))?,
            }
        }
    }

    /// Pulls one chunk from upstream into the buffer.
    fn poll_more(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), UploadError>> {
        if self.upstream_done {
            return Poll::Ready(Err(self.fail(UploadError::IncompleteStream)));
        }

        match ready!(Pin::new(&mut self.stream).poll_next(cx)) {
            Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
            Some(Err(err)) => return Poll::Ready(Err(self.fail(err))),
            None => self.upstream_done = true,
        }
        Poll::Ready(Ok(()))
    }
}

enum BodyScan {
    Chunk(Bytes),
    PartEnd,
    NeedMore,
}

impl<S> MultipartStream<S> {
    fn fail(&mut self, err: impl Into<UploadError>) -> UploadError {
        self.state = ParseState::Failed;
        self.buffer.clear();
        err.into()
    }

    /// Looks for the first boundary, discarding preamble text before it.
    fn scan_opening_boundary(&mut self) -> bool {
        let mut from = 0;
        loop {
            let start = if from == 0
                && self.at_body_start
                && self.buffer.starts_with(&self.dash_boundary)
            {
                Some(0)
            } else {
                find(&self.buffer[from..], &self.delimiter).map(|at| from + at + CRLF.len())
            };

            let Some(start) = start else {
                // Keep only what could be the start of a split delimiter.
                let keep = self.delimiter.len() - 1;
                if self.buffer.len() > keep {
                    self.buffer.advance(self.buffer.len() - keep);
                    self.at_body_start = false;
                }
                return false;
            };

            let tail_at = start + self.dash_boundary.len();
            match boundary_tail(&self.buffer[tail_at..]) {
                BoundaryTail::Next(len) => {
                    self.buffer.advance(tail_at + len);
                    self.state = ParseState::Headers;
                    return true;
                }
                BoundaryTail::Close => {
                    self.finish();
                    return true;
                }
                BoundaryTail::Undecided => {
                    // Keep the leading CRLF so the delimiter matches again.
                    let line_start = start.saturating_sub(CRLF.len());
                    if line_start > 0 {
                        self.buffer.advance(line_start);
                        self.at_body_start = false;
                    }
                    return false;
                }
                BoundaryTail::NotBoundary => from = tail_at,
            }
        }
    }

    fn scan_headers(&mut self) -> Result<Option<ParsedPartHeaders>, ProtocolError> {
        let block_len = if self.buffer.starts_with(CRLF) {
            Some(0)
        } else {
            find(&self.buffer, HEADER_END)
        };

        let Some(block_len) = block_len else {
            if self.buffer.len() > MAX_HEADER_BLOCK {
                return Err(ProtocolError::new(format!(
                    "part headers exceed {MAX_HEADER_BLOCK} bytes"
                )));
            }
            return Ok(None);
        };

        let terminator = if block_len == 0 { CRLF.len() } else { HEADER_END.len() };
        let block = self.buffer.split_to(block_len + terminator);
        let headers = parse_part_headers(parse_header_block(&block[..block_len])?)?;

        tracing::trace!(
            file_name = headers.file_name.as_deref().unwrap_or("<none>"),
            content_type = %headers.content_type,
            "multipart: part headers parsed"
        );
        Ok(Some(headers))
    }

    fn scan_body(&mut self) -> BodyScan {
        let Some(at) = find(&self.buffer, &self.delimiter) else {
            // A delimiter split across chunks starts at most `len - 1` bytes from the end.
            let safe = self.buffer.len().saturating_sub(self.delimiter.len() - 1);
            return if safe > 0 {
                BodyScan::Chunk(self.buffer.split_to(safe).freeze())
            } else {
                BodyScan::NeedMore
            };
        };

        if at > 0 {
            return BodyScan::Chunk(self.buffer.split_to(at).freeze());
        }

        match boundary_tail(&self.buffer[self.delimiter.len()..]) {
            BoundaryTail::Next(len) => {
                self.buffer.advance(self.delimiter.len() + len);
                self.state = ParseState::Headers;
                BodyScan::PartEnd
            }
            BoundaryTail::Close => {
                self.finish();
                BodyScan::PartEnd
            }
            BoundaryTail::Undecided => BodyScan::NeedMore,
            BoundaryTail::NotBoundary => {
                BodyScan::Chunk(self.buffer.split_to(self.delimiter.len()).freeze())
            }
        }
    }

    /// Closing boundary seen; the epilogue is never read.
    fn finish(&mut self) {
        self.state = ParseState::End;
        self.buffer.clear();
    }
}

/// Classifies the bytes following `--boundary`.
fn boundary_tail(tail: &[u8]) -> BoundaryTail {
    match tail {
        [b'-', b'-', ..] => return BoundaryTail::Close,
        [b'-'] => return BoundaryTail::Undecided,
        _ => {}
    }

    let padding = tail.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
    match &tail[padding..] {
        [] | [b'\r'] => BoundaryTail::Undecided,
        [b'\r', b'\n', ..] => BoundaryTail::Next(padding + CRLF.len()),
        _ => BoundaryTail::NotBoundary,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
