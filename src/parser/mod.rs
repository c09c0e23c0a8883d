/// Multipart boundary parsing helpers.
pub mod boundary;
mod encoding;
/// Multipart part header parsing helpers.
pub mod headers;
/// Streaming multipart reader state machine.
pub mod stream;

pub use boundary::extract_multipart_boundary;
pub use headers::{
    parse_content_disposition, parse_header_block, parse_part_content_type, parse_part_headers,
    ContentDisposition, ParsedPartHeaders,
};
pub use stream::{MultipartStream, MAX_HEADER_BLOCK};
