use crate::{error::ProtocolError, parser::encoding::percent_decode_utf8};

const ACCEPTED_TYPES: [&str; 2] = ["multipart/form-data", "multipart/mixed"];
const MAX_BOUNDARY_LEN: usize = 70;

/// Extracts and validates the `boundary` parameter from a `Content-Type` value.
///
/// Both `multipart/form-data` and `multipart/mixed` are accepted.
pub fn extract_multipart_boundary(content_type: &str) -> Result<String, ProtocolError> {
    let mime = content_type
        .parse::<mime::Mime>()
        .map_err(|_| ProtocolError::new(format!("invalid Content-Type header `{content_type}`")))?;

    let essence = mime.essence_str();
    if !ACCEPTED_TYPES.contains(&essence) {
        return Err(ProtocolError::new(format!(
            "request Content-Type `{essence}` isn't multipart/form-data"
        )));
    }

    let raw = mime
        .get_param(mime::BOUNDARY)
        .ok_or_else(|| ProtocolError::new("missing multipart boundary parameter"))?;
    let boundary = percent_decode_utf8(raw.as_str(), "multipart boundary")?;

    check_boundary(&boundary)?;
    Ok(boundary)
}

/// Applies the RFC 2046 `boundary` grammar.
fn check_boundary(boundary: &str) -> Result<(), ProtocolError> {
    let problem = if boundary.is_empty() {
        "cannot be empty"
    } else if boundary.len() > MAX_BOUNDARY_LEN {
        "cannot exceed 70 characters"
    } else if boundary.ends_with(' ') {
        "cannot end with whitespace"
    } else if !boundary.bytes().all(is_bchar) {
        "contains invalid characters"
    } else {
        return Ok(());
    };

    Err(ProtocolError::new(format!("multipart boundary {problem}")))
}

fn is_bchar(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&byte)
}
