use http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::{error::ProtocolError, parser::encoding::percent_decode_utf8};

/// Parsed `Content-Disposition` metadata for a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type, lowercased (typically `form-data`).
    pub disposition: String,
    /// The `name` parameter.
    pub name: Option<String>,
    /// The `filename*` parameter when present, else `filename`.
    pub filename: Option<String>,
}

/// Header model for one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPartHeaders {
    /// Raw part headers.
    pub raw: HeaderMap,
    /// Parsed disposition, when the part carried one.
    pub content_disposition: Option<ContentDisposition>,
    /// Form field name.
    pub field_name: Option<String>,
    /// Client-declared file name.
    pub file_name: Option<String>,
    /// Part content type, `application/octet-stream` when absent.
    pub content_type: mime::Mime,
}

/// Parses a `CRLF`-separated header block (without the terminating blank line).
pub fn parse_header_block(raw: &[u8]) -> Result<HeaderMap, ProtocolError> {
    let text = std::str::from_utf8(raw).map_err(|_| ProtocolError::new("part headers must be UTF-8"))?;
    let mut headers = HeaderMap::new();

    for line in text.split("\r\n").filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::new(format!("invalid part header line `{line}`")))?;

        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| ProtocolError::new(format!("invalid part header name `{}`", name.trim())))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| ProtocolError::new(format!("invalid value for part header `{name}`")))?;
        headers.append(name, value);
    }

    Ok(headers)
}

/// Builds the part header model from a raw header map.
///
/// A missing `Content-Disposition` yields a part with neither field nor file
/// name; a present but malformed one is an error.
pub fn parse_part_headers(raw: HeaderMap) -> Result<ParsedPartHeaders, ProtocolError> {
    let content_disposition = header_utf8(&raw, header::CONTENT_DISPOSITION)?
        .map(parse_content_disposition)
        .transpose()?;
    let content_type = parse_part_content_type(header_str(&raw, header::CONTENT_TYPE)?)?;

    let (field_name, file_name) = match &content_disposition {
        Some(disposition) => (disposition.name.clone(), disposition.filename.clone()),
        None => (None, None),
    };

    Ok(ParsedPartHeaders {
        raw,
        content_disposition,
        field_name,
        file_name,
        content_type,
    })
}

/// Parses a part `Content-Disposition` value.
pub fn parse_content_disposition(value: &str) -> Result<ContentDisposition, ProtocolError> {
    let mut segments = split_params(value).into_iter();
    let disposition = segments
        .next()
        .map(|kind| kind.trim().to_ascii_lowercase())
        .filter(|kind| !kind.is_empty())
        .ok_or_else(|| ProtocolError::new("invalid Content-Disposition header"))?;

    let mut disposition = ContentDisposition {
        disposition,
        name: None,
        filename: None,
    };
    let mut extended_filename = None;

    for segment in segments.map(|segment| segment.trim()).filter(|s| !s.is_empty()) {
        let (key, raw_value) = segment
            .split_once('=')
            .ok_or_else(|| ProtocolError::new("invalid Content-Disposition parameter format"))?;
        let value = unquote(raw_value.trim())?;

        match key.trim().to_ascii_lowercase().as_str() {
            "name" => disposition.name = Some(value),
            "filename" => disposition.filename = Some(value),
            "filename*" => extended_filename = Some(decode_ext_value(&value)?),
            _ => {}
        }
    }

    if extended_filename.is_some() {
        disposition.filename = extended_filename;
    }
    Ok(disposition)
}

/// Parses a part-level `Content-Type`, defaulting to `application/octet-stream`.
pub fn parse_part_content_type(value: Option<&str>) -> Result<mime::Mime, ProtocolError> {
    match value.map(str::trim) {
        None => Ok(mime::APPLICATION_OCTET_STREAM),
        Some(raw) => raw
            .parse()
            .map_err(|_| ProtocolError::new(format!("invalid part Content-Type `{raw}`"))),
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Result<Option<&str>, ProtocolError> {
    headers
        .get(&name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ProtocolError::new(format!("part header `{name}` must be ASCII")))
        })
        .transpose()
}

/// Browsers send non-ASCII file names as raw UTF-8 in `Content-Disposition`.
fn header_utf8(headers: &HeaderMap, name: HeaderName) -> Result<Option<&str>, ProtocolError> {
    headers
        .get(&name)
        .map(|value| {
            std::str::from_utf8(value.as_bytes())
                .map_err(|_| ProtocolError::new(format!("part header `{name}` must be UTF-8")))
        })
        .transpose()
}

/// Strips surrounding quotes and resolves backslash escapes.
fn unquote(raw: &str) -> Result<String, ProtocolError> {
    let Some(inner) = raw.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) else {
        if raw.contains('"') {
            return Err(ProtocolError::new("invalid quoted parameter value"));
        }
        return Ok(raw.to_owned());
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push(
                chars
                    .next()
                    .ok_or_else(|| ProtocolError::new("dangling escape in quoted parameter"))?,
            ),
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Decodes an RFC 5987 `charset'language'value` parameter. Only UTF-8 is supported.
fn decode_ext_value(value: &str) -> Result<String, ProtocolError> {
    let mut pieces = value.splitn(3, '\'');
    let (Some(charset), Some(_language), Some(encoded)) = (pieces.next(), pieces.next(), pieces.next())
    else {
        return Err(ProtocolError::new("invalid filename* parameter encoding"));
    };

    if !charset.eq_ignore_ascii_case("utf-8") {
        return Err(ProtocolError::new("only UTF-8 filename* charset is supported"));
    }
    percent_decode_utf8(encoded, "filename*")
}

/// Splits on `;` outside of quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (index, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                segments.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    segments.push(&value[start..]);
    segments
}
