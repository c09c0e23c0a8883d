#![allow(missing_docs)]

use http::{header, HeaderMap, HeaderValue};
use incoming::parser::headers::{
    parse_content_disposition, parse_header_block, parse_part_content_type, parse_part_headers,
};

#[test]
fn parses_content_disposition_name_and_filename() {
    let parsed = parse_content_disposition("form-data; name=\"file\"; filename=\"notes.txt\"")
        .expect("header should parse");

    assert_eq!(parsed.disposition, "form-data");
    assert_eq!(parsed.name.as_deref(), Some("file"));
    assert_eq!(parsed.filename.as_deref(), Some("notes.txt"));
}

#[test]
fn parses_escaped_quoted_values_and_semicolons() {
    let parsed =
        parse_content_disposition("form-data; name=\"fi\\\"eld\"; filename=\"a;b\\\\c.txt\"")
            .expect("header should parse");

    assert_eq!(parsed.name.as_deref(), Some("fi\"eld"));
    assert_eq!(parsed.filename.as_deref(), Some("a;b\\c.txt"));
}

#[test]
fn keeps_directory_segments_in_filename() {
    let parsed = parse_content_disposition("form-data; name=\"file\"; filename=\"../up/x.bin\"")
        .expect("header should parse");
    assert_eq!(parsed.filename.as_deref(), Some("../up/x.bin"));
}

#[test]
fn keeps_percent_signs_in_filename_verbatim() {
    let parsed =
        parse_content_disposition("form-data; name=\"file\"; filename=\"hello%20world.txt\"")
            .expect("header should parse");
    assert_eq!(parsed.filename.as_deref(), Some("hello%20world.txt"));
}

#[test]
fn filename_star_takes_precedence_over_filename() {
    let parsed = parse_content_disposition(
        "form-data; name=\"file\"; filename*=UTF-8''r%C3%A9sum%C3%A9.txt; filename=\"fallback.txt\"",
    )
    .expect("header should parse");

    assert_eq!(parsed.filename.as_deref(), Some("résumé.txt"));
}

#[test]
fn rejects_non_utf8_filename_star_charset() {
    let err = parse_content_disposition("form-data; filename*=ISO-8859-1''caf%E9.txt")
        .expect_err("must fail");
    assert_err_contains(&err.to_string(), "UTF-8");
}

#[test]
fn rejects_malformed_content_disposition() {
    let err = parse_content_disposition("form-data; name").expect_err("must fail");
    assert_err_contains(&err.to_string(), "parameter format");
}

#[test]
fn accepts_lone_percent_sign_in_filename() {
    let parsed = parse_content_disposition("form-data; name=\"file\"; filename=\"100%.txt\"")
        .expect("header should parse");
    assert_eq!(parsed.filename.as_deref(), Some("100%.txt"));
}

#[test]
fn rejects_malformed_percent_encoding_in_filename_star() {
    let err = parse_content_disposition("form-data; filename*=UTF-8''bad%2")
        .expect_err("must fail");
    assert_err_contains(&err.to_string(), "percent-encoding");
}

#[test]
fn part_headers_accept_raw_utf8_filename() {
    let headers = parse_header_block(
        "Content-Disposition: form-data; name=\"file\"; filename=\"résumé.pdf\"".as_bytes(),
    )
    .expect("block should parse");

    let parsed = parse_part_headers(headers).expect("part headers should parse");
    assert_eq!(parsed.file_name.as_deref(), Some("résumé.pdf"));
}

#[test]
fn defaults_part_content_type_to_octet_stream() {
    let mime = parse_part_content_type(None).expect("default MIME should parse");
    assert_eq!(mime.essence_str(), "application/octet-stream");
}

#[test]
fn rejects_invalid_part_content_type() {
    let err = parse_part_content_type(Some("not-a/type?")).expect_err("must fail");
    assert_err_contains(&err.to_string(), "invalid part Content-Type");
}

#[test]
fn parse_part_headers_extracts_core_values() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("form-data; name=\"file\"; filename=\"face.png\""),
    );
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));

    let parsed = parse_part_headers(headers).expect("part headers should parse");
    assert_eq!(parsed.field_name.as_deref(), Some("file"));
    assert_eq!(parsed.file_name.as_deref(), Some("face.png"));
    assert_eq!(parsed.content_type.essence_str(), "image/png");
}

#[test]
fn part_without_content_disposition_has_no_names() {
    let parsed = parse_part_headers(HeaderMap::new()).expect("headers should parse");
    assert!(parsed.content_disposition.is_none());
    assert!(parsed.field_name.is_none());
    assert!(parsed.file_name.is_none());
}

#[test]
fn parses_header_block_lines() {
    let headers = parse_header_block(
        b"Content-Disposition: form-data; name=\"a\"\r\nContent-Type:  text/plain  ",
    )
    .expect("block should parse");

    assert_eq!(headers.len(), 2);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"text/plain"[..])
    );
}

#[test]
fn rejects_header_line_without_colon() {
    let err = parse_header_block(b"Content-Disposition form-data").expect_err("must fail");
    assert_err_contains(&err.to_string(), "invalid part header line");
}

fn assert_err_contains(actual: &str, expected_fragment: &str) {
    assert!(
        actual.contains(expected_fragment),
        "expected `{actual}` to contain `{expected_fragment}`"
    );
}
