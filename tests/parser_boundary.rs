#![allow(missing_docs)]

use incoming::parser::boundary::extract_multipart_boundary;

#[test]
fn extracts_boundary_from_content_type() {
    let boundary = extract_multipart_boundary("multipart/form-data; boundary=abc123")
        .expect("boundary should parse");
    assert_eq!(boundary, "abc123");
}

#[test]
fn extracts_quoted_boundary() {
    let boundary = extract_multipart_boundary("multipart/form-data; boundary=\"my-boundary\"")
        .expect("quoted boundary should parse");
    assert_eq!(boundary, "my-boundary");
}

#[test]
fn accepts_multipart_mixed() {
    let boundary = extract_multipart_boundary("multipart/mixed; boundary=mixed-1")
        .expect("mixed should be accepted");
    assert_eq!(boundary, "mixed-1");
}

#[test]
fn rejects_non_multipart_content_type() {
    let err = extract_multipart_boundary("application/json").expect_err("must fail");
    assert_err_contains(&err.to_string(), "isn't multipart/form-data");
}

#[test]
fn rejects_unparseable_content_type() {
    let err = extract_multipart_boundary("not a mime").expect_err("must fail");
    assert_err_contains(&err.to_string(), "invalid Content-Type");
}

#[test]
fn rejects_missing_boundary_parameter() {
    let err = extract_multipart_boundary("multipart/form-data").expect_err("must fail");
    assert_err_contains(&err.to_string(), "missing multipart boundary");
}

#[test]
fn rejects_invalid_boundary_characters() {
    let err = extract_multipart_boundary("multipart/form-data; boundary=\"abc@123\"")
        .expect_err("must fail");
    assert_err_contains(&err.to_string(), "invalid");
}

#[test]
fn rejects_boundary_that_is_too_long() {
    let header = format!("multipart/form-data; boundary={}", "a".repeat(71));
    let err = extract_multipart_boundary(&header).expect_err("must fail");
    assert_err_contains(&err.to_string(), "cannot exceed 70");
}

#[test]
fn rejects_boundary_with_trailing_space() {
    let err = extract_multipart_boundary("multipart/form-data; boundary=\"abc \"")
        .expect_err("must fail");
    assert_err_contains(&err.to_string(), "whitespace");
}

#[test]
fn decodes_percent_encoded_boundary() {
    let boundary = extract_multipart_boundary("multipart/form-data; boundary=abc%2D123")
        .expect("boundary should parse");
    assert_eq!(boundary, "abc-123");
}

#[test]
fn rejects_malformed_percent_encoding_in_boundary() {
    let err = extract_multipart_boundary("multipart/form-data; boundary=abc%2")
        .expect_err("must fail");
    assert_err_contains(&err.to_string(), "percent-encoding");
}

fn assert_err_contains(actual: &str, expected_fragment: &str) {
    assert!(
        actual.contains(expected_fragment),
        "expected `{actual}` to contain `{expected_fragment}`"
    );
}
