use crate::error::ProtocolError;

/// Percent-decodes `value` and requires the result to be UTF-8.
///
/// `what` names the decoded item in error messages.
pub(crate) fn percent_decode_utf8(value: &str, what: &str) -> Result<String, ProtocolError> {
    if !value.contains('%') {
        return Ok(value.to_owned());
    }

    let raw = value.as_bytes();
    let mut decoded = Vec::with_capacity(raw.len());
    let mut rest = raw;

    while let Some((&byte, tail)) = rest.split_first() {
        if byte != b'%' {
            decoded.push(byte);
            rest = tail;
            continue;
        }

        let [hi, lo, ..] = tail else {
            return Err(ProtocolError::new(format!("invalid percent-encoding in {what}")));
        };
        match (hex_digit(*hi), hex_digit(*lo)) {
            (Some(hi), Some(lo)) => decoded.push(hi << 4 | lo),
            _ => {
                return Err(ProtocolError::new(format!("invalid percent-encoding in {what}")));
            }
        }
        rest = &tail[2..];
    }

    String::from_utf8(decoded).map_err(|_| ProtocolError::new(format!("{what} is not valid UTF-8")))
}

fn hex_digit(byte: u8) -> Option<u8> {
    char::from(byte).to_digit(16).map(|digit| digit as u8)
}
