/// Extracts the status code from the start of an HTTP/1.x response.
///
/// `HTTP/1.1 404 Not Found` yields `Some(404)`; anything that is not a status
/// line yields `None`.
pub fn parse_http_status(payload: &[u8]) -> Option<u16> {
    const PREFIX: &[u8] = b"HTTP/1.";
    if payload.len() < 12 || !payload.starts_with(PREFIX) || payload[8] != b' ' {
        return None;
    }

    let digits = &payload[9..12];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if payload.len() > 12 && !payload[12].is_ascii_whitespace() {
        return None;
    }

    let code = digits
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
    (100..=599).contains(&code).then_some(code)
}
