//! Locating, splitting and decoding a response head.

use crate::error::{ErrorKind, ParseError};
use crate::headers::Headers;
use crate::message::ParsedMessage;

/// Where a head ends within the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeadEnd {
    /// Length of the status line and header lines, without the empty line.
    pub(crate) head_len: usize,
    /// Length including the empty line that terminates the head.
    pub(crate) consumed: usize,
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Finds the first `\r\n\r\n` or `\n\n`.
pub(crate) fn find_head_end(buf: &[u8]) -> Option<HeadEnd> {
    let crlf = find(buf, b"\r\n\r\n");
    // A bare LF terminator only wins if it comes before the CRLF one.
    let scope = match crlf {
        Some(pos) => &buf[..pos + 4],
        None => buf,
    };
    if let Some(pos) = find(scope, b"\n\n") {
        return Some(HeadEnd {
            head_len: pos + 1,
            consumed: pos + 2,
        });
    }
    crlf.map(|pos| HeadEnd {
        head_len: pos + 2,
        consumed: pos + 4,
    })
}

/// Checks a head without a terminator, or with one, against the limit.
pub(crate) fn check_head_size(
    buf: &[u8],
    limit: Option<usize>,
) -> Result<Option<HeadEnd>, ParseError> {
    let end = find_head_end(buf);
    let size = end.map(|end| end.consumed).unwrap_or_else(|| buf.len());
    match limit {
        Some(limit) if size > limit => Err(ParseError::new(
            ErrorKind::HeaderTooLarge,
            format!("header block exceeds {} bytes", limit),
        )),
        _ => Ok(end),
    }
}

/// Parses the status line and header lines of a head.
///
/// `head` runs up to, but not including, the terminating empty line.
pub(crate) fn parse_head(head: &[u8], trace: Vec<u8>) -> Result<ParsedMessage, ParseError> {
    let mut message = ParsedMessage {
        trace,
        ..ParsedMessage::default()
    };

    let line_end = head.iter().position(|&b| b == b'\n').unwrap_or(head.len());
    let (line, raw_headers) = head.split_at(line_end);
    let raw_headers = raw_headers.get(1..).unwrap_or(&[]);

    let (version, status, reason) = match parse_status_line(line) {
        Ok(parsed) => parsed,
        Err(err) => return Err(err.with_partial(Some(message))),
    };
    message.version = version;
    message.status = status;
    message.reason = reason;

    match decode_headers(raw_headers) {
        Ok(headers) => {
            message.headers = headers;
            Ok(message)
        }
        Err(err) => Err(err.with_partial(Some(message))),
    }
}

fn invalid_status_line(line: &[u8]) -> ParseError {
    ParseError::new(
        ErrorKind::InvalidStatusLine,
        format!("invalid status line: {:?}", String::from_utf8_lossy(line)),
    )
}

fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn split_digits(input: &[u8]) -> (&[u8], &[u8]) {
    let n = input.iter().take_while(|b| b.is_ascii_digit()).count();
    input.split_at(n)
}

/// `HTTP/<digits>.<digits> <3 digits>[ <reason>]`
pub(crate) fn parse_status_line(line: &[u8]) -> Result<(String, u16, String), ParseError> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let err = || invalid_status_line(line);

    let rest = line.strip_prefix(b"HTTP/").ok_or_else(err)?;
    let (major, rest) = split_digits(rest);
    let rest = rest.strip_prefix(b".").ok_or_else(err)?;
    let (minor, rest) = split_digits(rest);
    if major.is_empty() || minor.is_empty() {
        return Err(err());
    }

    let spaces = rest.iter().take_while(|&&b| is_space(b)).count();
    if spaces == 0 {
        return Err(err());
    }
    let rest = &rest[spaces..];
    let (code, rest) = split_digits(rest);
    if code.len() != 3 {
        return Err(err());
    }
    if !rest.is_empty() && !is_space(rest[0]) {
        return Err(err());
    }
    let reason = &rest[rest.iter().take_while(|&&b| is_space(b)).count()..];
    if reason.iter().any(|&b| (b < 0x20 && b != b'\t') || b == 0x7f) {
        return Err(err());
    }

    let status = code
        .iter()
        .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0'));
    if !(100..=599).contains(&status) {
        return Err(err());
    }

    let mut version = String::with_capacity(major.len() + 1 + minor.len());
    version.push_str(&String::from_utf8_lossy(major));
    version.push('.');
    version.push_str(&String::from_utf8_lossy(minor));

    let reason = std::str::from_utf8(reason).map_err(|_| err())?;

    Ok((version, status, reason.to_owned()))
}

/// Replaces obsolete line folding (a line break followed by spaces or tabs)
/// with a single space.
pub(crate) fn unfold(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let eol = match raw[i] {
            b'\r' if raw.get(i + 1) == Some(&b'\n') => 2,
            b'\n' => 1,
            _ => 0,
        };
        if eol > 0 && raw.get(i + eol).map_or(false, |&b| is_space(b)) {
            i += eol;
            while raw.get(i).map_or(false, |&b| is_space(b)) {
                i += 1;
            }
            out.push(b' ');
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

/// Decodes header lines. `raw` holds zero or more complete lines.
pub(crate) fn decode_headers(raw: &[u8]) -> Result<Headers, ParseError> {
    let mut block = unfold(raw);
    block.extend_from_slice(b"\r\n");

    let lines = block.iter().filter(|&&b| b == b'\n').count();
    let mut slots = vec![httparse::EMPTY_HEADER; lines];

    let invalid = |detail: &dyn std::fmt::Display| {
        ParseError::new(ErrorKind::InvalidHeaders, format!("invalid headers: {}", detail))
    };

    let parsed = match httparse::parse_headers(&block, &mut slots) {
        Ok(httparse::Status::Complete((used, parsed))) if used == block.len() => parsed,
        Ok(httparse::Status::Complete(_)) => return Err(invalid(&"trailing bytes")),
        Ok(httparse::Status::Partial) => return Err(invalid(&"unterminated field")),
        Err(err) => return Err(invalid(&err)),
    };

    let mut headers = Headers::new();
    for header in parsed {
        let value = std::str::from_utf8(header.value).map_err(|err| invalid(&err))?;
        headers.append(header.name, value.trim_end_matches(|c| c == ' ' || c == '\t'));
    }
    Ok(headers)
}

/// The headers that decide how a body is framed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FlowControl<'a> {
    pub(crate) chunked: bool,
    pub(crate) content_length: &'a [String],
}

impl<'a> FlowControl<'a> {
    /// Any `Transfer-Encoding` except a lone `identity` selects chunked
    /// decoding.
    pub(crate) fn from_headers(headers: &'a Headers) -> Self {
        let encodings = headers.get_all("Transfer-Encoding");
        let chunked = match encodings {
            [] => false,
            [only] => !only.trim().eq_ignore_ascii_case("identity"),
            _ => true,
        };
        FlowControl {
            chunked,
            content_length: headers.get_all("Content-Length"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_end_crlf_and_lf() {
        assert_eq!(
            find_head_end(b"HTTP/1.1 200 OK\r\n\r\nbody"),
            Some(HeadEnd {
                head_len: 17,
                consumed: 19
            })
        );
        assert_eq!(
            find_head_end(b"HTTP/1.1 200 OK\n\nbody"),
            Some(HeadEnd {
                head_len: 16,
                consumed: 17
            })
        );
        assert_eq!(find_head_end(b"HTTP/1.1 200 OK\r\n"), None);
    }

    #[test]
    fn head_end_takes_first_terminator() {
        let end = find_head_end(b"A\n\nB\r\n\r\n").unwrap();
        assert_eq!(end.consumed, 3);
    }

    #[test]
    fn head_end_ignores_terminators_of_later_messages() {
        let end = find_head_end(b"HTTP/1.1 204 No Content\r\n\r\nHTTP/1.1 200 OK\n\n").unwrap();
        assert_eq!(end.consumed, 27);
        let end = find_head_end(b"A\r\nB\n\nC\r\n\r\n").unwrap();
        assert_eq!(end.consumed, 6);
    }

    #[test]
    fn status_lines() {
        let (version, status, reason) = parse_status_line(b"HTTP/1.1 200 OK\r").unwrap();
        assert_eq!((version.as_str(), status, reason.as_str()), ("1.1", 200, "OK"));

        let (version, status, reason) = parse_status_line(b"HTTP/1.0 404").unwrap();
        assert_eq!((version.as_str(), status, reason.as_str()), ("1.0", 404, ""));

        let (_, _, reason) = parse_status_line(b"HTTP/1.1 500 Internal Server Error").unwrap();
        assert_eq!(reason, "Internal Server Error");

        let (version, _, _) = parse_status_line(b"HTTP/10.25 201 ").unwrap();
        assert_eq!(version, "10.25");
    }

    #[test]
    fn bad_status_lines() {
        for line in &[
            &b"HTTP/1.1 20 OK"[..],
            b"HTTP/1.1 2000 OK",
            b"HTTP/1 200 OK",
            b"HTTP/1.1200 OK",
            b"HTTP/1.1 200OK",
            b"http/1.1 200 OK",
            b"HTTP/1.1 099 Nope",
            b"HTTP/1.1 600 Nope",
            b"HTTP/1.1 200 O\x01K",
            b"ICY 200 OK",
            b"",
        ] {
            let err = parse_status_line(line).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidStatusLine, "{:?}", line);
        }
    }

    #[test]
    fn unfold_continuations() {
        assert_eq!(unfold(b"Foo: bar\r\n  baz\r\n"), b"Foo: bar baz\r\n".to_vec());
        assert_eq!(unfold(b"Foo: bar\n\tbaz\n"), b"Foo: bar baz\n".to_vec());
        assert_eq!(unfold(b"Foo: bar\r\nBaz: 1\r\n"), b"Foo: bar\r\nBaz: 1\r\n".to_vec());
    }

    #[test]
    fn decode() {
        let headers = decode_headers(b"Foo: bar\r\n  baz\r\nX-Empty:\r\nfoo:  2 \r\n").unwrap();
        assert_eq!(headers.get_all("foo"), ["bar baz", "2"]);
        assert_eq!(headers.get("x-empty"), Some(""));
    }

    #[test]
    fn decode_nothing() {
        assert!(decode_headers(b"").unwrap().is_empty());
    }

    #[test]
    fn non_utf8_is_rejected() {
        let err = decode_headers(b"X-Latin: caf\xe9\r\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHeaders);

        let err = parse_status_line(b"HTTP/1.1 200 Gr\xfc\xdf Gott").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatusLine);

        let headers = decode_headers("X-Name: caf\u{e9}\r\n".as_bytes()).unwrap();
        assert_eq!(headers.get("x-name"), Some("caf\u{e9}"));
    }

    #[test]
    fn decode_rejects_bad_names() {
        for raw in &[
            &b"Foo Bar: baz\r\n"[..],
            b"Foo : baz\r\n",
            b": baz\r\n",
            b"no colon\r\n",
            b"Foo\x01: baz\r\n",
            b" Leading: fold\r\n",
        ] {
            let err = decode_headers(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidHeaders, "{:?}", raw);
        }
    }

    #[test]
    fn flow_control() {
        let mut headers = Headers::new();
        headers.append("Transfer-Encoding", "IDENTITY");
        headers.append("Content-Length", "5");
        let flow = FlowControl::from_headers(&headers);
        assert!(!flow.chunked);
        assert_eq!(flow.content_length, ["5"]);

        let mut headers = Headers::new();
        headers.append("transfer-encoding", "gzip");
        assert!(FlowControl::from_headers(&headers).chunked);
    }

    #[test]
    fn head_size_limit() {
        assert!(check_head_size(b"HTTP/1.1 200 OK\r\n", Some(17)).unwrap().is_none());
        let err = check_head_size(b"HTTP/1.1 200 OK\r\nX", Some(17)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HeaderTooLarge);
        assert!(check_head_size(&[b'x'; 100], None).unwrap().is_none());
    }
}
