use crate::error::{ErrorKind, ParseError};
use crate::head::FlowControl;

/// How the body of a response is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyKind {
    /// The message has no body, or an empty one.
    None,
    /// `Content-Length` bytes follow.
    Fixed(u64),
    /// The body runs until the transport closes.
    Eof,
    /// Chunked transfer-coding.
    Chunked,
}

/// Implements the response body length rules of RFC 7230, section 3.3.3:
///
/// 1. `HEAD` or `CONNECT` requests, 1xx, 204 and 304 responses have no body.
/// 2. A `Transfer-Encoding` selects chunked decoding.
/// 3. Otherwise `Content-Length` gives the length.
/// 4. Otherwise the body is delimited by the end of the stream.
pub(crate) fn body_kind(
    status: u16,
    bodiless_request: bool,
    flow: FlowControl<'_>,
) -> Result<BodyKind, ParseError> {
    if bodiless_request || status < 200 || status == 204 || status == 304 {
        return Ok(BodyKind::None);
    }
    if flow.chunked {
        return Ok(BodyKind::Chunked);
    }
    if flow.content_length.is_empty() {
        return Ok(BodyKind::Eof);
    }
    match parse_content_length(flow.content_length)? {
        0 => Ok(BodyKind::None),
        len => Ok(BodyKind::Fixed(len)),
    }
}

/// Every value, including each element of a comma separated list, must be
/// the same decimal number.
pub(crate) fn parse_content_length(values: &[String]) -> Result<u64, ParseError> {
    let mut length = None;
    for part in values.iter().flat_map(|value| value.split(',')) {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::new(
                ErrorKind::NonNumericContentLength,
                format!("invalid content-length: {:?}", part),
            ));
        }
        let parsed: u64 = part.parse().map_err(|_| {
            ParseError::new(
                ErrorKind::NonNumericContentLength,
                format!("content-length out of range: {}", part),
            )
        })?;
        match length {
            Some(prev) if prev != parsed => {
                return Err(ParseError::new(
                    ErrorKind::ConflictingContentLength,
                    format!("conflicting content-length values: {} and {}", prev, parsed),
                ))
            }
            _ => length = Some(parsed),
        }
    }
    length.ok_or_else(|| ParseError::new(ErrorKind::NonNumericContentLength, "empty content-length"))
}
