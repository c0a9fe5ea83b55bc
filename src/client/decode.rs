use futures_lite::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, ErrorKind, ParseError};
use crate::message::{ParsedMessage, Status};
use crate::parser::Parser;

/// How many bytes to ask the transport for at once.
const READ_SIZE: usize = 8 * 1024;

/// Read until the head of the next response has been parsed.
///
/// Must be called between messages. Returns `Ok(None)` if the stream ended
/// before a response started. If the returned message is
/// [headers only](ParsedMessage::is_headers_only), read its body with
/// [`read_body`].
pub async fn read_head<R>(reader: &mut R, parser: &mut Parser) -> Result<Option<ParsedMessage>, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; READ_SIZE];
    loop {
        match parser.parse(|_| {})? {
            Status::HeadersReady(head) | Status::MessageComplete(head) => {
                log::trace!("< {:?}", &head);
                return Ok(Some(head));
            }
            Status::NeedMoreData => {}
        }

        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(parser.finish(|_| {})?);
        }
        parser.feed(&buf[..n]);
    }
}

/// Read the body of the response whose head was just returned, passing
/// decoded bytes to `sink`.
///
/// Returns the completed message, including any trailers.
pub async fn read_body<R, F>(reader: &mut R, parser: &mut Parser, mut sink: F) -> Result<ParsedMessage, Error>
where
    R: AsyncRead + Unpin,
    F: FnMut(&[u8]),
{
    let mut buf = vec![0; READ_SIZE];
    loop {
        match parser.parse(&mut sink)? {
            Status::MessageComplete(message) => return Ok(message),
            Status::HeadersReady(_) | Status::NeedMoreData => {}
        }

        let n = reader.read(&mut buf).await?;
        if n == 0 {
            log::trace!("stream closed after {} body bytes", parser.body_bytes_consumed());
            return match parser.finish(&mut sink)? {
                Some(message) => Ok(message),
                None => Err(ParseError::new(
                    ErrorKind::UnexpectedEof,
                    "stream ended before a response was received",
                )
                .into()),
            };
        }
        parser.feed(&buf[..n]);
    }
}

/// Read a whole response: its head, then its body into `sink`.
///
/// Returns `Ok(None)` if the stream ended before a response started.
pub async fn read_response<R, F>(
    reader: &mut R,
    parser: &mut Parser,
    sink: F,
) -> Result<Option<ParsedMessage>, Error>
where
    R: AsyncRead + Unpin,
    F: FnMut(&[u8]),
{
    match read_head(reader, parser).await? {
        Some(head) if head.is_headers_only() => Ok(Some(read_body(reader, parser, sink).await?)),
        other => Ok(other),
    }
}
