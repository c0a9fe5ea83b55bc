#![allow(dead_code)]

use h1_incremental::{ParseError, ParsedMessage, Parser, Status};

/// Everything a parser produced for some input.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Decoded {
    pub heads: Vec<ParsedMessage>,
    pub messages: Vec<ParsedMessage>,
    pub body: Vec<u8>,
}

/// Calls `parse` until the parser asks for more input.
pub fn drain(parser: &mut Parser, out: &mut Decoded) -> Result<(), ParseError> {
    loop {
        let body = &mut out.body;
        match parser.parse(|data| body.extend_from_slice(data))? {
            Status::NeedMoreData => return Ok(()),
            Status::HeadersReady(head) => out.heads.push(head),
            Status::MessageComplete(message) => out.messages.push(message),
        }
    }
}

/// Feeds `pieces` one after another, then signals the end of the stream.
pub fn decode_pieces<'a, I>(parser: &mut Parser, pieces: I) -> Result<Decoded, ParseError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut out = Decoded::default();
    for piece in pieces {
        parser.feed(piece);
        drain(parser, &mut out)?;
    }
    let body = &mut out.body;
    if let Some(message) = parser.finish(|data| body.extend_from_slice(data))? {
        out.messages.push(message);
    }
    Ok(out)
}

/// Decodes `input` fed in a single piece.
pub fn decode(input: &[u8]) -> Result<Decoded, ParseError> {
    decode_pieces(&mut Parser::new(), std::iter::once(input))
}

/// Decodes `input` fed one byte at a time.
pub fn decode_bytewise(input: &[u8]) -> Result<Decoded, ParseError> {
    decode_pieces(&mut Parser::new(), input.chunks(1))
}

/// Encodes `parts` with chunked transfer-coding, skipping empty parts since
/// a zero-sized chunk ends the body.
pub fn encode_chunked(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts.iter().filter(|part| !part.is_empty()) {
        out.extend_from_slice(format!("{:x}\r\n", part.len()).as_bytes());
        out.extend_from_slice(part);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// Joins lines with CRLF, like a server would send them.
pub fn crlf(lines: &[&str]) -> Vec<u8> {
    lines.join("\r\n").into_bytes()
}
