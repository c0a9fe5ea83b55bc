//! The incremental response parser.

use std::collections::VecDeque;

use http_types::Method;

use crate::body::{body_kind, BodyKind};
use crate::buffer::Buffer;
use crate::chunked::{decode_trailers, merge_trailers, ChunkedDecoder, Progress};
use crate::error::{ErrorKind, ParseError};
use crate::head::{check_head_size, parse_head, FlowControl};
use crate::message::{ParsedMessage, Status};
use crate::options::ParserOptions;

/// The phase of the message currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for a status line and headers.
    AwaitingHeaders,
    /// Reading a body of known length.
    BodyIdentityFixed,
    /// Reading a body that ends when the transport closes.
    BodyIdentityUntilClose,
    /// Reading a chunked body.
    BodyChunked,
    /// The last chunk was read; deciding whether trailers follow.
    TrailersStart,
    /// Reading trailers.
    Trailers,
}

#[derive(Debug, Clone)]
enum State {
    AwaitingHeaders,
    BodyIdentityFixed { remaining: u64 },
    BodyIdentityUntilClose,
    BodyChunked(ChunkedDecoder),
    TrailersStart,
    Trailers,
}

/// Turns bytes received on a connection into HTTP responses.
///
/// The parser performs no I/O. Bytes are handed in with [`feed`](Self::feed),
/// and [`parse`](Self::parse) advances as far as the buffered input allows:
///
/// ```
/// use h1_incremental::{Parser, Status};
///
/// let mut parser = Parser::new();
/// let mut body = Vec::new();
/// parser.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhel");
///
/// let head = match parser.parse(|data| body.extend_from_slice(data)).unwrap() {
///     Status::HeadersReady(head) => head,
///     other => panic!("unexpected {:?}", other),
/// };
/// assert_eq!(head.status(), 200);
///
/// assert_eq!(parser.parse(|data| body.extend_from_slice(data)).unwrap(), Status::NeedMoreData);
/// parser.feed(b"lo");
/// assert!(matches!(
///     parser.parse(|data| body.extend_from_slice(data)).unwrap(),
///     Status::MessageComplete(_)
/// ));
/// assert_eq!(body, b"hello");
/// ```
///
/// One parser serves one connection for its whole life; after a message
/// completes, the next one is parsed from the bytes that follow it. After
/// an error the parser refuses further work and the connection should be
/// dropped.
#[derive(Debug)]
pub struct Parser {
    options: ParserOptions,
    buffer: Buffer,
    state: State,
    /// The message whose body is being read.
    message: Option<ParsedMessage>,
    body_bytes: u64,
    /// Methods of requests sent on this connection, oldest first.
    pending_methods: VecDeque<Method>,
    /// Method for the next message only, overriding the queue.
    next_method: Option<Method>,
    failed: Option<ErrorKind>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser with the default limits.
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    /// Create a parser with the given limits.
    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            buffer: Buffer::new(),
            state: State::AwaitingHeaders,
            message: None,
            body_bytes: 0,
            pending_methods: VecDeque::new(),
            next_method: None,
            failed: None,
        }
    }

    /// The limits this parser enforces.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Append received bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Record that a request with `method` was sent.
    ///
    /// Responses are matched to requests in order. The method of a `HEAD`
    /// or `CONNECT` request tells the parser that its response has no body.
    /// Interim (1xx) responses other than `101` leave the request pending.
    pub fn expect_response(&mut self, method: Method) {
        self.pending_methods.push_back(method);
    }

    /// Use `method` as the request method for the next final response only.
    ///
    /// Interim (1xx) responses other than `101` leave the override in place.
    pub fn set_request_method(&mut self, method: Method) {
        self.next_method = Some(method);
    }

    /// The phase of the current message.
    pub fn state(&self) -> ParserState {
        match self.state {
            State::AwaitingHeaders => ParserState::AwaitingHeaders,
            State::BodyIdentityFixed { .. } => ParserState::BodyIdentityFixed,
            State::BodyIdentityUntilClose => ParserState::BodyIdentityUntilClose,
            State::BodyChunked(_) => ParserState::BodyChunked,
            State::TrailersStart => ParserState::TrailersStart,
            State::Trailers => ParserState::Trailers,
        }
    }

    /// Whether an earlier call failed, leaving the parser unusable.
    pub fn is_failed(&self) -> bool {
        self.failed.is_some()
    }

    /// Decoded body bytes of the current message so far.
    pub fn body_bytes_consumed(&self) -> u64 {
        self.body_bytes
    }

    /// Bytes fed but not yet parsed.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Remove and return the bytes fed but not yet parsed.
    ///
    /// Useful after a `101 Switching Protocols` response, when the rest of
    /// the stream is no longer HTTP/1.
    pub fn take_buffered(&mut self) -> Vec<u8> {
        self.buffer.take()
    }

    /// Parse as much of the buffered input as possible.
    ///
    /// Decoded body bytes are passed to `sink` as they become available.
    /// Returns [`Status::HeadersReady`] once per message with a body, before
    /// any of it is decoded; call `parse` again to continue.
    pub fn parse<F>(&mut self, mut sink: F) -> Result<Status, ParseError>
    where
        F: FnMut(&[u8]),
    {
        if let Some(kind) = self.failed {
            return Err(poisoned(kind));
        }
        self.advance(&mut sink).map_err(|err| self.fail(err))
    }

    /// Signal that the transport reached the end of the stream.
    ///
    /// Completes a body that is delimited by the end of the stream, passing
    /// any still buffered bytes of it to `sink`. Returns `Ok(None)` if the
    /// stream ended cleanly between messages, and fails with
    /// [`ErrorKind::UnexpectedEof`] if it ended inside one.
    pub fn finish<F>(&mut self, mut sink: F) -> Result<Option<ParsedMessage>, ParseError>
    where
        F: FnMut(&[u8]),
    {
        if let Some(kind) = self.failed {
            return Err(poisoned(kind));
        }
        match self.state {
            State::BodyIdentityUntilClose => {
                self.read_until_close(&mut sink).map_err(|err| self.fail(err))?;
                Ok(Some(self.complete()))
            }
            State::AwaitingHeaders => {
                self.buffer.skip_blank_lines();
                if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    let err = ParseError::new(
                        ErrorKind::UnexpectedEof,
                        "stream ended while reading response headers",
                    );
                    Err(self.fail(err))
                }
            }
            State::BodyChunked(ref decoder) => {
                let message = match decoder.chunk_bytes_remaining() {
                    Some(n) => format!("stream ended {} bytes short of the end of a chunk", n),
                    None => "stream ended inside a chunked body".to_string(),
                };
                Err(self.fail(ParseError::new(ErrorKind::UnexpectedEof, message)))
            }
            _ => {
                let err = ParseError::new(
                    ErrorKind::UnexpectedEof,
                    "stream ended while reading response body",
                );
                Err(self.fail(err))
            }
        }
    }

    fn advance<F>(&mut self, sink: &mut F) -> Result<Status, ParseError>
    where
        F: FnMut(&[u8]),
    {
        loop {
            match self.state {
                State::AwaitingHeaders => return self.read_head(),
                State::BodyIdentityFixed { remaining } => {
                    let n = remaining.min(self.buffer.len() as u64) as usize;
                    if n == 0 {
                        return Ok(Status::NeedMoreData);
                    }
                    self.emit(n, sink)?;
                    let remaining = remaining - n as u64;
                    if remaining == 0 {
                        return Ok(Status::MessageComplete(self.complete()));
                    }
                    self.state = State::BodyIdentityFixed { remaining };
                    return Ok(Status::NeedMoreData);
                }
                State::BodyIdentityUntilClose => {
                    self.read_until_close(sink)?;
                    return Ok(Status::NeedMoreData);
                }
                State::BodyChunked(ref mut decoder) => {
                    let body_bytes = &mut self.body_bytes;
                    let limit = self.options.body_limit();
                    let progress = decoder.decode(&mut self.buffer, |data| {
                        count_body(body_bytes, limit, data.len())?;
                        sink(data);
                        Ok(())
                    })?;
                    match progress {
                        Progress::NeedMoreData => return Ok(Status::NeedMoreData),
                        Progress::LastChunk => self.state = State::TrailersStart,
                    }
                }
                State::TrailersStart => {
                    let buf = self.buffer.as_slice();
                    if buf.len() < 2 {
                        return Ok(Status::NeedMoreData);
                    }
                    if buf.starts_with(b"\r\n") {
                        self.buffer.consume(2);
                        return Ok(Status::MessageComplete(self.complete()));
                    }
                    self.state = State::Trailers;
                }
                State::Trailers => return self.read_trailers(),
            }
        }
    }

    fn read_head(&mut self) -> Result<Status, ParseError> {
        self.buffer.skip_blank_lines();
        let end = match check_head_size(self.buffer.as_slice(), self.options.header_limit())? {
            Some(end) => end,
            None => return Ok(Status::NeedMoreData),
        };

        let bytes = self.buffer.as_slice();
        let mut message = parse_head(&bytes[..end.head_len], bytes[..end.consumed].to_vec())?;
        self.buffer.consume(end.consumed);
        log::trace!(
            "< HTTP/{} {} {}",
            message.version,
            message.status,
            message.reason
        );

        let bodiless = self.bodiless_request(message.status);
        let kind = body_kind(
            message.status,
            bodiless,
            FlowControl::from_headers(&message.headers),
        )
        .map_err(|err| err.with_partial(Some(message.clone())))?;
        log::trace!("body: {:?}", kind);

        message.headers_only = true;
        self.body_bytes = 0;
        self.state = match kind {
            BodyKind::None => {
                self.message = Some(message);
                return Ok(Status::MessageComplete(self.complete()));
            }
            BodyKind::Fixed(remaining) => State::BodyIdentityFixed { remaining },
            BodyKind::Eof => State::BodyIdentityUntilClose,
            BodyKind::Chunked => State::BodyChunked(ChunkedDecoder::new()),
        };
        let head = message.clone();
        self.message = Some(message);
        Ok(Status::HeadersReady(head))
    }

    fn read_trailers(&mut self) -> Result<Status, ParseError> {
        let end = match check_head_size(self.buffer.as_slice(), self.options.header_limit())? {
            Some(end) => end,
            None => return Ok(Status::NeedMoreData),
        };
        let trailers = decode_trailers(&self.buffer.as_slice()[..end.head_len])?;
        self.buffer.consume(end.consumed);
        if let Some(message) = self.message.as_mut() {
            merge_trailers(&mut message.headers, trailers);
        }
        Ok(Status::MessageComplete(self.complete()))
    }

    fn read_until_close<F>(&mut self, sink: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(&[u8]),
    {
        let n = self.buffer.len();
        if n > 0 {
            self.emit(n, sink)?;
        }
        Ok(())
    }

    /// Passes the first `n` buffered bytes to `sink` as body data.
    fn emit<F>(&mut self, n: usize, sink: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(&[u8]),
    {
        count_body(&mut self.body_bytes, self.options.body_limit(), n)?;
        sink(&self.buffer.as_slice()[..n]);
        self.buffer.consume(n);
        Ok(())
    }

    fn bodiless_request(&mut self, status: u16) -> bool {
        let final_response = status >= 200 || status == 101;
        let method = match (self.next_method.is_some(), final_response) {
            (true, true) => self.next_method.take(),
            (true, false) => self.next_method.clone(),
            (false, true) => self.pending_methods.pop_front(),
            (false, false) => self.pending_methods.front().cloned(),
        };
        matches!(method, Some(Method::Head) | Some(Method::Connect))
    }

    fn complete(&mut self) -> ParsedMessage {
        self.state = State::AwaitingHeaders;
        let mut message = self.message.take().unwrap_or_default();
        message.headers_only = false;
        message.remaining = self.buffer.as_slice().to_vec();
        log::trace!(
            "response complete, {} body bytes, {} bytes left over",
            self.body_bytes,
            message.remaining.len()
        );
        message
    }

    fn fail(&mut self, err: ParseError) -> ParseError {
        log::debug!("failed to parse response: {}", err);
        self.failed = Some(err.kind());
        if err.partial().is_some() {
            return err;
        }
        let partial = match self.state {
            State::AwaitingHeaders => Some(ParsedMessage {
                trace: self.buffer.as_slice().to_vec(),
                ..ParsedMessage::default()
            }),
            _ => self.message.clone(),
        };
        err.with_partial(partial)
    }
}

fn count_body(total: &mut u64, limit: Option<u64>, n: usize) -> Result<(), ParseError> {
    *total += n as u64;
    match limit {
        Some(limit) if *total > limit => Err(ParseError::new(
            ErrorKind::BodyTooLarge,
            format!("body exceeds {} bytes", limit),
        )),
        _ => Ok(()),
    }
}

fn poisoned(kind: ErrorKind) -> ParseError {
    ParseError::new(kind, "parser already failed on this connection")
}
