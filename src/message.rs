use crate::headers::Headers;

/// A response head, and once complete, the fact that its body was read.
///
/// Body bytes are not stored here; they go to the sink passed to
/// [`Parser::parse`](crate::Parser::parse).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub(crate) version: String,
    pub(crate) status: u16,
    pub(crate) reason: String,
    pub(crate) headers: Headers,
    pub(crate) trace: Vec<u8>,
    pub(crate) headers_only: bool,
    pub(crate) remaining: Vec<u8>,
}

impl ParsedMessage {
    /// Protocol version from the status line, e.g. `"1.1"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Status code, between 100 and 599.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase. May be empty.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Header fields, with trailers merged in for a completed chunked body.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The raw status line and header block as received.
    pub fn trace(&self) -> &[u8] {
        &self.trace
    }

    /// `true` when the head has been parsed but the body is still pending.
    pub fn is_headers_only(&self) -> bool {
        self.headers_only
    }

    /// Bytes received after the end of this message.
    ///
    /// The parser keeps its own copy of these for the next message; they
    /// are reported here so a caller switching protocols (e.g. after a
    /// `101`) knows what was already read.
    pub fn remaining(&self) -> &[u8] {
        &self.remaining
    }
}

/// Outcome of a call to [`Parser::parse`](crate::Parser::parse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Every buffered byte has been used; feed more input.
    NeedMoreData,
    /// The head was parsed and a body follows.
    HeadersReady(ParsedMessage),
    /// The message is complete. The parser is ready for the next one.
    MessageComplete(ParsedMessage),
}

impl Status {
    /// Whether this is [`Status::NeedMoreData`].
    pub fn is_partial(&self) -> bool {
        matches!(self, Status::NeedMoreData)
    }
}
