use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::message::ParsedMessage;

/// The category of a parse failure.
///
/// Every kind is fatal for the message being parsed; the connection the
/// bytes came from should be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The status line is not `HTTP/<major>.<minor> <code> <reason>`.
    InvalidStatusLine,
    /// The header block does not match the field grammar.
    InvalidHeaders,
    /// No header terminator was found within the configured limit.
    HeaderTooLarge,
    /// A chunk-size line is empty or not canonical lowercase hex.
    InvalidChunkSize,
    /// Chunk framing is broken: overlong size line, overflow, or chunk data
    /// not followed by CRLF.
    InvalidChunkSizeFormat,
    /// Decoded body bytes exceed the configured limit.
    BodyTooLarge,
    /// `Content-Length` is not a non-negative decimal integer.
    NonNumericContentLength,
    /// Several `Content-Length` values that disagree.
    ConflictingContentLength,
    /// The transport closed before the message was complete.
    UnexpectedEof,
}

impl ErrorKind {
    /// The HTTP status a server would answer with for this kind of error.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::HeaderTooLarge => 431,
            ErrorKind::BodyTooLarge => 413,
            _ => 400,
        }
    }

    fn description(self) -> &'static str {
        match self {
            ErrorKind::InvalidStatusLine => "invalid status line",
            ErrorKind::InvalidHeaders => "invalid headers",
            ErrorKind::HeaderTooLarge => "header block too large",
            ErrorKind::InvalidChunkSize => "invalid chunk size",
            ErrorKind::InvalidChunkSizeFormat => "invalid chunk framing",
            ErrorKind::BodyTooLarge => "body too large",
            ErrorKind::NonNumericContentLength => "non-numeric content-length",
            ErrorKind::ConflictingContentLength => "conflicting content-length",
            ErrorKind::UnexpectedEof => "unexpected end of stream",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A failure to parse an HTTP message.
///
/// Carries whatever was parsed of the message before the failure, so the
/// caller can log it.
#[derive(Debug, Clone)]
pub struct ParseError {
    kind: ErrorKind,
    message: String,
    partial: Option<Box<ParsedMessage>>,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            partial: None,
        }
    }

    pub(crate) fn with_partial(mut self, partial: Option<ParsedMessage>) -> Self {
        self.partial = partial.map(Box::new);
        self
    }

    /// The category of the failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// A human readable description of what went wrong.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for `self.kind().status_code()`.
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// The message as far as it was parsed when the error occurred.
    pub fn partial(&self) -> Option<&ParsedMessage> {
        self.partial.as_deref()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.status_code(), self.message)
    }
}

impl StdError for ParseError {}

/// Errors produced while reading a response from a transport.
#[derive(Debug)]
pub enum Error {
    /// Reading from the transport failed.
    Io(io::Error),
    /// The bytes read do not form a valid response.
    Parse(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Parse(err) => write!(f, "parse error: {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Parse(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ErrorKind::InvalidStatusLine.status_code(), 400);
        assert_eq!(ErrorKind::InvalidChunkSize.status_code(), 400);
        assert_eq!(ErrorKind::BodyTooLarge.status_code(), 413);
        assert_eq!(ErrorKind::HeaderTooLarge.status_code(), 431);
    }

    #[test]
    fn display_includes_kind_and_code() {
        let err = ParseError::new(ErrorKind::BodyTooLarge, "limit is 4 bytes");
        assert_eq!(err.to_string(), "body too large (413): limit is 4 bytes");
        assert!(err.partial().is_none());
    }
}
