//! Incremental HTTP/1.x response parser.
//!
//! A [`Parser`] turns the bytes a client receives on a connection into
//! response heads and bodies. It never performs I/O: the caller reads from
//! the socket, hands the bytes to [`Parser::feed`], and calls
//! [`Parser::parse`], which answers with one of
//!
//! - [`Status::NeedMoreData`]: everything buffered was used,
//! - [`Status::HeadersReady`]: the status line and headers are available
//!   and a body follows,
//! - [`Status::MessageComplete`]: the response is done, the parser is ready
//!   for the next one on the same connection.
//!
//! Body bytes are streamed to a sink callback as they are decoded. Bodies
//! framed with `Content-Length`, chunked transfer-coding (with trailers) or
//! the end of the stream are supported; the last kind is completed with
//! [`Parser::finish`] when the transport closes.
//!
//! ```txt
//!   socket --bytes--> feed --> parse --> head (status, headers)
//!                                   \--> sink (body bytes)
//! ```
//!
//! The [`client`] module has a ready-made read loop for async transports.
//!
//! # Example
//!
//! ```
//! use h1_incremental::{Parser, Status};
//!
//! let mut parser = Parser::new();
//! parser.feed(b"HTTP/1.1 204 No Content\r\nServer: example\r\n\r\n");
//!
//! match parser.parse(|_| {}).unwrap() {
//!     Status::MessageComplete(response) => {
//!         assert_eq!(response.status(), 204);
//!         assert_eq!(response.headers().get("server"), Some("example"));
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

// ref: https://tools.ietf.org/html/rfc7230#section-3.3.3

#![forbid(unsafe_code, future_incompatible, rust_2018_idioms)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

pub use error::{Error, ErrorKind, ParseError};
pub use headers::Headers;
pub use message::{ParsedMessage, Status};
pub use options::{ParserOptions, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_HEADER_SIZE};
pub use parser::{Parser, ParserState};

/// Request methods, used to correlate responses with requests.
pub use http_types::Method;

mod body;
mod buffer;
mod chunked;
mod error;
mod head;
mod message;
mod options;
mod parser;

pub mod client;
pub mod headers;
