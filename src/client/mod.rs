//! Read responses from an async transport.
//!
//! The [`Parser`](crate::Parser) never touches I/O. These functions own the
//! read loop for it: they read from any `AsyncRead`, feed the parser, and
//! report the end of the stream with [`Parser::finish`](crate::Parser::finish).

mod decode;

pub use decode::{read_body, read_head, read_response};
