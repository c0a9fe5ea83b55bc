//! Chunked transfer-coding.

mod decoder;
mod trailers;

pub(crate) use decoder::{ChunkedDecoder, Progress};
pub(crate) use trailers::{decode_trailers, merge_trailers};
