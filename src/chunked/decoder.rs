use crate::buffer::Buffer;
use crate::error::{ErrorKind, ParseError};
use crate::head::find;

/// Longest chunk-size line we wait for before giving up on it.
const MAX_CHUNK_SIZE_LINE: usize = 64;

/// Hex digits in the largest chunk size we accept (`u64::MAX`).
const MAX_CHUNK_SIZE_DIGITS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for a `<hex>\r\n` line.
    DeterminingChunkSize,
    /// Inside a chunk; `remaining` data bytes precede its CRLF.
    ConsumingChunk { remaining: u64 },
}

/// Result of running the decoder over the buffered input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    NeedMoreData,
    /// The zero-sized chunk was read; trailers follow.
    LastChunk,
}

/// Decodes a chunked body according to
/// https://tools.ietf.org/html/rfc7230#section-4.1
///
/// Only the chunk framing is handled here. Trailers are left in the buffer
/// once [`Progress::LastChunk`] is returned.
#[derive(Debug, Clone)]
pub(crate) struct ChunkedDecoder {
    state: State,
}

impl ChunkedDecoder {
    pub(crate) fn new() -> Self {
        ChunkedDecoder {
            state: State::DeterminingChunkSize,
        }
    }

    /// Bytes still expected in the current chunk, `None` between chunks.
    pub(crate) fn chunk_bytes_remaining(&self) -> Option<u64> {
        match self.state {
            State::DeterminingChunkSize => None,
            State::ConsumingChunk { remaining } => Some(remaining),
        }
    }

    /// Decodes as much of `buf` as possible, handing chunk data to `emit`.
    ///
    /// Chunk data is never consumed past its boundary: a chunk is taken
    /// whole only when its CRLF is buffered too, so a CRLF split across two
    /// reads is not mistaken for data.
    pub(crate) fn decode<F>(&mut self, buf: &mut Buffer, mut emit: F) -> Result<Progress, ParseError>
    where
        F: FnMut(&[u8]) -> Result<(), ParseError>,
    {
        loop {
            match self.state {
                State::DeterminingChunkSize => {
                    let line_end = match find(buf.as_slice(), b"\r\n") {
                        Some(pos) => pos,
                        None if buf.len() > MAX_CHUNK_SIZE_LINE => {
                            return Err(ParseError::new(
                                ErrorKind::InvalidChunkSizeFormat,
                                format!("chunk size line exceeds {} bytes", MAX_CHUNK_SIZE_LINE),
                            ))
                        }
                        None => return Ok(Progress::NeedMoreData),
                    };
                    let size = parse_chunk_size(&buf.as_slice()[..line_end])?;
                    buf.consume(line_end + 2);
                    if size == 0 {
                        log::trace!("last chunk");
                        return Ok(Progress::LastChunk);
                    }
                    log::trace!("chunk of {} bytes", size);
                    self.state = State::ConsumingChunk { remaining: size };
                }
                State::ConsumingChunk { remaining } => {
                    let available = buf.len() as u64;
                    if available >= remaining.saturating_add(2) {
                        let end = remaining as usize;
                        if &buf.as_slice()[end..end + 2] != b"\r\n" {
                            return Err(ParseError::new(
                                ErrorKind::InvalidChunkSizeFormat,
                                "chunk data not followed by CRLF",
                            ));
                        }
                        if end > 0 {
                            emit(&buf.as_slice()[..end])?;
                        }
                        buf.consume(end + 2);
                        self.state = State::DeterminingChunkSize;
                    } else if available >= remaining {
                        // Data is complete but its CRLF is not.
                        return Ok(Progress::NeedMoreData);
                    } else {
                        if available > 0 {
                            emit(buf.as_slice())?;
                            buf.consume(available as usize);
                            self.state = State::ConsumingChunk {
                                remaining: remaining - available,
                            };
                        }
                        return Ok(Progress::NeedMoreData);
                    }
                }
            }
        }
    }
}

/// Parses a chunk-size line. The size must be plain hex without leading
/// zeros or extensions; a line of zeros marks the last chunk.
pub(crate) fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let invalid = || {
        ParseError::new(
            ErrorKind::InvalidChunkSize,
            format!("invalid chunk size: {:?}", String::from_utf8_lossy(line)),
        )
    };

    let start = line.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
    let end = line.len() - line.iter().rev().take_while(|&&b| b == b' ' || b == b'\t').count();
    let digits = if start < end { &line[start..end] } else { &[][..] };

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(invalid());
    }
    if digits.iter().all(|&b| b == b'0') {
        return Ok(0);
    }
    if digits.len() > MAX_CHUNK_SIZE_DIGITS {
        return Err(ParseError::new(
            ErrorKind::InvalidChunkSizeFormat,
            "chunk size overflows",
        ));
    }

    let hex = String::from_utf8_lossy(digits).to_ascii_lowercase();
    let size = u64::from_str_radix(&hex, 16).map_err(|_| invalid())?;
    if format!("{:x}", size) != hex {
        return Err(invalid());
    }
    Ok(size)
}
