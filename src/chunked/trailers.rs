use crate::error::ParseError;
use crate::head::decode_headers;
use crate::headers::Headers;

/// Fields that may never be set by a trailer.
const FORBIDDEN_TRAILERS: [&str; 3] = ["Transfer-Encoding", "Content-Length", "Trailer"];

/// Decodes a trailer block. `raw` holds complete field lines without the
/// terminating empty line.
pub(crate) fn decode_trailers(raw: &[u8]) -> Result<Headers, ParseError> {
    let mut trailers = decode_headers(raw)?;
    for name in FORBIDDEN_TRAILERS.iter() {
        if trailers.remove(name).is_some() {
            log::debug!("discarding {} trailer", name);
        }
    }
    Ok(trailers)
}

/// Folds trailers into the head: a trailer replaces every value of a
/// header with the same name, and new names are appended.
pub(crate) fn merge_trailers(headers: &mut Headers, trailers: Headers) {
    for (name, values) in trailers.iter() {
        headers.insert(name, values.to_vec());
    }
}
