/// The default limit on the size of a header block, in bytes.
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;

/// The default limit on the size of a decoded body, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Configure the parser.
///
/// A limit of `0` disables the corresponding check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum size of a header or trailer block. Defaults to 8 KiB.
    max_header_size: usize,
    /// Maximum number of decoded body bytes per message. Defaults to 10 MiB.
    max_body_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ParserOptions {
    /// Options with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header block limit. `0` means unlimited.
    pub fn max_header_size(mut self, bytes: usize) -> Self {
        self.max_header_size = bytes;
        self
    }

    /// Set the body limit. `0` means unlimited.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub(crate) fn header_limit(&self) -> Option<usize> {
        Some(self.max_header_size).filter(|&n| n > 0)
    }

    pub(crate) fn body_limit(&self) -> Option<u64> {
        Some(self.max_body_size as u64).filter(|&n| n > 0)
    }
}
