use std::io;

use thiserror::Error;

use crate::chunk::ChunkId;

/// Errors shared by every chunk based client file parser.
///
/// Format crates wrap this type in their own error enum, so a caller can
/// always tell a malformed file (`InvalidMagic`, `UnexpectedEof`) from an
/// unsupported one (`UnsupportedVersion`) or one whose declared sizes do
/// not add up (`InvariantViolation`).
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Binary decoding error: {0}")]
    Binrw(#[from] binrw::Error),

    #[error("Invalid magic: expected {expected}, found {found} at offset {offset:#x}")]
    InvalidMagic {
        expected: ChunkId,
        found: ChunkId,
        offset: usize,
    },

    #[error("Unexpected end of data: wanted {wanted} bytes at offset {offset:#x}, buffer is {len} bytes")]
    UnexpectedEof {
        offset: usize,
        wanted: usize,
        len: usize,
    },

    #[error("Unsupported {format} version {version}")]
    UnsupportedVersion { format: &'static str, version: u32 },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl DataError {
    /// Whether the error points at malformed input rather than an I/O problem.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. } | Self::UnexpectedEof { .. } | Self::Binrw(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
