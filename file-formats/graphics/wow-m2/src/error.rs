use thiserror::Error;

use wow_data::DataError;

/// Error types for M2 model parsing
#[derive(Error, Debug)]
pub enum M2Error {
    /// Chunk level failure: truncation or unsupported version
    #[error(transparent)]
    Data(#[from] DataError),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected 'MD20', got '{0}'")]
    InvalidMagic(String),

    /// An array header points outside the file
    #[error("Reference error: {name} ({count} x {elem_size} bytes at {offset:#x}) overruns a {len} byte file")]
    ReferenceError {
        name: &'static str,
        count: u32,
        offset: u32,
        elem_size: usize,
        len: usize,
    },

    /// A collision index refers past the collision vertices
    #[error("Collision index {index} out of range ({vertices} vertices)")]
    IndexOutOfRange { index: u16, vertices: usize },
}

/// Result type using M2Error
pub type Result<T> = std::result::Result<T, M2Error>;
