//! Error types for the DBC parser.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing a DBC file
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Binary decoding error: {0}")]
    Binrw(#[from] binrw::Error),

    /// Bad magic, or counts that do not describe the buffer.
    #[error("Invalid DBC header: {0}")]
    InvalidHeader(String),

    #[error("Invalid DBC record: {0}")]
    InvalidRecord(String),

    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Type conversion error: {0}")]
    TypeConversion(String),
}

impl Error {
    /// Whether the file is malformed, as opposed to unreadable.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
