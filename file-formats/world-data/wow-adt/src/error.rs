//! Error types for ADT parsing.
//!
//! Parsing is fail-fast: the first structural problem aborts the tile and
//! the caller decides whether to skip it. Chunk level failures (bad magic,
//! truncation, version) come from [`wow_data::DataError`].

use thiserror::Error;

use wow_data::DataError;

pub type Result<T> = std::result::Result<T, AdtError>;

#[derive(Error, Debug)]
pub enum AdtError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary decoding error: {0}")]
    Binrw(#[from] binrw::Error),

    /// Cell coordinates outside the 16x16 grid.
    #[error("Cell ({x}, {y}) is outside the 16x16 grid")]
    CellOutOfRange { x: usize, y: usize },

    /// MCIN points at something that is not an MCNK chunk, or past the file.
    #[error("MCIN entry ({x}, {y}) points at invalid offset {offset:#x}")]
    InvalidMcinEntry { x: usize, y: usize, offset: u32 },

    /// An MMID/MWID entry or placement name id points outside its table.
    #[error("{table} index {index} out of range ({len} entries)")]
    InvalidNameReference {
        table: &'static str,
        index: u32,
        len: usize,
    },
}

impl AdtError {
    /// Whether the tile is malformed, as opposed to an I/O failure.
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Data(e) => e.is_format_error(),
            Self::Io(_) => false,
            _ => true,
        }
    }
}
