use thiserror::Error;

use wow_data::{ChunkId, DataError};

pub type Result<T> = std::result::Result<T, WmoError>;

/// Error types for WMO parsing
#[derive(Error, Debug)]
pub enum WmoError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary decoding error: {0}")]
    Binrw(#[from] binrw::Error),

    /// A chunk is shorter than its fixed-size header.
    #[error("{chunk} holds {len} bytes, expected at least {min}")]
    ChunkTooSmall { chunk: ChunkId, len: usize, min: usize },

    /// MOVI does not hold three indices per MOPY entry.
    #[error("MOVI holds {indices} indices for {triangles} triangles")]
    TriangleCountMismatch { indices: usize, triangles: usize },

    #[error("Vertex index {index} out of range ({vertices} vertices)")]
    IndexOutOfRange { index: u16, vertices: usize },

    /// MLIQ dimensions imply more data than the chunk carries.
    #[error("MLIQ declares {verts} vertices and {tiles} tiles but holds {len} bytes")]
    InvalidLiquid { verts: usize, tiles: usize, len: usize },
}
