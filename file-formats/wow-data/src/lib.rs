//! Shared building blocks for the client file parsers.
//!
//! - [`chunk`]: reversed-tag chunk ids, headers and a bounds checked
//!   [`ChunkReader`] over a flat buffer
//! - [`cursor`]: a little-endian [`ByteCursor`] for decoding chunk payloads
//! - [`io_ext`]: little-endian write helpers used by the output writers
//! - [`types`]: [`AaBox`] and the file-to-engine coordinate permutation
//!
//! Every parser in the workspace is a fixed sequence of
//! [`ChunkReader::expect_chunk`] calls, each followed by field-by-field
//! decoding through a [`ByteCursor`]. Nothing is overlaid on the raw buffer.

pub mod chunk;
pub mod cursor;
pub mod error;
pub mod io_ext;
pub mod types;

pub use chunk::{Chunk, ChunkHeader, ChunkId, ChunkReader};
pub use cursor::{ByteCursor, cstr_at, cstr_table};
pub use error::{DataError, Result};
pub use io_ext::{WriteExt, cstr_block};
pub use glam::Vec3;
pub use types::{AaBox, to_engine_order};

pub mod prelude {
    pub use crate::chunk::{Chunk, ChunkId, ChunkReader};
    pub use crate::cursor::ByteCursor;
    pub use crate::io_ext::WriteExt;
    pub use crate::types::AaBox;
    pub use glam::Vec3;
}
