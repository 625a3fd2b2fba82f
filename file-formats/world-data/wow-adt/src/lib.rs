//! Parser for World of Warcraft v18 ADT terrain tiles.
//!
//! An ADT covers 533.33333 yards of a map and is split into 16x16 MCNK
//! cells. [`Adt::parse`] only validates the directory chunks (MVER, MHDR,
//! MCIN); cells are decoded on demand with [`Adt::cell`] so a caller can
//! pack one cell at a time and drop it.
//!
//! ```no_run
//! # fn example(data: &[u8]) -> wow_adt::Result<()> {
//! let adt = wow_adt::Adt::parse(data)?;
//! let cell = adt.cell(0, 0)?;
//! println!("area {} at {:?}", cell.area_id(), cell.position());
//! for wmo in &adt.placements()?.wmo_placements {
//!     println!("WMO {}", wmo.unique_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod header;
pub mod mcnk;
pub mod placement;

use log::debug;

use wow_data::ChunkReader;

pub use builder::{AdtBuilder, CellBuilder};
pub use error::{AdtError, Result};
pub use header::{McinEntry, Mhdr};
pub use mcnk::{LiquidCategory, LiquidLayer, LiquidVertex, McnkCell, McnkFlags, McnkHeader};
pub use placement::{DoodadPlacement, Placements, WmoPlacement};

/// Supported ADT versions.
pub const SUPPORTED_VERSIONS: &[u32] = &[18];

/// Cells per side of a tile.
pub const CELLS_PER_SIDE: usize = 16;

/// A validated ADT buffer with its cell directory.
#[derive(Debug, Clone)]
pub struct Adt<'a> {
    reader: ChunkReader<'a>,
    mhdr: Mhdr,
    mcin: Vec<McinEntry>,
}

impl<'a> Adt<'a> {
    /// Validate MVER, MHDR and MCIN.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let reader = ChunkReader::new(data);
        let mver = reader.read_version("ADT", SUPPORTED_VERSIONS)?;
        let mhdr_chunk = reader.expect_chunk(mver.next_offset(), header::MHDR)?;
        let mhdr = Mhdr::parse(&mhdr_chunk)?;
        let mcin_chunk = reader.expect_chunk(Mhdr::absolute(mhdr.ofs_mcin), header::MCIN)?;
        let mcin = header::parse_mcin(&mcin_chunk)?;
        debug!("ADT header ok, MCIN at {:#x}", mcin_chunk.offset);
        Ok(Self { reader, mhdr, mcin })
    }

    pub fn mhdr(&self) -> &Mhdr {
        &self.mhdr
    }

    /// MCIN entry of cell (x, y).
    pub fn mcin_entry(&self, x: usize, y: usize) -> Result<&McinEntry> {
        if x >= CELLS_PER_SIDE || y >= CELLS_PER_SIDE {
            return Err(AdtError::CellOutOfRange { x, y });
        }
        Ok(&self.mcin[x * CELLS_PER_SIDE + y])
    }

    /// Decode cell (x, y): MCNK header, MCVT heights and MCLQ layers.
    pub fn cell(&self, x: usize, y: usize) -> Result<McnkCell> {
        let entry = self.mcin_entry(x, y)?;
        let offset = entry.offset as usize;
        if entry.offset == 0 || !self.reader.is_chunk_at(offset, mcnk::MCNK) {
            return Err(AdtError::InvalidMcinEntry {
                x,
                y,
                offset: entry.offset,
            });
        }
        McnkCell::decode(self.reader.data(), offset)
    }

    /// Model and WMO placements with resolved names.
    pub fn placements(&self) -> Result<Placements> {
        Placements::parse(&self.reader, &self.mhdr)
    }
}
