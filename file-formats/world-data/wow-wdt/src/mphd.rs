//! MPHD chunk - Map Header

use bitflags::bitflags;

use wow_data::{Chunk, ChunkId};

use crate::error::Result;

pub const MPHD: ChunkId = ChunkId::from_mnemonic(b"MPHD");

bitflags! {
    /// MPHD flags controlling map behaviors and features
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MphdFlags: u32 {
        /// Map is a single global WMO, no terrain
        const WDT_USES_GLOBAL_MAP_OBJ              = 0x0001;
        /// ADTs have vertex colors (MCCV chunks)
        const ADT_HAS_MCCV                         = 0x0002;
        /// ADTs use alternative terrain shader (big alpha)
        const ADT_HAS_BIG_ALPHA                    = 0x0004;
        /// Doodads are sorted by size category
        const ADT_HAS_DOODADREFS_SORTED_BY_SIZE_CAT = 0x0008;
        /// ADTs have lighting vertices
        const ADT_HAS_LIGHTING_VERTICES            = 0x0010;
        /// Flip ground display
        const ADT_HAS_UPSIDE_DOWN_GROUND           = 0x0020;
    }
}

/// MPHD payload: flags followed by seven unused words.
pub const MPHD_SIZE: usize = 32;

/// Read the flags word. Unknown bits are kept.
pub fn parse_flags(chunk: &Chunk<'_>) -> Result<MphdFlags> {
    Ok(MphdFlags::from_bits_retain(chunk.cursor().read_u32()?))
}
