//! MHDR and MCIN, the two directory chunks that follow MVER.

use binrw::{BinRead, BinWrite};

use wow_data::{Chunk, ChunkId};

use crate::error::Result;

pub const MHDR: ChunkId = ChunkId::from_mnemonic(b"MHDR");
pub const MCIN: ChunkId = ChunkId::from_mnemonic(b"MCIN");

/// MHDR offsets are relative to the end of the MHDR chunk header.
///
/// MVER is always 12 bytes, so that base is absolute offset 20.
pub const MHDR_DATA_OFFSET: usize = 20;

/// ADT header, 64 bytes.
///
/// ```text
/// Offset | Size | Field
/// -------|------|------------------------------
/// 0x00   |  4   | flags
/// 0x04   |  4   | MCIN offset
/// 0x08   |  4   | MTEX offset
/// 0x0C   |  4   | MMDX offset
/// 0x10   |  4   | MMID offset
/// 0x14   |  4   | MWMO offset
/// 0x18   |  4   | MWID offset
/// 0x1C   |  4   | MDDF offset
/// 0x20   |  4   | MODF offset
/// 0x24   | 28   | MFBO/MH2O/MTXF offsets and padding, unused in v18 vanilla
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct Mhdr {
    pub flags: u32,
    pub ofs_mcin: u32,
    pub ofs_mtex: u32,
    pub ofs_mmdx: u32,
    pub ofs_mmid: u32,
    pub ofs_mwmo: u32,
    pub ofs_mwid: u32,
    pub ofs_mddf: u32,
    pub ofs_modf: u32,
    pub reserved: [u32; 7],
}

impl Mhdr {
    pub const SIZE: usize = 64;

    pub fn parse(chunk: &Chunk<'_>) -> Result<Self> {
        let mut io = chunk.cursor().take_io(Self::SIZE)?;
        Ok(Self::read(&mut io)?)
    }

    /// Absolute file offset of a chunk referenced by an MHDR field.
    pub fn absolute(ofs: u32) -> usize {
        MHDR_DATA_OFFSET + ofs as usize
    }
}

/// One MCIN directory entry. `offset` is absolute in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct McinEntry {
    pub offset: u32,
    pub size: u32,
    pub flags: u32,
    pub async_id: u32,
}

impl McinEntry {
    pub const SIZE: usize = 16;
}

/// Parse the 256 MCIN entries, stored `[x][y]` so entry `x * 16 + y`
/// describes cell (x, y).
pub fn parse_mcin(chunk: &Chunk<'_>) -> Result<Vec<McinEntry>> {
    let mut io = chunk.cursor().take_io(McinEntry::SIZE * 256)?;
    let mut entries = Vec::with_capacity(256);
    for _ in 0..256 {
        entries.push(McinEntry::read(&mut io)?);
    }
    Ok(entries)
}
