//! MLIQ: the liquid surface of one WMO group.
//!
//! ```text
//! Offset | Size | Field
//! -------|------|------------------------------------------
//! 0x00   | 16   | vertex count x/y, tile count x/y (u32 each)
//! 0x10   | 12   | base corner
//! 0x1C   |  2   | material id
//! 0x1E   | 8n   | vertices, 4 flow/texture bytes + f32 height
//! ...    |  m   | one flag byte per tile
//! ```

use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use glam::Vec3;

use wow_data::{Chunk, ChunkId};

use crate::error::{Result, WmoError};

pub const MLIQ: ChunkId = ChunkId::from_mnemonic(b"MLIQ");

/// Fixed MLIQ header.
#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct MliqHeader {
    pub verts_x: u32,
    pub verts_y: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub base: [f32; 3],
    pub material_id: u16,
}

impl MliqHeader {
    pub const SIZE: usize = 30;
}

/// Legacy liquid kind stored in the low bits of a tile flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileLiquid {
    Water,
    Ocean,
    Magma,
    Slime,
}

impl TileLiquid {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Water,
            1 => Self::Ocean,
            2 => Self::Magma,
            _ => Self::Slime,
        }
    }
}

/// Decoded group liquid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WmoLiquid {
    pub header: MliqHeader,
    /// `verts_x * verts_y` heights, row major.
    pub heights: Vec<f32>,
    /// `tiles_x * tiles_y` flag bytes, row major.
    pub flags: Vec<u8>,
}

impl WmoLiquid {
    const VERTEX_SIZE: usize = 8;
    const NO_LIQUID: u8 = 0x0F;

    pub fn parse(chunk: &Chunk<'_>) -> Result<Self> {
        if chunk.size() < MliqHeader::SIZE {
            return Err(WmoError::ChunkTooSmall {
                chunk: MLIQ,
                len: chunk.size(),
                min: MliqHeader::SIZE,
            });
        }
        let header = MliqHeader::read(&mut Cursor::new(&chunk.payload[..MliqHeader::SIZE]))?;
        let verts = header.verts_x as usize * header.verts_y as usize;
        let tiles = header.tiles_x as usize * header.tiles_y as usize;
        let needed = verts
            .checked_mul(Self::VERTEX_SIZE)
            .and_then(|v| v.checked_add(MliqHeader::SIZE + tiles));
        if needed.is_none_or(|n| n > chunk.size()) {
            return Err(WmoError::InvalidLiquid {
                verts,
                tiles,
                len: chunk.size(),
            });
        }

        let mut cursor = chunk.cursor();
        cursor.skip(MliqHeader::SIZE)?;
        let heights = (0..verts)
            .map(|_| {
                cursor.skip(4)?;
                cursor.read_f32()
            })
            .collect::<wow_data::Result<Vec<_>>>()?;
        let flags = cursor.read_bytes(tiles)?.to_vec();

        Ok(Self {
            header,
            heights,
            flags,
        })
    }

    pub fn base(&self) -> Vec3 {
        Vec3::from_array(self.header.base)
    }

    pub fn tile_flag(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.header.tiles_x as usize {
            return None;
        }
        self.flags.get(y * self.header.tiles_x as usize + x).copied()
    }

    pub fn height(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.header.verts_x as usize {
            return None;
        }
        self.heights.get(y * self.header.verts_x as usize + x).copied()
    }

    /// Kind of the first tile that carries liquid, in storage order.
    pub fn first_tile_liquid(&self) -> Option<TileLiquid> {
        self.flags
            .iter()
            .find(|&&f| f & Self::NO_LIQUID != Self::NO_LIQUID)
            .map(|&f| TileLiquid::from_bits(f))
    }

    /// Serialized chunk payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.header.write(&mut out)?;
        let mut out = out.into_inner();
        for h in &self.heights {
            out.extend_from_slice(&[0; 4]);
            out.extend_from_slice(&h.to_le_bytes());
        }
        out.extend_from_slice(&self.flags);
        Ok(out)
    }
}

/// Flat liquid of `tiles_x` by `tiles_y` tiles, every tile flagged `flag`.
pub fn flat_liquid(tiles_x: u32, tiles_y: u32, base: Vec3, flag: u8) -> WmoLiquid {
    let verts = ((tiles_x + 1) * (tiles_y + 1)) as usize;
    WmoLiquid {
        header: MliqHeader {
            verts_x: tiles_x + 1,
            verts_y: tiles_y + 1,
            tiles_x,
            tiles_y,
            base: base.to_array(),
            material_id: 0,
        },
        heights: vec![base.z; verts],
        flags: vec![flag; (tiles_x * tiles_y) as usize],
    }
}
