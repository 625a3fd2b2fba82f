//! MCNK terrain cells and their MCVT/MCLQ sub-chunks.
//!
//! Sub-chunk offsets stored in the MCNK header are relative to the start of
//! the MCNK chunk, header included.

use binrw::{BinRead, BinWrite};
use bitflags::bitflags;
use glam::Vec3;

use wow_data::{ByteCursor, ChunkId, ChunkReader};

use crate::error::Result;

pub const MCNK: ChunkId = ChunkId::from_mnemonic(b"MCNK");
pub const MCVT: ChunkId = ChunkId::from_mnemonic(b"MCVT");
pub const MCLQ: ChunkId = ChunkId::from_mnemonic(b"MCLQ");

/// Vertices per side of the outer (V9) grid of one cell.
pub const OUTER_GRID: usize = 9;
/// Vertices per side of the inner (V8) grid, also the liquid tile count per side.
pub const INNER_GRID: usize = 8;
/// Floats in MCVT: 9x9 outer interleaved with 8x8 inner.
pub const MCVT_COUNT: usize = OUTER_GRID * OUTER_GRID + INNER_GRID * INNER_GRID;

bitflags! {
    /// MCNK header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct McnkFlags: u32 {
        const HAS_MCSH = 0x01;
        const IMPASS = 0x02;
        const RIVER = 0x04;
        const OCEAN = 0x08;
        const MAGMA = 0x10;
        const SLIME = 0x20;
        const HAS_MCCV = 0x40;
        const HIGH_RES_HOLES = 0x1_0000;
    }
}

impl McnkFlags {
    pub const LIQUID: Self = Self::RIVER
        .union(Self::OCEAN)
        .union(Self::MAGMA)
        .union(Self::SLIME);

    /// Liquid layers present in MCLQ, in storage order.
    ///
    /// Magma and slime share a single layer.
    pub fn liquid_categories(self) -> Vec<LiquidCategory> {
        let mut out = Vec::with_capacity(3);
        if self.contains(Self::RIVER) {
            out.push(LiquidCategory::River);
        }
        if self.contains(Self::OCEAN) {
            out.push(LiquidCategory::Ocean);
        }
        if self.intersects(Self::MAGMA.union(Self::SLIME)) {
            out.push(LiquidCategory::Magma);
        }
        out
    }
}

/// Liquid kind of one MCLQ layer, derived from the MCNK flags.
///
/// Ordered as the layers are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LiquidCategory {
    #[default]
    River,
    Ocean,
    /// Magma or slime.
    Magma,
}

/// MCNK header, 128 bytes.
///
/// ```text
/// Offset | Size | Field
/// -------|------|------------------------------------
/// 0x00   |  4   | flags
/// 0x04   |  8   | index x, index y
/// 0x0C   |  8   | layer count, doodad ref count
/// 0x14   | 16   | MCVT, MCNR, MCLY, MCRF offsets
/// 0x24   | 16   | MCAL offset/size, MCSH offset/size
/// 0x34   |  4   | area id
/// 0x38   |  4   | map object ref count
/// 0x3C   |  4   | holes (low 16 bits), unused
/// 0x40   | 24   | low quality texture map, no-effect doodad bits
/// 0x58   |  8   | MCSE offset, sound emitter count
/// 0x60   |  8   | MCLQ offset, liquid size
/// 0x68   | 12   | position
/// 0x74   | 12   | MCCV offset, MCLV offset, unused
/// ```
#[derive(Debug, Clone, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct McnkHeader {
    #[br(map = McnkFlags::from_bits_retain)]
    #[bw(map = |f: &McnkFlags| f.bits())]
    pub flags: McnkFlags,
    pub index_x: u32,
    pub index_y: u32,
    pub n_layers: u32,
    pub n_doodad_refs: u32,
    pub ofs_mcvt: u32,
    pub ofs_mcnr: u32,
    pub ofs_mcly: u32,
    pub ofs_mcrf: u32,
    pub ofs_mcal: u32,
    pub size_alpha: u32,
    pub ofs_mcsh: u32,
    pub size_shadow: u32,
    pub area_id: u32,
    pub n_map_obj_refs: u32,
    pub holes: u16,
    pub holes_unused: u16,
    pub low_quality_texture: [u8; 16],
    pub no_effect_doodad: [u8; 8],
    pub ofs_mcse: u32,
    pub n_snd_emitters: u32,
    pub ofs_mclq: u32,
    /// Size of the MCLQ chunk, its 8-byte header included.
    pub size_liquid: u32,
    pub position: [f32; 3],
    pub ofs_mccv: u32,
    pub ofs_mclv: u32,
    pub unused: u32,
}

impl McnkHeader {
    pub const SIZE: usize = 128;

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn has_liquid(&self) -> bool {
        self.flags.intersects(McnkFlags::LIQUID)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct LiquidVertex {
    /// Decoded but not carried into any output.
    pub light: u32,
    pub height: f32,
}

/// One 804-byte MCLQ layer.
#[derive(Debug, Clone, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct LiquidLayer {
    #[brw(ignore)]
    pub category: LiquidCategory,
    pub min_height: f32,
    pub max_height: f32,
    /// `[y][x]`
    pub vertices: [[LiquidVertex; OUTER_GRID]; OUTER_GRID],
    /// `[y][x]`
    #[brw(pad_after = 84)]
    pub tiles: [[u8; INNER_GRID]; INNER_GRID],
}

impl LiquidLayer {
    pub const SIZE: usize = 804;

    const NO_LIQUID: u8 = 0x0F;
    const DARK: u8 = 0x80;

    /// Whether tile (x, y) carries liquid. A low nibble of 0xF hides it.
    pub fn is_shown(&self, x: usize, y: usize) -> bool {
        self.tiles[y][x] & Self::NO_LIQUID != Self::NO_LIQUID
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.tiles[y][x] & Self::DARK != 0
    }

    pub fn height(&self, x: usize, y: usize) -> f32 {
        self.vertices[y][x].height
    }
}

/// A fully decoded terrain cell.
#[derive(Debug, Clone)]
pub struct McnkCell {
    pub header: McnkHeader,
    /// The 145 MCVT floats, relative to `header.position[2]`.
    pub heights: Vec<f32>,
    pub liquids: Vec<LiquidLayer>,
}

impl McnkCell {
    pub fn area_id(&self) -> u32 {
        self.header.area_id
    }

    pub fn holes(&self) -> u16 {
        self.header.holes
    }

    pub fn position(&self) -> Vec3 {
        self.header.position()
    }

    /// Relative height of outer vertex (x, y), 0..=8 each.
    pub fn outer_height(&self, x: usize, y: usize) -> f32 {
        self.heights[y * (OUTER_GRID + INNER_GRID) + x]
    }

    /// Relative height of inner vertex (x, y), 0..8 each.
    pub fn inner_height(&self, x: usize, y: usize) -> f32 {
        self.heights[y * (OUTER_GRID + INNER_GRID) + OUTER_GRID + x]
    }

    /// Decode the cell whose MCNK chunk starts at `offset` in `data`.
    pub(crate) fn decode(data: &[u8], offset: usize) -> Result<Self> {
        let reader = ChunkReader::new(data);
        let mcnk = reader.expect_chunk(offset, MCNK)?;
        let header = McnkHeader::read(&mut mcnk.cursor().take_io(McnkHeader::SIZE)?)?;

        let mcvt = reader.expect_chunk(offset + header.ofs_mcvt as usize, MCVT)?;
        let heights = mcvt.cursor().read_f32_vec(MCVT_COUNT)?;

        let liquids = if header.has_liquid() && header.size_liquid > 8 {
            decode_liquids(&reader, offset + header.ofs_mclq as usize, header.flags)?
        } else {
            Vec::new()
        };

        Ok(Self {
            header,
            heights,
            liquids,
        })
    }
}

/// MCLQ's own size field is unreliable in v18 files, so layers are read
/// straight after the 8-byte header, bounded only by the file.
fn decode_liquids(reader: &ChunkReader<'_>, offset: usize, flags: McnkFlags) -> Result<Vec<LiquidLayer>> {
    let found = reader.peek_id(offset)?;
    if found != MCLQ {
        return Err(wow_data::DataError::InvalidMagic {
            expected: MCLQ,
            found,
            offset,
        }
        .into());
    }

    let mut cursor = ByteCursor::new(reader.data());
    cursor.seek(offset + 8)?;
    flags
        .liquid_categories()
        .into_iter()
        .map(|category| -> Result<LiquidLayer> {
            let mut layer = LiquidLayer::read(&mut cursor.take_io(LiquidLayer::SIZE)?)?;
            layer.category = category;
            Ok(layer)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    #[test]
    fn header_is_128_bytes() {
        let mut out = Cursor::new(Vec::new());
        McnkHeader::default().write(&mut out).unwrap();
        assert_eq!(out.into_inner().len(), McnkHeader::SIZE);
    }

    #[test]
    fn liquid_layer_is_804_bytes() {
        let mut out = Cursor::new(Vec::new());
        LiquidLayer::default().write(&mut out).unwrap();
        assert_eq!(out.into_inner().len(), LiquidLayer::SIZE);
    }

    #[test_case(McnkFlags::empty(), &[] ; "no liquid")]
    #[test_case(McnkFlags::RIVER, &[LiquidCategory::River] ; "river")]
    #[test_case(McnkFlags::MAGMA | McnkFlags::SLIME, &[LiquidCategory::Magma] ; "magma and slime share a layer")]
    #[test_case(McnkFlags::RIVER | McnkFlags::OCEAN | McnkFlags::SLIME,
        &[LiquidCategory::River, LiquidCategory::Ocean, LiquidCategory::Magma] ; "all categories")]
    fn layer_order(flags: McnkFlags, expected: &[LiquidCategory]) {
        assert_eq!(flags.liquid_categories(), expected);
    }

    #[test]
    fn tile_flags() {
        let mut layer = LiquidLayer::default();
        layer.tiles[2][5] = 0x0F;
        layer.tiles[3][1] = 0x84;
        assert!(!layer.is_shown(5, 2));
        assert!(layer.is_shown(1, 3));
        assert!(layer.is_dark(1, 3));
        assert!(!layer.is_dark(0, 0));
    }
}
