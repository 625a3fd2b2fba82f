//! On-disk layout of a `.map` file.
//!
//! ```text
//! MapHeader      44 bytes  "MAPS", version tag, build, 4 x {offset, size}
//! AREA header     8 bytes  [+ 16x16 u16 area flags]
//! MHGT header    16 bytes  [+ 129x129 V9 then 128x128 V8, as u8/u16/f32]
//! MLIQ header    16 bytes  [+ 16x16 u16 entries, 16x16 u8 flags] [+ w*h f32]
//! holes         512 bytes  16x16 u16
//! ```
//!
//! Grids are written row major; everything is little-endian.

use binrw::{BinRead, BinWrite};
use bitflags::bitflags;

/// Cells per side of a tile.
pub const CELLS: usize = 16;
/// Height/liquid points per side of the V8 grid.
pub const GRID: usize = 128;
/// Points per side of the V9 grid.
pub const GRID_V9: usize = GRID + 1;
/// Points per side of one cell in the V8 grid.
pub const CELL_GRID: usize = 8;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AreaFlags: u16 {
        /// Every cell shares `grid_area`; no grid follows.
        const NO_AREA = 0x0001;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeightFlags: u32 {
        const NO_HEIGHT = 0x0001;
        const AS_INT16 = 0x0002;
        const AS_INT8 = 0x0004;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LiquidHeaderFlags: u16 {
        /// One type for the whole tile, no entry/flag grids.
        const NO_TYPE = 0x0001;
        /// Flat surface at `level`, no height grid.
        const NO_HEIGHT = 0x0002;
    }
}

bitflags! {
    /// Per-cell liquid flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct LiquidTypeFlags: u8 {
        const MAGMA = 0x01;
        const OCEAN = 0x02;
        const SLIME = 0x04;
        const WATER = 0x08;
        const DARK_WATER = 0x10;
        const WMO_WATER = 0x20;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"MAPS")]
pub struct MapHeader {
    pub version_magic: [u8; 4],
    pub build: u32,
    pub area_offset: u32,
    pub area_size: u32,
    pub height_offset: u32,
    pub height_size: u32,
    /// 0 when the tile has no liquid.
    pub liquid_offset: u32,
    pub liquid_size: u32,
    pub holes_offset: u32,
    pub holes_size: u32,
}

impl MapHeader {
    pub const SIZE: u32 = 44;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"AREA")]
pub struct AreaHeader {
    #[br(map = AreaFlags::from_bits_retain)]
    #[bw(map = |f: &AreaFlags| f.bits())]
    pub flags: AreaFlags,
    pub grid_area: u16,
}

impl AreaHeader {
    pub const SIZE: u32 = 8;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little, magic = b"MHGT")]
pub struct HeightHeader {
    #[br(map = HeightFlags::from_bits_retain)]
    #[bw(map = |f: &HeightFlags| f.bits())]
    pub flags: HeightFlags,
    pub grid_height: f32,
    pub grid_max_height: f32,
}

impl HeightHeader {
    pub const SIZE: u32 = 16;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little, magic = b"MLIQ")]
pub struct LiquidHeader {
    #[br(map = LiquidHeaderFlags::from_bits_retain)]
    #[bw(map = |f: &LiquidHeaderFlags| f.bits())]
    pub flags: LiquidHeaderFlags,
    /// Flag byte shared by every cell when `NO_TYPE` is set.
    pub liquid_type: u16,
    pub offset_x: u8,
    pub offset_y: u8,
    pub width: u8,
    pub height: u8,
    pub level: f32,
}

impl LiquidHeader {
    pub const SIZE: u32 = 16;
}

pub const HOLES_SIZE: u32 = (CELLS * CELLS * 2) as u32;
