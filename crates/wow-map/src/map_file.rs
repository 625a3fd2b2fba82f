//! The packed tile and its reader/writer.

use std::fs;
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt, VecArgs};
use log::trace;

use crate::error::{MapError, Result};
use crate::format::{
    AreaFlags, AreaHeader, CELLS, GRID, GRID_V9, HOLES_SIZE, HeightFlags, HeightHeader,
    LiquidHeader, LiquidHeaderFlags, MapHeader,
};

pub type CellGrid<T> = [[T; CELLS]; CELLS];

/// Identity of a tile; only used for the file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileId {
    pub map_id: u32,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(map_id: u32, x: u32, y: u32) -> Self {
        Self { map_id, x, y }
    }

    /// `%03u%02u%02u.map`
    pub fn file_name(&self) -> String {
        format!("{:03}{:02}{:02}.map", self.map_id, self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaSection {
    pub header: AreaHeader,
    /// Absent when every cell shares `header.grid_area`.
    pub grid: Option<CellGrid<u16>>,
}

impl AreaSection {
    pub fn size(&self) -> u32 {
        AreaHeader::SIZE + self.grid.map_or(0, |_| (CELLS * CELLS * 2) as u32)
    }

    /// Area flag of cell `[i][j]`.
    pub fn area(&self, i: usize, j: usize) -> u16 {
        self.grid.map_or(self.header.grid_area, |g| g[i][j])
    }
}

/// V9 then V8 samples in one of the three encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum HeightData {
    Flat,
    U8 { v9: Vec<u8>, v8: Vec<u8> },
    U16 { v9: Vec<u16>, v8: Vec<u16> },
    F32 { v9: Vec<f32>, v8: Vec<f32> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeightSection {
    pub header: HeightHeader,
    pub data: HeightData,
}

impl HeightSection {
    pub fn size(&self) -> u32 {
        let points = (GRID_V9 * GRID_V9 + GRID * GRID) as u32;
        HeightHeader::SIZE
            + match self.data {
                HeightData::Flat => 0,
                HeightData::U8 { .. } => points,
                HeightData::U16 { .. } => points * 2,
                HeightData::F32 { .. } => points * 4,
            }
    }

    /// Quantization step of the integer encodings, 0 otherwise.
    pub fn step(&self) -> f32 {
        let range = self.header.grid_max_height - self.header.grid_height;
        match self.data {
            HeightData::U8 { .. } => 255.0 / range,
            HeightData::U16 { .. } => 65535.0 / range,
            _ => 0.0,
        }
    }

    fn sample(&self, v9: bool, at: usize) -> f32 {
        let min = self.header.grid_height;
        match &self.data {
            HeightData::Flat => min,
            HeightData::U8 { v9: a, v8: b } => {
                min + f32::from(if v9 { a[at] } else { b[at] }) / self.step()
            }
            HeightData::U16 { v9: a, v8: b } => {
                min + f32::from(if v9 { a[at] } else { b[at] }) / self.step()
            }
            HeightData::F32 { v9: a, v8: b } => {
                if v9 {
                    a[at]
                } else {
                    b[at]
                }
            }
        }
    }

    /// Decoded V9 height at (row, col).
    pub fn v9(&self, row: usize, col: usize) -> f32 {
        self.sample(true, row * GRID_V9 + col)
    }

    /// Decoded V8 height at (row, col).
    pub fn v8(&self, row: usize, col: usize) -> f32 {
        self.sample(false, row * GRID + col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidSection {
    pub header: LiquidHeader,
    /// Per-cell entries and flags, absent with `NO_TYPE`.
    pub types: Option<(CellGrid<u16>, CellGrid<u8>)>,
    /// `width * height` samples of the covered rectangle, absent with `NO_HEIGHT`.
    pub heights: Option<Vec<f32>>,
}

impl LiquidSection {
    pub fn size(&self) -> u32 {
        LiquidHeader::SIZE
            + self.types.map_or(0, |_| (CELLS * CELLS * 3) as u32)
            + self.heights.as_ref().map_or(0, |h| h.len() as u32 * 4)
    }

    /// Whether (row, col) of the V9 grid lies in the stored rectangle.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        let h = &self.header;
        (h.offset_y as usize..h.offset_y as usize + h.height as usize).contains(&row)
            && (h.offset_x as usize..h.offset_x as usize + h.width as usize).contains(&col)
    }

    /// Liquid height at (row, col), `None` outside the rectangle.
    pub fn height(&self, row: usize, col: usize) -> Option<f32> {
        if !self.covers(row, col) {
            return None;
        }
        let h = &self.header;
        Some(match &self.heights {
            Some(heights) => {
                heights[(row - h.offset_y as usize) * h.width as usize + col - h.offset_x as usize]
            }
            None => h.level,
        })
    }
}

/// A packed terrain tile.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFile {
    pub tile: TileId,
    pub header: MapHeader,
    pub area: AreaSection,
    pub height: HeightSection,
    pub liquid: Option<LiquidSection>,
    pub holes: CellGrid<u16>,
}

impl MapFile {
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        self.header.write(writer)?;

        self.area.header.write(writer)?;
        if let Some(grid) = &self.area.grid {
            writer.write_le(grid)?;
        }

        self.height.header.write(writer)?;
        match &self.height.data {
            HeightData::Flat => {}
            HeightData::U8 { v9, v8 } => {
                writer.write_all(v9)?;
                writer.write_all(v8)?;
            }
            HeightData::U16 { v9, v8 } => {
                writer.write_le(v9)?;
                writer.write_le(v8)?;
            }
            HeightData::F32 { v9, v8 } => {
                writer.write_le(v9)?;
                writer.write_le(v8)?;
            }
        }

        if let Some(liquid) = &self.liquid {
            liquid.header.write(writer)?;
            if let Some((entries, flags)) = &liquid.types {
                writer.write_le(entries)?;
                writer.write_le(flags)?;
            }
            if let Some(heights) = &liquid.heights {
                writer.write_le(heights)?;
            }
        }

        writer.write_le(&self.holes)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::with_capacity(self.header.holes_offset as usize + 512));
        self.write_to(&mut out)?;
        Ok(out.into_inner())
    }

    /// Write `<dir>/<tile file name>`; `dir` must exist.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.tile.file_name());
        fs::write(&path, self.to_bytes()?)?;
        trace!("Wrote {}", path.display());
        Ok(path)
    }

    /// Decode a written tile, checking every section against the header.
    pub fn from_bytes(tile: TileId, data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let header = MapHeader::read(&mut cursor)?;

        cursor.seek(SeekFrom::Start(header.area_offset.into()))?;
        let area_header = AreaHeader::read(&mut cursor)?;
        let grid = if area_header.flags.contains(AreaFlags::NO_AREA) {
            None
        } else {
            Some(cursor.read_le::<CellGrid<u16>>()?)
        };
        let area = AreaSection {
            header: area_header,
            grid,
        };
        expect_section("area", header.area_size, area.size())?;

        cursor.seek(SeekFrom::Start(header.height_offset.into()))?;
        let height_header = HeightHeader::read(&mut cursor)?;
        let flags = height_header.flags;
        let samples = if flags.contains(HeightFlags::NO_HEIGHT) {
            HeightData::Flat
        } else if flags.contains(HeightFlags::AS_INT16) {
            HeightData::U16 {
                v9: read_vec(&mut cursor, GRID_V9 * GRID_V9)?,
                v8: read_vec(&mut cursor, GRID * GRID)?,
            }
        } else if flags.contains(HeightFlags::AS_INT8) {
            HeightData::U8 {
                v9: read_vec(&mut cursor, GRID_V9 * GRID_V9)?,
                v8: read_vec(&mut cursor, GRID * GRID)?,
            }
        } else {
            HeightData::F32 {
                v9: read_vec(&mut cursor, GRID_V9 * GRID_V9)?,
                v8: read_vec(&mut cursor, GRID * GRID)?,
            }
        };
        let height = HeightSection {
            header: height_header,
            data: samples,
        };
        expect_section("height", header.height_size, height.size())?;

        let liquid = if header.liquid_offset == 0 {
            None
        } else {
            cursor.seek(SeekFrom::Start(header.liquid_offset.into()))?;
            let liquid_header = LiquidHeader::read(&mut cursor)?;
            let types = if liquid_header.flags.contains(LiquidHeaderFlags::NO_TYPE) {
                None
            } else {
                Some((
                    cursor.read_le::<CellGrid<u16>>()?,
                    cursor.read_le::<CellGrid<u8>>()?,
                ))
            };
            let heights = if liquid_header.flags.contains(LiquidHeaderFlags::NO_HEIGHT) {
                None
            } else {
                let count = liquid_header.width as usize * liquid_header.height as usize;
                Some(read_vec(&mut cursor, count)?)
            };
            let liquid = LiquidSection {
                header: liquid_header,
                types,
                heights,
            };
            expect_section("liquid", header.liquid_size, liquid.size())?;
            Some(liquid)
        };

        let holes_at = if header.liquid_offset == 0 {
            u64::from(header.height_offset) + u64::from(header.height_size)
        } else {
            u64::from(header.liquid_offset) + u64::from(header.liquid_size)
        };
        if u64::from(header.holes_offset) != holes_at || header.holes_size != HOLES_SIZE {
            return Err(MapError::section(
                "holes",
                format!(
                    "{} bytes at {:#x}, expected {HOLES_SIZE} at {holes_at:#x}",
                    header.holes_size, header.holes_offset
                ),
            ));
        }
        cursor.seek(SeekFrom::Start(header.holes_offset.into()))?;
        let holes = cursor.read_le::<CellGrid<u16>>()?;

        Ok(Self {
            tile,
            header,
            area,
            height,
            liquid,
            holes,
        })
    }
}

fn read_vec<T>(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()> + 'static,
{
    Ok(cursor.read_le_args(VecArgs { count, inner: () })?)
}

fn expect_section(section: &'static str, declared: u32, actual: u32) -> Result<()> {
    if declared == actual {
        Ok(())
    } else {
        Err(MapError::section(
            section,
            format!("header declares {declared} bytes, contents take {actual}"),
        ))
    }
}
