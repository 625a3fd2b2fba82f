//! Model and world-object placements.
//!
//! - **MMDX** / **MWMO**: null-terminated file name blocks
//! - **MMID** / **MWID**: `u32` offsets into those blocks
//! - **MDDF**: M2 placements whose `name_id` indexes MMID
//! - **MODF**: WMO placements whose `name_id` indexes MWID

use binrw::{BinRead, BinWrite};
use glam::Vec3;
use log::trace;

use wow_data::{AaBox, Chunk, ChunkId, ChunkReader, cstr_at};

use crate::error::{AdtError, Result};
use crate::header::Mhdr;

pub const MMDX: ChunkId = ChunkId::from_mnemonic(b"MMDX");
pub const MMID: ChunkId = ChunkId::from_mnemonic(b"MMID");
pub const MWMO: ChunkId = ChunkId::from_mnemonic(b"MWMO");
pub const MWID: ChunkId = ChunkId::from_mnemonic(b"MWID");
pub const MDDF: ChunkId = ChunkId::from_mnemonic(b"MDDF");
pub const MODF: ChunkId = ChunkId::from_mnemonic(b"MODF");

/// M2 placement, 36 bytes.
///
/// ```text
/// Offset | Size | Field
/// -------|------|---------------------------
/// 0x00   |  4   | name id (MMID index)
/// 0x04   |  4   | unique id
/// 0x08   | 12   | position
/// 0x14   | 12   | rotation, degrees
/// 0x20   |  2   | scale, 1024 = 1.0
/// 0x22   |  2   | flags
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct DoodadPlacement {
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: u16,
    pub flags: u16,
}

impl DoodadPlacement {
    pub const SIZE: usize = 36;

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn rotation(&self) -> Vec3 {
        Vec3::from_array(self.rotation)
    }
}

/// WMO placement, 64 bytes. Shared with the WDT global object.
///
/// ```text
/// Offset | Size | Field
/// -------|------|---------------------------
/// 0x00   |  4   | name id (MWID index)
/// 0x04   |  4   | unique id
/// 0x08   | 12   | position
/// 0x14   | 12   | rotation, degrees
/// 0x20   | 12   | extents, first corner
/// 0x2C   | 12   | extents, second corner
/// 0x38   |  2   | flags
/// 0x3A   |  2   | doodad set
/// 0x3C   |  2   | name set
/// 0x3E   |  2   | padding
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct WmoPlacement {
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub extents_min: [f32; 3],
    pub extents_max: [f32; 3],
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub padding: u16,
}

impl WmoPlacement {
    pub const SIZE: usize = 64;

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn rotation(&self) -> Vec3 {
        Vec3::from_array(self.rotation)
    }

    /// The extents as a box. Corners are normalized since files do not
    /// agree on which one comes first.
    pub fn bounds(&self) -> AaBox {
        let a = Vec3::from_array(self.extents_min);
        let b = Vec3::from_array(self.extents_max);
        AaBox::new(a.min(b), a.max(b))
    }

    pub fn parse(chunk: &Chunk<'_>) -> Result<Vec<Self>> {
        parse_records(chunk, Self::SIZE)
    }
}

/// Every placement of one tile with its names resolved.
#[derive(Debug, Clone, Default)]
pub struct Placements {
    /// M2 file names in MMID order.
    pub models: Vec<String>,
    /// WMO file names in MWID order.
    pub wmos: Vec<String>,
    pub doodads: Vec<DoodadPlacement>,
    pub wmo_placements: Vec<WmoPlacement>,
}

impl Placements {
    pub fn model_name(&self, p: &DoodadPlacement) -> Option<&str> {
        self.models.get(p.name_id as usize).map(String::as_str)
    }

    pub fn wmo_name(&self, p: &WmoPlacement) -> Option<&str> {
        self.wmos.get(p.name_id as usize).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.doodads.is_empty() && self.wmo_placements.is_empty()
    }

    pub(crate) fn parse(reader: &ChunkReader<'_>, mhdr: &Mhdr) -> Result<Self> {
        let models = match (optional(reader, mhdr.ofs_mmdx, MMDX)?, optional(reader, mhdr.ofs_mmid, MMID)?) {
            (Some(block), Some(ids)) => resolve_names("MMID", &block, &ids)?,
            _ => Vec::new(),
        };
        let wmos = match (optional(reader, mhdr.ofs_mwmo, MWMO)?, optional(reader, mhdr.ofs_mwid, MWID)?) {
            (Some(block), Some(ids)) => resolve_names("MWID", &block, &ids)?,
            _ => Vec::new(),
        };
        let doodads: Vec<DoodadPlacement> = match optional(reader, mhdr.ofs_mddf, MDDF)? {
            Some(chunk) => parse_records(&chunk, DoodadPlacement::SIZE)?,
            None => Vec::new(),
        };
        let wmo_placements = match optional(reader, mhdr.ofs_modf, MODF)? {
            Some(chunk) => WmoPlacement::parse(&chunk)?,
            None => Vec::new(),
        };

        for (table, len, max) in [
            ("MDDF", models.len(), doodads.iter().map(|p| p.name_id).max()),
            ("MODF", wmos.len(), wmo_placements.iter().map(|p| p.name_id).max()),
        ] {
            if let Some(index) = max.filter(|&i| i as usize >= len) {
                return Err(AdtError::InvalidNameReference { table, index, len });
            }
        }

        trace!(
            "{} doodad and {} WMO placements over {} + {} names",
            doodads.len(),
            wmo_placements.len(),
            models.len(),
            wmos.len()
        );

        Ok(Self {
            models,
            wmos,
            doodads,
            wmo_placements,
        })
    }
}

/// An MHDR offset of zero means the chunk is absent.
fn optional<'a>(reader: &ChunkReader<'a>, ofs: u32, id: ChunkId) -> Result<Option<Chunk<'a>>> {
    if ofs == 0 {
        return Ok(None);
    }
    Ok(Some(reader.expect_chunk(Mhdr::absolute(ofs), id)?))
}

fn resolve_names(table: &'static str, block: &Chunk<'_>, ids: &Chunk<'_>) -> Result<Vec<String>> {
    ids.elements(4)?
        .map(|raw| {
            let offset = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            cstr_at(block.payload, offset as usize).ok_or(AdtError::InvalidNameReference {
                table,
                index: offset,
                len: block.payload.len(),
            })
        })
        .collect()
}

fn parse_records<T>(chunk: &Chunk<'_>, size: usize) -> Result<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()> + binrw::meta::ReadEndian,
{
    chunk
        .elements(size)?
        .map(|record| -> Result<T> { Ok(T::read(&mut std::io::Cursor::new(record))?) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_are_normalized() {
        let p = WmoPlacement {
            extents_min: [10.0, -5.0, 3.0],
            extents_max: [-10.0, 5.0, 1.0],
            ..Default::default()
        };
        let b = p.bounds();
        assert_eq!(b.low, Vec3::new(-10.0, -5.0, 1.0));
        assert_eq!(b.high, Vec3::new(10.0, 5.0, 3.0));
    }
}
