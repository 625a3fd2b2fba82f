//! WMO group files: collision geometry and the optional liquid.
//!
//! A group file is `MVER` followed by one `MOGP` chunk whose payload is a
//! 68-byte info block and then the group's own sub-chunks:
//!
//! ```text
//! MOPY MOVI MOVT MONR MOTV MOBA          always present
//! MOLR (0x200)  MODR (0x800)             gated by MOGP flags,
//! MOBN MOBR (0x1)  MOCV (0x4)            in this order
//! MLIQ (0x1000)  MORI (0x20000)
//! ```

use binrw::{BinRead, BinWrite};
use bitflags::bitflags;
use glam::Vec3;
use log::trace;

use wow_data::{AaBox, Chunk, ChunkId, ChunkReader};

use crate::error::{Result, WmoError};
use crate::liquid::{MLIQ, WmoLiquid};
use crate::SUPPORTED_VERSIONS;

pub const MOGP: ChunkId = ChunkId::from_mnemonic(b"MOGP");
pub const MOPY: ChunkId = ChunkId::from_mnemonic(b"MOPY");
pub const MOVI: ChunkId = ChunkId::from_mnemonic(b"MOVI");
pub const MOVT: ChunkId = ChunkId::from_mnemonic(b"MOVT");
pub const MONR: ChunkId = ChunkId::from_mnemonic(b"MONR");
pub const MOTV: ChunkId = ChunkId::from_mnemonic(b"MOTV");
pub const MOBA: ChunkId = ChunkId::from_mnemonic(b"MOBA");
pub const MOLR: ChunkId = ChunkId::from_mnemonic(b"MOLR");
pub const MODR: ChunkId = ChunkId::from_mnemonic(b"MODR");
pub const MOBN: ChunkId = ChunkId::from_mnemonic(b"MOBN");
pub const MOBR: ChunkId = ChunkId::from_mnemonic(b"MOBR");
pub const MOCV: ChunkId = ChunkId::from_mnemonic(b"MOCV");
pub const MORI: ChunkId = ChunkId::from_mnemonic(b"MORI");

bitflags! {
    /// MOGP / MOGI group flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GroupFlags: u32 {
        const HAS_BSP_TREE = 0x1;
        const HAS_LIGHT_MAP = 0x2;
        const HAS_VERTEX_COLORS = 0x4;
        const EXTERIOR = 0x8;
        const EXTERIOR_LIT = 0x40;
        const UNREACHABLE = 0x80;
        const HAS_LIGHTS = 0x200;
        const HAS_DOODADS = 0x800;
        const HAS_WATER = 0x1000;
        const INTERIOR = 0x2000;
        const ALWAYS_DRAW = 0x1_0000;
        const HAS_TRIANGLE_STRIPS = 0x2_0000;
        const SHOW_SKYBOX = 0x4_0000;
    }
}

/// Optional chunks in file order with the flag that gates each of them.
const GATED: [(GroupFlags, &[ChunkId]); 6] = [
    (GroupFlags::HAS_LIGHTS, &[MOLR]),
    (GroupFlags::HAS_DOODADS, &[MODR]),
    (GroupFlags::HAS_BSP_TREE, &[MOBN, MOBR]),
    (GroupFlags::HAS_VERTEX_COLORS, &[MOCV]),
    (GroupFlags::HAS_WATER, &[MLIQ]),
    (GroupFlags::HAS_TRIANGLE_STRIPS, &[MORI]),
];

bitflags! {
    /// MOPY per-triangle material flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct PolyFlags: u8 {
        const UNK_0x01 = 0x01;
        const NO_CAM_COLLIDE = 0x02;
        const DETAIL = 0x04;
        const COLLISION = 0x08;
        const HINT = 0x10;
        const RENDER = 0x20;
        const CULL_OBJECTS = 0x40;
        const COLLIDE_HIT = 0x80;
    }
}

impl PolyFlags {
    /// Solid for movement: a collision face that is not detail geometry.
    pub fn is_collidable(self) -> bool {
        self.contains(Self::COLLISION) && !self.contains(Self::DETAIL)
    }
}

/// One MOPY entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolyMaterial {
    pub flags: PolyFlags,
    pub material_id: u8,
}

/// The 68-byte block at the start of MOGP.
#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct MogpHeader {
    pub group_name: u32,
    pub descriptive_group_name: u32,
    #[br(map = GroupFlags::from_bits_retain)]
    #[bw(map = |f: &GroupFlags| f.bits())]
    pub flags: GroupFlags,
    pub bounding_box: [f32; 6],
    pub portal_start: u16,
    pub portal_count: u16,
    pub trans_batch_count: u16,
    pub int_batch_count: u16,
    pub ext_batch_count: u16,
    pub padding: u16,
    pub fog_ids: [u8; 4],
    /// Legacy liquid kind, or a LiquidType id when the root says so.
    pub group_liquid: u32,
    /// WMOAreaTable group id.
    pub wmo_area_table_id: u32,
    pub flags2: u32,
    pub unused: u32,
}

impl MogpHeader {
    pub const SIZE: usize = 68;

    pub fn bounds(&self) -> AaBox {
        AaBox::from(self.bounding_box)
    }
}

/// A parsed group file.
#[derive(Debug, Clone, Default)]
pub struct WmoGroup {
    pub info: MogpHeader,
    pub polys: Vec<PolyMaterial>,
    /// Three indices per MOPY entry.
    pub indices: Vec<u16>,
    pub vertices: Vec<Vec3>,
    pub liquid: Option<WmoLiquid>,
}

impl WmoGroup {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let reader = ChunkReader::new(data);
        let mver = reader.read_version("WMO group", SUPPORTED_VERSIONS)?;
        let mogp = reader.expect_chunk(mver.next_offset(), MOGP)?;
        if mogp.size() < MogpHeader::SIZE {
            return Err(WmoError::ChunkTooSmall {
                chunk: MOGP,
                len: mogp.size(),
                min: MogpHeader::SIZE,
            });
        }
        let info = MogpHeader::read(&mut mogp.cursor().take_io(MogpHeader::SIZE)?)?;

        // Sub-chunk offsets stay absolute so errors point into the file.
        let mut seq = Sequence {
            reader,
            offset: mogp.payload_offset() + MogpHeader::SIZE,
        };

        let polys = seq
            .next(MOPY)?
            .elements(2)?
            .map(|p| PolyMaterial {
                flags: PolyFlags::from_bits_retain(p[0]),
                material_id: p[1],
            })
            .collect::<Vec<_>>();
        let movi = seq.next(MOVI)?;
        let indices = movi.cursor().read_u16_vec(movi.elements(2)?.len())?;
        let movt = seq.next(MOVT)?;
        let vertices = movt.cursor().read_vec3_vec(movt.elements(12)?.len())?;
        for id in [MONR, MOTV, MOBA] {
            seq.next(id)?;
        }

        let mut liquid = None;
        for (flag, ids) in GATED {
            if !info.flags.contains(flag) {
                continue;
            }
            for &id in ids {
                let chunk = seq.next(id)?;
                if id == MLIQ {
                    liquid = Some(WmoLiquid::parse(&chunk)?);
                }
            }
        }

        if indices.len() != polys.len() * 3 {
            return Err(WmoError::TriangleCountMismatch {
                indices: indices.len(),
                triangles: polys.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| usize::from(i) >= vertices.len()) {
            return Err(WmoError::IndexOutOfRange {
                index,
                vertices: vertices.len(),
            });
        }

        trace!(
            "WMO group: {} vertices, {} triangles, liquid {}",
            vertices.len(),
            polys.len(),
            liquid.is_some()
        );

        Ok(Self {
            info,
            polys,
            indices,
            vertices,
            liquid,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.polys.len()
    }

    pub fn triangle(&self, i: usize) -> [u16; 3] {
        [self.indices[i * 3], self.indices[i * 3 + 1], self.indices[i * 3 + 2]]
    }

    /// Triangles paired with their MOPY flags.
    pub fn triangles(&self) -> impl Iterator<Item = ([u16; 3], PolyFlags)> + '_ {
        self.indices
            .chunks_exact(3)
            .zip(&self.polys)
            .map(|(t, p)| ([t[0], t[1], t[2]], p.flags))
    }
}

/// Walks a fixed chunk sequence.
struct Sequence<'a> {
    reader: ChunkReader<'a>,
    offset: usize,
}

impl<'a> Sequence<'a> {
    fn next(&mut self, id: ChunkId) -> Result<Chunk<'a>> {
        let chunk = self.reader.expect_chunk(self.offset, id)?;
        self.offset = chunk.next_offset();
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    #[test]
    fn mogp_header_is_68_bytes() {
        let mut out = Cursor::new(Vec::new());
        MogpHeader::default().write(&mut out).unwrap();
        assert_eq!(out.into_inner().len(), MogpHeader::SIZE);
    }

    #[test_case(PolyFlags::COLLISION, true ; "collision")]
    #[test_case(PolyFlags::COLLISION | PolyFlags::RENDER, true ; "rendered collision")]
    #[test_case(PolyFlags::COLLISION | PolyFlags::DETAIL, false ; "detail")]
    #[test_case(PolyFlags::RENDER, false ; "render only")]
    #[test_case(PolyFlags::empty(), false ; "none")]
    fn collidable(flags: PolyFlags, expected: bool) {
        assert_eq!(flags.is_collidable(), expected);
    }
}
